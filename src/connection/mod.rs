//! The `connection` module defines the representation of a relay connection.
//!
//! It provides the `Connection` struct, which encapsulates a single accepted
//! WebSocket client: its identity, the role it was routed to, and the
//! channel used to push frames to it.

pub mod role;

pub use role::{PUBLISHER_PATH, Role};

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

/// Identity of a connection, unique for the life of the process.
pub type ConnectionId = String;

/// Lifecycle state of a connection.
///
/// A connection is only ever present in a registry while it is `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closing,
    Closed,
}

/// Frames that may wait in a connection's outbound queue. A subscriber
/// whose queue is full when a broadcast reaches it is treated as dead.
pub const OUTBOUND_CAPACITY: usize = 256;

/// A connected WebSocket client as seen by the relay.
///
/// Cloning a `Connection` clones the sending half of its outbound channel;
/// the transport's writer task owns the receiving half and the socket.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Unique identifier (`conn-<uuid>`).
    pub id: ConnectionId,

    /// Decided once at routing time, never changes afterwards.
    pub role: Role,

    /// Remote peer address, only used for logging.
    pub remote: String,

    /// Bounded channel to send WebSocket frames to the client.
    pub sender: Sender<WsMessage>,

    evicted: Arc<Notify>,
}

impl Connection {
    /// Create a new connection with a fresh id.
    pub fn new(role: Role, remote: impl Into<String>, sender: Sender<WsMessage>) -> Self {
        Self {
            id: format!("conn-{}", Uuid::new_v4()),
            role,
            remote: remote.into(),
            sender,
            evicted: Arc::new(Notify::new()),
        }
    }

    /// Queue a frame for delivery without waiting. Fails when the queue is
    /// full or the writer side has gone away.
    pub fn send(&self, msg: WsMessage) -> Result<(), TrySendError<WsMessage>> {
        self.sender.try_send(msg)
    }

    /// Tells the task driving this connection that the relay dropped it.
    pub fn evict(&self) {
        self.evicted.notify_one();
    }

    /// Resolves once [`evict`](Self::evict) has been called on any clone.
    pub async fn evicted(&self) {
        self.evicted.notified().await;
    }
}

#[cfg(test)]
mod tests;
