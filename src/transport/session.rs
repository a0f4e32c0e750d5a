//! Per-connection life cycle
//!
//! Every accepted connection moves through
//! `Accepted -> Registered -> (ReadLoop | IdleWait) -> Closed`:
//! - the request path captured during the WebSocket handshake picks the role
//! - the connection is registered with the relay under that role
//! - subscribers get a one-time `relay_ready` handshake, then idle until the
//!   peer goes away; inbound frames from them are drained and dropped
//! - publishers have each inbound data frame broadcast, in receipt order,
//!   before the next frame is read
//!
//! Outbound frames go through a bounded channel drained by a writer task.
//! When the writer hits a send error it exits and drops the receiver, so the
//! next broadcast to that connection fails and prunes it. A subscriber that
//! stops reading fills its queue instead; the broadcast prunes and evicts it,
//! which ends its idle wait and aborts the stuck writer.
//!
//! Deregistration lives in `Drop for Session`, so it runs exactly once on
//! every exit path.

use std::net::SocketAddr;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::connection::{Connection, ConnectionState, OUTBOUND_CAPACITY, Role};
use crate::relay::{self, SharedRelay};
use crate::transport::message::ServerMessage;
use crate::utils::error::Disconnect;

/// A registered connection. Dropping it deregisters the connection.
struct Session {
    conn: Connection,
    relay: SharedRelay,
    state: ConnectionState,
}

impl Session {
    fn open(conn: Connection, relay: SharedRelay) -> Self {
        {
            let mut guard = relay::lock(&relay);
            guard.register(conn.clone());
            info!(
                conn = %conn.id,
                remote = %conn.remote,
                publishers = guard.publisher_count(),
                subscribers = guard.subscriber_count(),
                "{} connected",
                conn.role
            );
        }

        Self {
            conn,
            relay,
            state: ConnectionState::Open,
        }
    }

    fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state = ConnectionState::Closing;

        let mut guard = relay::lock(&self.relay);
        let removed = guard.deregister(&self.conn.id, self.conn.role);
        info!(
            conn = %self.conn.id,
            remote = %self.conn.remote,
            already_pruned = !removed,
            publishers = guard.publisher_count(),
            subscribers = guard.subscriber_count(),
            "{} disconnected",
            self.conn.role
        );
        drop(guard);

        self.state = ConnectionState::Closed;
    }

    /// Queues the readiness handshake. A failure here is logged and ignored;
    /// the subscriber stays registered.
    fn send_handshake(&self) {
        let text = match serde_json::to_string(&ServerMessage::relay_ready()) {
            Ok(json) => json,
            Err(e) => {
                warn!(conn = %self.conn.id, error = %e, "failed to serialize handshake");
                return;
            }
        };

        if self.conn.send(WsMessage::text(text)).is_err() {
            warn!(conn = %self.conn.id, "failed to send handshake");
        }
    }

    fn forward(&self, msg: &WsMessage) {
        let report = relay::lock(&self.relay).broadcast(msg);
        debug!(
            conn = %self.conn.id,
            delivered = report.delivered,
            pruned = report.pruned.len(),
            "forwarded message"
        );
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

/// Drives one accepted TCP stream from WebSocket handshake to cleanup.
/// Never fails: every error is contained and logged here.
pub async fn handle_connection(stream: TcpStream, remote: SocketAddr, relay: SharedRelay) {
    let mut path = String::new();
    let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        path = req.uri().path().to_string();
        Ok(resp)
    };

    let ws_stream = match accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(remote = %remote, error = %e, "WebSocket handshake error");
            return;
        }
    };

    let role = Role::from_path(&path);
    info!(remote = %remote, path = %path, role = %role, "new connection");

    let (ws_sender, ws_receiver) = ws_stream.split();
    let (tx, rx) = mpsc::channel::<WsMessage>(OUTBOUND_CAPACITY);
    let conn = Connection::new(role, remote.to_string(), tx);
    let mut writer = spawn_writer(conn.id.clone(), ws_sender, rx);

    let session = Session::open(conn, relay);

    let result = match role {
        Role::Subscriber => {
            session.send_handshake();
            idle_wait(&session, ws_receiver, &mut writer).await
        }
        Role::Publisher => read_loop(&session, ws_receiver, &mut writer).await,
    };

    if let Err(e) = result {
        match Disconnect::classify(&e) {
            Disconnect::Closed => debug!(conn = %session.conn.id, error = %e, "connection dropped"),
            Disconnect::Unexpected => {
                warn!(conn = %session.conn.id, error = %e, "connection closed with error")
            }
        }
    }

    drop(session);
}

/// Forwards queued frames to the socket until the channel closes or a send
/// fails.
fn spawn_writer<S>(conn_id: String, mut ws_sender: S, mut rx: Receiver<WsMessage>) -> JoinHandle<()>
where
    S: Sink<WsMessage, Error = tungstenite::Error> + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = ws_sender.send(msg).await {
                if Disconnect::classify(&e).is_expected() {
                    debug!(conn = %conn_id, error = %e, "send failed, peer gone");
                } else {
                    warn!(conn = %conn_id, error = %e, "failed to send message");
                }
                return;
            }
        }

        let _ = ws_sender.close().await;
        debug!(conn = %conn_id, "send loop closed");
    })
}

/// Subscriber wait state: nothing inbound is processed, the task just waits
/// for the peer to close, for the writer to give up, or for the relay to
/// evict it.
async fn idle_wait<St>(
    session: &Session,
    mut ws_receiver: St,
    writer: &mut JoinHandle<()>,
) -> Result<(), tungstenite::Error>
where
    St: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin,
{
    loop {
        tokio::select! {
            frame = ws_receiver.next() => match frame {
                None | Some(Ok(WsMessage::Close(_))) => return Ok(()),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
            },
            _ = &mut *writer => {
                debug!(conn = %session.conn.id, "writer finished, closing subscriber");
                return Ok(());
            }
            _ = session.conn.evicted() => {
                debug!(conn = %session.conn.id, "evicted by relay, closing subscriber");
                writer.abort();
                return Ok(());
            }
        }
    }
}

/// Publisher read state: each text or binary frame is broadcast before the
/// next one is read.
async fn read_loop<St>(
    session: &Session,
    mut ws_receiver: St,
    writer: &mut JoinHandle<()>,
) -> Result<(), tungstenite::Error>
where
    St: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin,
{
    loop {
        tokio::select! {
            frame = ws_receiver.next() => match frame {
                None | Some(Ok(WsMessage::Close(_))) => return Ok(()),
                Some(Ok(msg @ (WsMessage::Text(_) | WsMessage::Binary(_)))) => session.forward(&msg),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
            },
            _ = &mut *writer => {
                debug!(conn = %session.conn.id, "writer finished, closing publisher");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{sink, stream};
    use std::pin::Pin;
    use std::time::Duration;

    type TestSink = Pin<Box<dyn Sink<WsMessage, Error = tungstenite::Error> + Send>>;

    /// A sink whose every send fails, like a socket the peer has reset.
    fn broken_sink() -> TestSink {
        Box::pin(sink::unfold((), |(), _msg: WsMessage| async {
            Err::<(), _>(tungstenite::Error::ConnectionClosed)
        }))
    }

    fn silent_peer() -> stream::Pending<Result<WsMessage, tungstenite::Error>> {
        stream::pending()
    }

    fn subscriber(capacity: usize) -> (Connection, Receiver<WsMessage>) {
        let (tx, rx) = mpsc::channel::<WsMessage>(capacity);
        (Connection::new(Role::Subscriber, "127.0.0.1:9", tx), rx)
    }

    #[tokio::test]
    async fn failed_writer_ends_idle_wait_and_deregisters_once() {
        let shared = relay::shared();
        let (conn, rx) = subscriber(OUTBOUND_CAPACITY);
        let mut writer = spawn_writer(conn.id.clone(), broken_sink(), rx);
        let mut session = Session::open(conn.clone(), shared.clone());

        // The handshake is queued, the writer fails to put it on the wire.
        session.send_handshake();
        let result = tokio::time::timeout(
            Duration::from_secs(1),
            idle_wait(&session, silent_peer(), &mut writer),
        )
        .await
        .expect("idle wait did not notice the writer exit");
        assert!(result.is_ok());
        assert!(writer.is_finished());

        session.close();
        assert_eq!(session.state, ConnectionState::Closed);
        assert_eq!(relay::lock(&shared).subscriber_count(), 0);

        // Put the same id back; a second deregistration would remove it.
        relay::lock(&shared).register(conn.clone());
        drop(session);
        assert!(relay::lock(&shared).is_registered(&conn.id));
    }

    #[tokio::test]
    async fn failed_writer_is_pruned_by_next_broadcast() {
        let shared = relay::shared();
        let (conn, rx) = subscriber(OUTBOUND_CAPACITY);
        let mut writer = spawn_writer(conn.id.clone(), broken_sink(), rx);
        let session = Session::open(conn.clone(), shared.clone());
        session.send_handshake();
        (&mut writer).await.expect("writer panicked");

        let report = relay::lock(&shared).broadcast(&WsMessage::text("x"));
        assert_eq!(report.pruned, vec![conn.id.clone()]);
        assert_eq!(relay::lock(&shared).messages_forwarded(), 0);

        drop(session);
        assert_eq!(relay::lock(&shared).subscriber_count(), 0);
    }

    #[tokio::test]
    async fn handshake_failure_keeps_subscriber_registered() {
        let shared = relay::shared();
        let (conn, rx) = subscriber(OUTBOUND_CAPACITY);
        drop(rx);

        let session = Session::open(conn.clone(), shared.clone());
        session.send_handshake();

        assert_eq!(session.state, ConnectionState::Open);
        assert!(relay::lock(&shared).is_registered(&conn.id));
        assert_eq!(relay::lock(&shared).subscriber_count(), 1);
    }

    #[tokio::test]
    async fn eviction_ends_idle_wait_and_aborts_writer() {
        let shared = relay::shared();
        // Room for the handshake only, and nothing ever drains it.
        let (conn, _rx) = subscriber(1);
        let mut writer = tokio::spawn(std::future::pending::<()>());
        let session = Session::open(conn.clone(), shared.clone());
        session.send_handshake();

        let report = relay::lock(&shared).broadcast(&WsMessage::text("x"));
        assert_eq!(report.pruned, vec![conn.id.clone()]);

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            idle_wait(&session, silent_peer(), &mut writer),
        )
        .await
        .expect("idle wait did not notice the eviction");
        assert!(result.is_ok());

        let err = (&mut writer).await.expect_err("writer should be aborted");
        assert!(err.is_cancelled());

        drop(session);
        assert_eq!(relay::lock(&shared).subscriber_count(), 0);
    }
}
