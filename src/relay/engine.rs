//! Relay engine
//!
//! `Relay` owns all process-scoped relay state:
//! - the publisher and subscriber registries
//! - the forwarded-message counter and start time
//!
//! Concurrency and usage notes:
//! - The API is synchronous and designed to be held behind a lock
//!   (`Arc<Mutex<Relay>>`) by the transport layer. Sends only enqueue onto
//!   per-connection channels, so no method here ever awaits and the lock is
//!   never held across network I/O.
//! - `broadcast` iterates a snapshot of the subscriber registry and prunes
//!   dead subscribers only after the whole snapshot has been visited. A
//!   subscriber whose bounded queue is full counts as dead, so a client that
//!   stops reading cannot make the relay buffer without limit.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::connection::{Connection, ConnectionId, Role};
use crate::relay::counters::RelayCounters;
use crate::relay::registry::Registry;
use crate::stats::StatsSnapshot;

/// Outcome of a single fan-out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers the message was handed to.
    pub delivered: usize,
    /// Subscribers whose channel was gone; they are no longer registered.
    pub pruned: Vec<ConnectionId>,
}

#[derive(Debug)]
pub struct Relay {
    publishers: Registry,
    subscribers: Registry,
    counters: RelayCounters,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

impl Relay {
    pub fn new() -> Self {
        Self {
            publishers: Registry::new(Role::Publisher),
            subscribers: Registry::new(Role::Subscriber),
            counters: RelayCounters::new(),
        }
    }

    fn registry_mut(&mut self, role: Role) -> &mut Registry {
        match role {
            Role::Publisher => &mut self.publishers,
            Role::Subscriber => &mut self.subscribers,
        }
    }

    /// Adds the connection to the registry matching its role.
    pub fn register(&mut self, conn: Connection) -> bool {
        let role = conn.role;
        self.registry_mut(role).add(conn)
    }

    /// Removes the connection from the registry matching `role`. Returns
    /// `false` if it was already gone (for example pruned by a broadcast).
    pub fn deregister(&mut self, id: &ConnectionId, role: Role) -> bool {
        self.registry_mut(role).remove(id).is_some()
    }

    #[cfg(test)]
    pub(crate) fn is_registered(&self, id: &ConnectionId) -> bool {
        self.publishers.contains(id) || self.subscribers.contains(id)
    }

    /// Forwards `msg` unmodified to every currently registered subscriber.
    ///
    /// Each successful hand-off bumps the forwarded counter by one. A failed
    /// hand-off (queue full or writer gone) marks that subscriber dead; dead
    /// subscribers are removed and evicted once every member of the snapshot
    /// has been tried. Never fails.
    pub fn broadcast(&mut self, msg: &WsMessage) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        if self.subscribers.is_empty() {
            return report;
        }

        let mut dead = Vec::new();
        for conn in self.subscribers.snapshot() {
            match conn.send(msg.clone()) {
                Ok(()) => {
                    self.counters.record_forwarded();
                    report.delivered += 1;
                }
                Err(TrySendError::Full(_)) => {
                    warn!(conn = %conn.id, "outbound queue full, marking subscriber dead");
                    dead.push(conn);
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(conn = %conn.id, "send failed, marking subscriber dead");
                    dead.push(conn);
                }
            }
        }

        for conn in dead {
            if self.subscribers.remove(&conn.id).is_some() {
                info!(
                    conn = %conn.id,
                    subscribers = self.subscribers.len(),
                    "subscriber disconnected (dead)"
                );
            }
            conn.evict();
            report.pruned.push(conn.id);
        }

        report
    }

    pub fn publisher_count(&self) -> usize {
        self.publishers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn messages_forwarded(&self) -> u64 {
        self.counters.messages_forwarded()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.counters.started_at()
    }

    /// Point-in-time view of the counters for the stats observer.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime: self.counters.uptime(),
            messages_forwarded: self.counters.messages_forwarded(),
            publishers: self.publishers.len(),
            subscribers: self.subscribers.len(),
        }
    }
}
