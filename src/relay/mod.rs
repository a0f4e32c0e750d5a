//! The relay core: registries, counters and the broadcast engine.

pub mod counters;
pub mod engine;
pub mod registry;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use counters::RelayCounters;
pub use engine::{BroadcastReport, Relay};
pub use registry::Registry;

/// The relay as shared between connection tasks and the stats observer.
pub type SharedRelay = Arc<Mutex<Relay>>;

pub fn shared() -> SharedRelay {
    Arc::new(Mutex::new(Relay::new()))
}

/// Locks the shared relay. A panic in another task while holding the lock
/// cannot leave a half-applied mutation behind, so poisoning is ignored.
pub fn lock(relay: &SharedRelay) -> MutexGuard<'_, Relay> {
    relay.lock().unwrap_or_else(PoisonError::into_inner)
}
