//! Periodic, read-only reporting of relay counters.
//!
//! The observer never mutates relay state and nothing depends on it for
//! correctness; it exists so operators can see the relay is alive.

use std::fmt;
use std::time::Duration;

use tracing::info;

use crate::relay::{self, SharedRelay};

/// How often the observer logs when run from the binary.
pub const STATS_INTERVAL: Duration = Duration::from_secs(30);

/// Point-in-time view of the relay counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub uptime: Duration,
    pub messages_forwarded: u64,
    pub publishers: usize,
    pub subscribers: usize,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uptime: {}s | messages forwarded: {} | publishers: {} | subscribers: {}",
            self.uptime.as_secs(),
            self.messages_forwarded,
            self.publishers,
            self.subscribers
        )
    }
}

/// Logs a [`StatsSnapshot`] every `period`, forever.
///
/// The first report is emitted one full period after start.
pub async fn run_stats_observer(relay: SharedRelay, period: Duration) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        ticker.tick().await;
        let snapshot = relay::lock(&relay).stats();
        info!(
            uptime_secs = snapshot.uptime.as_secs(),
            messages_forwarded = snapshot.messages_forwarded,
            publishers = snapshot.publishers,
            subscribers = snapshot.subscribers,
            "stats: {snapshot}"
        );
    }
}
