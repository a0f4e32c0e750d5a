use chrono::{DateTime, Utc};

/// Process-wide relay counters.
///
/// `messages_forwarded` only ever grows and is only bumped by the broadcast
/// engine; `started_at` is fixed when the relay is created.
#[derive(Debug, Clone)]
pub struct RelayCounters {
    messages_forwarded: u64,
    started_at: DateTime<Utc>,
}

impl RelayCounters {
    pub fn new() -> Self {
        Self {
            messages_forwarded: 0,
            started_at: Utc::now(),
        }
    }

    pub(crate) fn record_forwarded(&mut self) {
        self.messages_forwarded += 1;
    }

    pub fn messages_forwarded(&self) -> u64 {
        self.messages_forwarded
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time since start, clamped at zero if the wall clock stepped back.
    pub fn uptime(&self) -> std::time::Duration {
        (Utc::now() - self.started_at).to_std().unwrap_or_default()
    }
}

impl Default for RelayCounters {
    fn default() -> Self {
        Self::new()
    }
}
