use std::fmt;

/// Request path reserved for the publishing client.
pub const PUBLISHER_PATH: &str = "/browser";

/// The role a connection plays in the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Its inbound messages are fanned out to every subscriber.
    Publisher,
    /// Receives the handshake and every forwarded message; sends nothing.
    Subscriber,
}

impl Role {
    /// Routes a connection by its request path.
    ///
    /// Only an exact match on [`PUBLISHER_PATH`] yields `Publisher`. Every
    /// other path, including `/` and typos such as `/browser/`, is accepted
    /// as a `Subscriber`.
    pub fn from_path(path: &str) -> Self {
        if path == PUBLISHER_PATH {
            Role::Publisher
        } else {
            Role::Subscriber
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Publisher => f.write_str("publisher"),
            Role::Subscriber => f.write_str("subscriber"),
        }
    }
}
