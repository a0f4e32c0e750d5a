use serde::{Deserialize, Serialize};

/// Version advertised in the readiness handshake.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Text sent to subscribers in the readiness handshake.
pub const READY_MESSAGE: &str = "Hand tracking relay connected";

/// Messages originated by the relay itself. Everything a publisher sends is
/// forwarded as-is and never goes through this type.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "relay_ready")]
    RelayReady { message: String, version: String },
}

impl ServerMessage {
    pub fn relay_ready() -> Self {
        ServerMessage::RelayReady {
            message: READY_MESSAGE.to_string(),
            version: PROTOCOL_VERSION.to_string(),
        }
    }
}
