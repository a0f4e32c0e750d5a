use super::error::{Disconnect, RelayError};
use super::logging;
use std::io;
use tungstenite::error::ProtocolError;

#[test]
fn logging_init_accepts_levels() {
    // Should not panic
    logging::init("info");
    logging::init("debug");
    logging::init("warn");
    logging::init("nonsense");
}

#[test]
fn graceful_close_is_expected() {
    assert_eq!(
        Disconnect::classify(&tungstenite::Error::ConnectionClosed),
        Disconnect::Closed
    );
    assert!(Disconnect::classify(&tungstenite::Error::AlreadyClosed).is_expected());
}

#[test]
fn reset_without_close_frame_is_expected() {
    let err = tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake);
    assert!(Disconnect::classify(&err).is_expected());

    let err = tungstenite::Error::Io(io::Error::from(io::ErrorKind::ConnectionReset));
    assert!(Disconnect::classify(&err).is_expected());
}

#[test]
fn other_transport_errors_are_unexpected() {
    let err = tungstenite::Error::Io(io::Error::from(io::ErrorKind::PermissionDenied));
    assert_eq!(Disconnect::classify(&err), Disconnect::Unexpected);

    let err = tungstenite::Error::Protocol(ProtocolError::NonZeroReservedBits);
    assert!(!Disconnect::classify(&err).is_expected());
}

#[test]
fn bind_error_names_the_address() {
    let err = RelayError::Bind {
        addr: "127.0.0.1:8765".to_string(),
        source: io::Error::from(io::ErrorKind::AddrInUse),
    };
    assert!(err.to_string().contains("127.0.0.1:8765"));
}
