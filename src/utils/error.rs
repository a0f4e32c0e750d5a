//! The `error` module defines the error types used within the `wsrelay` application.
//!
//! Startup failures (configuration, binding the listener) are fatal and are
//! represented by [`RelayError`]. Per-connection transport failures never
//! leave the connection that produced them; [`Disconnect`] only decides how
//! loudly they are logged.

use std::io;

use thiserror::Error;
use tungstenite::error::ProtocolError;

/// Errors that stop the relay from starting or serving.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration could not be loaded or deserialized.
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    /// The listening socket could not be bound.
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// How a connection ended, as far as logging is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// Graceful close or an abrupt drop by the peer. Expected.
    Closed,
    /// Anything else the transport reported.
    Unexpected,
}

impl Disconnect {
    pub fn classify(err: &tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Disconnect::Closed
            }
            tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
                Disconnect::Closed
            }
            tungstenite::Error::Io(e) => match e.kind() {
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof => Disconnect::Closed,
                _ => Disconnect::Unexpected,
            },
            _ => Disconnect::Unexpected,
        }
    }

    pub fn is_expected(self) -> bool {
        self == Disconnect::Closed
    }
}
