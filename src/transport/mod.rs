//! The `transport` module is responsible for network communication with
//! clients over WebSockets.
//!
//! It binds the listener, accepts connections, and drives each connection
//! through its life cycle: routing by request path, registration with the
//! relay, the subscriber handshake, the publisher read loop, and cleanup.

pub mod message;
pub mod session;
pub mod websocket;

pub use message::ServerMessage;
pub use websocket::{bind, serve};
