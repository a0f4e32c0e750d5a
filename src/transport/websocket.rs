//! WebSocket listener
//!
//! Binds the listening socket and hands every accepted TCP stream to its own
//! task running [`session::handle_connection`]. A failed accept is logged
//! and the loop keeps going; a failed bind is fatal.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tracing::warn;

use crate::relay::SharedRelay;
use crate::transport::session;
use crate::utils::error::RelayError;

pub async fn bind(addr: &str) -> Result<TcpListener, RelayError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Accepts connections forever.
pub async fn serve(listener: TcpListener, relay: SharedRelay) {
    loop {
        handle_accept_result(listener.accept().await, &relay);
    }
}

fn handle_accept_result(result: std::io::Result<(TcpStream, SocketAddr)>, relay: &SharedRelay) {
    match result {
        Ok((stream, remote)) => {
            let relay = relay.clone();
            tokio::spawn(session::handle_connection(stream, remote, relay));
        }
        Err(err) => warn!(error = %err, "failed to accept connection"),
    }
}
