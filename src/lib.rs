//! # wsrelay
//!
//! `wsrelay` is a real-time WebSocket fan-out relay. A publisher connects on
//! `/browser` and every message it sends is forwarded, unmodified, to all
//! subscribers connected on any other path.
//!
//! ## Core Modules
//!
//! - `connection`: Represents an accepted client and the role it was routed to.
//! - `relay`: The registries, counters and the broadcast engine.
//! - `transport`: The WebSocket listener and the per-connection life cycle.
//! - `stats`: Periodic, read-only reporting of the relay counters.
//! - `config`: Loads the listen address from file and environment.
//! - `utils`: Error types and logging setup.

pub mod config;
pub mod connection;
pub mod relay;
pub mod stats;
pub mod transport;
pub mod utils;
