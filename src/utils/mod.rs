//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `wsrelay` application.
//!
//! It centralizes the error types and the logging setup so every other
//! module reports failures and emits log lines the same way.

pub mod error;
pub mod logging;

#[cfg(test)]
mod tests;
