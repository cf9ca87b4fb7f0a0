//! The `utils` module provides shared building blocks used across `feedsync`:
//! the transport error type and the tracing subscriber setup.

pub mod error;
pub mod logging;

#[cfg(test)]
mod tests;
