//! # feedsync
//!
//! `feedsync` keeps local, keyed collections in step with a backend's
//! real-time topic feeds, and sends commands back to that backend over HTTP.
//!
//! ## Core Modules
//!
//! - `sync`: the keyed collection synchronizer (snapshot replace, delta merge).
//! - `channel`: topic channels, one live subscription per (topic, delta kind).
//! - `transport`: wire frames, the WebSocket and in-memory connectors, and the
//!   transport-ready gate.
//! - `dispatch`: the command dispatcher and its session credentials.
//! - `client`: the `FeedClient` / `FeedView` facade integrators use.
//! - `health`: periodic backend ping.
//! - `config`: settings loading.
//! - `utils`: transport errors and logging setup.

pub mod channel;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod health;
pub mod sync;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;
