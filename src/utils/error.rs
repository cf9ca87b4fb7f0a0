//! Errors raised by the real-time transport layer.
//!
//! Command dispatch has its own error type in [`crate::dispatch`]; this module
//! only covers opening and driving feed connections.

/// Error returned when a feed connection cannot be established or used.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The WebSocket handshake or TCP connect failed.
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    /// The connection's outbound side has already shut down.
    #[error("feed connection is closed")]
    Closed,

    /// An in-memory connector ran out of prepared connections.
    #[error("no connection available")]
    Exhausted,
}
