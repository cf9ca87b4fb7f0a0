//! The `transport` module carries named feed events between the client and
//! the backend.
//!
//! It defines the wire frame and event naming, the [`Connector`] seam used by
//! topic channels to open connections, a WebSocket connector, an in-memory
//! connector for tests and embedding, and the [`TransportReady`] gate awaited
//! before any channel connects.

pub mod connection;
pub mod memory;
pub mod message;
pub mod ready;
pub mod websocket;

pub use connection::{Connector, FeedConnection};
pub use memory::{MemoryConnector, MemoryPeer, memory_pair};
pub use message::{FeedEventKind, FeedEvents, FeedFrame};
pub use ready::TransportReady;
pub use websocket::WsConnector;
