//! The `client` module is the entry point for integrators.
//!
//! A [`FeedClient`] holds what every view shares: the connector, the
//! transport-ready gate, the command dispatcher and the reconnect policy.
//! Each consuming view creates a [`FeedView`], opens the feeds it renders
//! through it, and drops it when it goes away, which closes its channels.

pub mod feed_client;
pub mod live_feed;

pub use feed_client::{FeedClient, FeedView};
pub use live_feed::{FeedSpec, LiveFeed};
