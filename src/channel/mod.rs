//! The `channel` module runs topic channels: one feed connection per
//! (topic, delta kind) subscription, driving a [`Synchronizer`](crate::sync::Synchronizer).
//!
//! A channel waits for the transport to be ready, connects, sends the
//! subscribe intent, then routes the topic's snapshot and delta events into
//! its synchronizer until it is closed.

pub mod reconnect;
pub mod topic_channel;

pub use reconnect::ReconnectPolicy;
pub use topic_channel::{ChannelState, Subscription, TopicChannel};
