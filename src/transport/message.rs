use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One named event on the feed connection.
///
/// Encoded as a JSON text frame `{"event": "...", "data": ...}`. `data` is
/// omitted when null, which is how the subscribe intent goes out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedFrame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl FeedFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// A frame with no payload.
    pub fn bare(event: impl Into<String>) -> Self {
        Self::new(event, Value::Null)
    }
}

/// Which side of the synchronizer an inbound event feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEventKind {
    Snapshot,
    Delta,
}

/// Event names for one (topic, delta kind) subscription.
///
/// - outbound `{topic}_subscribe_live_feed`
/// - inbound `{topic}_initial_state`
/// - inbound `{topic}_{delta_kind}`, with the delta kind lowercased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEvents {
    pub subscribe: String,
    pub initial_state: String,
    pub delta: String,
}

impl FeedEvents {
    pub fn new(topic: &str, delta_kind: &str) -> Self {
        Self {
            subscribe: format!("{topic}_subscribe_live_feed"),
            initial_state: format!("{topic}_initial_state"),
            delta: format!("{topic}_{}", delta_kind.to_lowercase()),
        }
    }

    pub fn subscribe_frame(&self) -> FeedFrame {
        FeedFrame::bare(self.subscribe.clone())
    }

    /// Classifies an inbound event name, `None` for events this subscription
    /// does not consume.
    pub fn classify(&self, event: &str) -> Option<FeedEventKind> {
        if event == self.initial_state {
            Some(FeedEventKind::Snapshot)
        } else if event == self.delta {
            Some(FeedEventKind::Delta)
        } else {
            None
        }
    }
}
