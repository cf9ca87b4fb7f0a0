use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::channel::{ChannelState, Subscription};
use crate::dispatch::{CommandDispatcher, DispatchError};
use crate::sync::{Collection, DeltaPolicy, KeyFn, MergePolicy, Synchronizer};

/// What to open: the subscription, how records are keyed and merged, and
/// optionally the action that [`LiveFeed::post`] sends to.
#[derive(Debug, Clone)]
pub struct FeedSpec {
    pub subscription: Subscription,
    pub key: KeyFn,
    pub merge: MergePolicy,
    pub delta: DeltaPolicy,
    pub action: Option<String>,
}

impl FeedSpec {
    pub fn new(topic: impl Into<String>, delta_kind: impl AsRef<str>, key: KeyFn) -> Self {
        Self {
            subscription: Subscription::new(topic, delta_kind),
            key,
            merge: MergePolicy::default(),
            delta: DeltaPolicy::default(),
            action: None,
        }
    }

    pub fn with_merge_policy(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_delta_policy(mut self, delta: DeltaPolicy) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

/// A view's handle on one synchronized topic.
///
/// Reads the collection, applies optimistic edits, and posts the bound
/// action. Cheap to clone.
#[derive(Debug, Clone)]
pub struct LiveFeed {
    topic: String,
    synchronizer: Arc<Synchronizer>,
    state: watch::Receiver<ChannelState>,
    dispatcher: CommandDispatcher,
    action: Option<String>,
}

impl LiveFeed {
    pub(crate) fn new(
        topic: String,
        synchronizer: Arc<Synchronizer>,
        state: watch::Receiver<ChannelState>,
        dispatcher: CommandDispatcher,
        action: Option<String>,
    ) -> Self {
        Self {
            topic,
            synchronizer,
            state,
            dispatcher,
            action,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn items(&self) -> Arc<Collection> {
        self.synchronizer.collection()
    }

    /// Notified after every change to the collection.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Collection>> {
        self.synchronizer.subscribe()
    }

    /// Optimistic local edit; see [`Synchronizer::set_collection`].
    pub fn set_items(&self, update: impl FnOnce(&mut Collection)) {
        self.synchronizer.set_collection(update);
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn synchronizer(&self) -> &Arc<Synchronizer> {
        &self.synchronizer
    }

    /// Sends `payload` to this feed's bound action on the same topic.
    pub async fn post<P>(&self, payload: &P) -> Result<Value, DispatchError>
    where
        P: Serialize + ?Sized,
    {
        let Some(action) = self.action.as_deref() else {
            return Err(DispatchError::InvalidEndpoint {
                path: self.topic.clone(),
                reason: "no action bound to this feed".to_string(),
            });
        };
        self.dispatcher.send(&self.topic, action, payload).await
    }
}
