use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::channel::{ReconnectPolicy, Subscription, TopicChannel};
use crate::client::live_feed::{FeedSpec, LiveFeed};
use crate::config::Settings;
use crate::dispatch::{CommandDispatcher, SessionContext};
use crate::health::ConnectivityMonitor;
use crate::sync::Synchronizer;
use crate::transport::{Connector, TransportReady, WsConnector};

const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(5);

/// Shared entry point for all views of one backend.
#[derive(Debug)]
pub struct FeedClient<C: Connector = WsConnector> {
    connector: Arc<C>,
    ready: TransportReady,
    dispatcher: CommandDispatcher,
    reconnect: ReconnectPolicy,
    ping_interval: Duration,
}

impl FeedClient<WsConnector> {
    /// Builds a WebSocket-backed client from loaded settings.
    pub fn from_settings(settings: &Settings, session: SessionContext) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(&settings.server.http_base_url)?;
        let dispatcher = CommandDispatcher::from_settings(base_url, &settings.dispatch, session);
        Ok(Self::new(WsConnector::new(settings.server.ws_url.clone()), dispatcher)
            .with_reconnect_policy(ReconnectPolicy::from_settings(&settings.feed))
            .with_ping_interval(Duration::from_millis(settings.feed.ping_interval_ms)))
    }
}

impl<C: Connector> FeedClient<C> {
    pub fn new(connector: C, dispatcher: CommandDispatcher) -> Self {
        Self {
            connector: Arc::new(connector),
            ready: TransportReady::ready(),
            dispatcher,
            reconnect: ReconnectPolicy::default(),
            ping_interval: DEFAULT_PING_INTERVAL,
        }
    }

    /// Channels opened by this client's views wait on `ready` before
    /// connecting.
    pub fn with_ready_gate(mut self, ready: TransportReady) -> Self {
        self.ready = ready;
        self
    }

    pub fn with_reconnect_policy(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_ping_interval(mut self, every: Duration) -> Self {
        self.ping_interval = every;
        self
    }

    pub fn ping_interval(&self) -> Duration {
        self.ping_interval
    }

    /// Starts pinging the backend every `ping_interval`. The monitor stops
    /// when dropped.
    pub fn connectivity(&self) -> ConnectivityMonitor {
        ConnectivityMonitor::start(self.dispatcher.clone(), self.ping_interval)
    }

    pub fn ready_gate(&self) -> &TransportReady {
        &self.ready
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub fn connector(&self) -> &Arc<C> {
        &self.connector
    }

    /// Starts a new consuming view with no open channels.
    pub fn view(&self) -> FeedView<C> {
        FeedView {
            id: format!("view-{}", Uuid::new_v4()),
            connector: self.connector.clone(),
            ready: self.ready.clone(),
            dispatcher: self.dispatcher.clone(),
            reconnect: self.reconnect,
            channels: HashMap::new(),
        }
    }
}

/// One consuming view instance.
///
/// Holds at most one channel per subscription; dropping the view closes all
/// of them and discards their collections.
#[derive(Debug)]
pub struct FeedView<C: Connector = WsConnector> {
    id: String,
    connector: Arc<C>,
    ready: TransportReady,
    dispatcher: CommandDispatcher,
    reconnect: ReconnectPolicy,
    channels: HashMap<Subscription, TopicChannel>,
}

impl<C: Connector> FeedView<C> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Opens the feed described by `spec`, or returns a handle on the
    /// channel this view already has for the same subscription. In the
    /// latter case the existing key function and policies stay in force.
    pub fn open(&mut self, spec: FeedSpec) -> LiveFeed {
        let FeedSpec {
            subscription,
            key,
            merge,
            delta,
            action,
        } = spec;
        let topic = subscription.topic.clone();

        let channel = match self.channels.entry(subscription) {
            Entry::Occupied(entry) => {
                debug!(view = %self.id, topic = %topic, "reusing open channel");
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                let synchronizer = Arc::new(
                    Synchronizer::new(key)
                        .with_merge_policy(merge)
                        .with_delta_policy(delta),
                );
                let channel = TopicChannel::open(
                    self.connector.clone(),
                    self.ready.clone(),
                    entry.key().clone(),
                    synchronizer,
                    self.reconnect,
                );
                debug!(view = %self.id, topic = %topic, "opened channel");
                entry.insert(channel)
            }
        };

        LiveFeed::new(
            topic,
            channel.synchronizer().clone(),
            channel.watch_state(),
            self.dispatcher.clone(),
            action,
        )
    }

    pub fn channel(&self, topic: &str, delta_kind: &str) -> Option<&TopicChannel> {
        self.channels.get(&Subscription::new(topic, delta_kind))
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Closes and forgets every channel of this view.
    pub async fn close(&mut self) {
        for (_, mut channel) in self.channels.drain() {
            channel.close().await;
        }
    }
}
