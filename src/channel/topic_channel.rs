use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::channel::reconnect::ReconnectPolicy;
use crate::sync::Synchronizer;
use crate::transport::{Connector, FeedConnection, FeedEventKind, FeedEvents, TransportReady};

/// A (topic, delta kind) pair. The delta kind is stored lowercased, which is
/// how it appears in the delta event name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub topic: String,
    pub delta_kind: String,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, delta_kind: impl AsRef<str>) -> Self {
        Self {
            topic: topic.into(),
            delta_kind: delta_kind.as_ref().to_lowercase(),
        }
    }

    pub fn events(&self) -> FeedEvents {
        FeedEvents::new(&self.topic, &self.delta_kind)
    }
}

/// Lifecycle of a topic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Opened, waiting on the transport-ready gate.
    WaitingForTransport,
    Connecting,
    /// Subscribe intent sent, no snapshot yet.
    AwaitingSnapshot,
    Synchronized,
    /// Connection lost. The collection keeps its last contents.
    Stale,
    /// Closed for good.
    Closed,
}

#[derive(Debug, PartialEq, Eq)]
enum StreamOutcome {
    Dropped,
    Shutdown,
}

/// One live subscription feeding a synchronizer.
///
/// Owns a background task holding the connection. Closing the channel, or
/// dropping it, ends the task and tears the connection down. Must be opened
/// from within a tokio runtime.
#[derive(Debug)]
pub struct TopicChannel {
    subscription: Subscription,
    synchronizer: Arc<Synchronizer>,
    state: watch::Receiver<ChannelState>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl TopicChannel {
    pub fn open<C: Connector>(
        connector: Arc<C>,
        ready: TransportReady,
        subscription: Subscription,
        synchronizer: Arc<Synchronizer>,
        policy: ReconnectPolicy,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ChannelState::WaitingForTransport);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run_channel(ChannelTask {
            connector,
            ready,
            topic: subscription.topic.clone(),
            events: subscription.events(),
            synchronizer: synchronizer.clone(),
            policy,
            state: state_tx,
            shutdown: shutdown_rx,
        }));

        Self {
            subscription,
            synchronizer,
            state: state_rx,
            shutdown_tx,
            task: Some(task),
        }
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn synchronizer(&self) -> &Arc<Synchronizer> {
        &self.synchronizer
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// A receiver notified on every state change.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Resolves with the first state matching `target`, or with the final
    /// state if the channel ends first.
    pub async fn wait_for_state(&self, target: impl Fn(ChannelState) -> bool) -> ChannelState {
        let mut rx = self.state.clone();
        let reached = rx.wait_for(|state| target(*state)).await.map(|state| *state);
        reached.unwrap_or_else(|_| *rx.borrow())
    }

    /// Closes the channel and waits for its connection to be released.
    /// Closing twice is harmless.
    pub async fn close(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TopicChannel {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct ChannelTask<C> {
    connector: Arc<C>,
    ready: TransportReady,
    topic: String,
    events: FeedEvents,
    synchronizer: Arc<Synchronizer>,
    policy: ReconnectPolicy,
    state: watch::Sender<ChannelState>,
    shutdown: watch::Receiver<bool>,
}

async fn run_channel<C: Connector>(task: ChannelTask<C>) {
    let ChannelTask {
        connector,
        ready,
        topic,
        events,
        synchronizer,
        policy,
        state,
        mut shutdown,
    } = task;

    if !ready.is_ready() {
        debug!(topic = %topic, "waiting for transport");
        tokio::select! {
            _ = ready.wait() => {}
            _ = shutdown.wait_for(|stop| *stop) => {
                state.send_replace(ChannelState::Closed);
                return;
            }
        }
    }

    let mut delay: Option<Duration> = None;
    loop {
        state.send_replace(ChannelState::Connecting);
        let connected = tokio::select! {
            result = connector.connect() => Some(result),
            _ = shutdown.wait_for(|stop| *stop) => None,
        };

        let outcome = match connected {
            None => StreamOutcome::Shutdown,
            Some(Ok(mut conn)) => {
                stream_events(
                    &mut conn,
                    &topic,
                    &events,
                    &synchronizer,
                    &state,
                    &mut shutdown,
                    &mut delay,
                )
                .await
            }
            Some(Err(e)) => {
                warn!(topic = %topic, error = %e, "failed to open feed connection");
                StreamOutcome::Dropped
            }
        };
        if outcome == StreamOutcome::Shutdown {
            break;
        }

        state.send_replace(ChannelState::Stale);
        match policy.next_delay(delay) {
            None => {
                warn!(topic = %topic, "feed connection lost, collection is stale");
                let _ = shutdown.wait_for(|stop| *stop).await;
                break;
            }
            Some(wait) => {
                warn!(topic = %topic, delay_ms = wait.as_millis() as u64, "feed connection lost, reconnecting");
                delay = Some(wait);
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = shutdown.wait_for(|stop| *stop) => break,
                }
            }
        }
    }

    state.send_replace(ChannelState::Closed);
    debug!(topic = %topic, "channel closed");
}

/// Subscribes on `conn` and applies its events until it drops or shutdown
/// is requested.
async fn stream_events(
    conn: &mut FeedConnection,
    topic: &str,
    events: &FeedEvents,
    synchronizer: &Synchronizer,
    state: &watch::Sender<ChannelState>,
    shutdown: &mut watch::Receiver<bool>,
    delay: &mut Option<Duration>,
) -> StreamOutcome {
    if let Err(e) = conn.send(events.subscribe_frame()) {
        warn!(topic, error = %e, "failed to send subscribe intent");
        return StreamOutcome::Dropped;
    }
    debug!(topic, connection = conn.id(), "subscribed to live feed");
    state.send_replace(ChannelState::AwaitingSnapshot);

    loop {
        let frame = tokio::select! {
            frame = conn.recv() => frame,
            _ = shutdown.wait_for(|stop| *stop) => return StreamOutcome::Shutdown,
        };
        let Some(frame) = frame else {
            return StreamOutcome::Dropped;
        };

        match events.classify(&frame.event) {
            Some(FeedEventKind::Snapshot) => {
                synchronizer.apply_snapshot(frame.data);
                debug!(topic, items = synchronizer.len(), "received initial state");
                state.send_replace(ChannelState::Synchronized);
                *delay = None;
            }
            Some(FeedEventKind::Delta) => synchronizer.apply_delta(frame.data),
            None => trace!(topic, event = %frame.event, "ignoring event"),
        }
    }
}
