use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::dispatch::CommandDispatcher;

/// Latest result of pinging the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connectivity {
    pub is_connected: bool,
    /// Server clock as reported by the last successful ping.
    pub server_timestamp: Option<String>,
}

impl Default for Connectivity {
    /// Assumed connected until the first ping says otherwise.
    fn default() -> Self {
        Self {
            is_connected: true,
            server_timestamp: None,
        }
    }
}

/// Pings the backend on a fixed interval and publishes the outcome.
///
/// The first ping goes out immediately. Stops when dropped.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    state: watch::Receiver<Connectivity>,
    task: JoinHandle<()>,
}

impl ConnectivityMonitor {
    pub fn start(dispatcher: CommandDispatcher, every: Duration) -> Self {
        let (tx, rx) = watch::channel(Connectivity::default());

        let task = tokio::spawn(async move {
            // tokio rejects a zero period
            let mut ticker = tokio::time::interval(every.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let next = match dispatcher.ping().await {
                    Ok(status) => Connectivity {
                        is_connected: true,
                        server_timestamp: status.timestamp,
                    },
                    Err(e) => {
                        debug!(error = %e, "ping failed");
                        Connectivity {
                            is_connected: false,
                            server_timestamp: None,
                        }
                    }
                };
                tx.send_if_modified(|current| {
                    if *current == next {
                        false
                    } else {
                        *current = next;
                        true
                    }
                });
            }
        });

        Self { state: rx, task }
    }

    pub fn current(&self) -> Connectivity {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.state.clone()
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}
