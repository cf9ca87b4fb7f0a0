use std::sync::Arc;

use tokio::sync::watch;

/// Gate that topic channels await before opening their connection.
///
/// Integrators that need a bootstrap step before the feed is usable (loading
/// credentials, waiting for the backend to come up) create a pending gate and
/// resolve it once; channels opened earlier simply wait. Clones share state.
#[derive(Debug, Clone)]
pub struct TransportReady {
    tx: Arc<watch::Sender<bool>>,
}

impl TransportReady {
    /// A gate that is already open.
    pub fn ready() -> Self {
        let (tx, _) = watch::channel(true);
        Self { tx: Arc::new(tx) }
    }

    /// A gate that stays closed until [`mark_ready`](Self::mark_ready).
    pub fn pending() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Opens the gate. Calling it again has no effect.
    pub fn mark_ready(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the gate is open.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for TransportReady {
    fn default() -> Self {
        Self::ready()
    }
}
