use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::transport::connection::{Connector, FeedConnection};
use crate::transport::message::FeedFrame;
use crate::utils::error::TransportError;

/// The backend's end of an in-memory feed connection.
///
/// Dropping the peer drops the connection as seen by the client.
#[derive(Debug)]
pub struct MemoryPeer {
    to_client: UnboundedSender<FeedFrame>,
    from_client: UnboundedReceiver<FeedFrame>,
}

impl MemoryPeer {
    /// Pushes an event to the client. Returns `false` once the client side is gone.
    pub fn emit(&self, event: impl Into<String>, data: Value) -> bool {
        self.to_client.send(FeedFrame::new(event, data)).is_ok()
    }

    /// Next frame sent by the client, `None` once the client closed.
    pub async fn next_frame(&mut self) -> Option<FeedFrame> {
        self.from_client.recv().await
    }
}

/// Creates a connected client/peer pair with no network in between.
pub fn memory_pair() -> (FeedConnection, MemoryPeer) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    (
        FeedConnection::new(out_tx, in_rx),
        MemoryPeer {
            to_client: in_tx,
            from_client: out_rx,
        },
    )
}

/// Connector handing out prepared in-memory connections in order.
///
/// Once the queue is empty further attempts fail with
/// [`TransportError::Exhausted`].
#[derive(Debug, Default)]
pub struct MemoryConnector {
    pending: Mutex<VecDeque<FeedConnection>>,
    attempts: AtomicUsize,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a fresh connection and returns its backend end.
    pub fn accept(&self) -> MemoryPeer {
        let (conn, peer) = memory_pair();
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(conn);
        peer
    }

    /// Number of times `connect` has been called.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for MemoryConnector {
    fn connect(&self) -> impl Future<Output = Result<FeedConnection, TransportError>> + Send {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        async move { next.ok_or(TransportError::Exhausted) }
    }
}
