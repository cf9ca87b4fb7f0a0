use std::future::Future;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::transport::message::FeedFrame;
use crate::utils::error::TransportError;

/// Opens feed connections for topic channels.
///
/// Every call yields a fresh connection; a channel calls it once on open and
/// again only when its reconnect policy allows.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self) -> impl Future<Output = Result<FeedConnection, TransportError>> + Send;
}

/// One live connection to the feed backend.
///
/// Outbound frames go through an unbounded channel drained by the transport's
/// send loop; inbound frames arrive on the receiving half. `recv` returning
/// `None` means the connection dropped. Dropping the connection closes it.
#[derive(Debug)]
pub struct FeedConnection {
    id: String,
    outbound: UnboundedSender<FeedFrame>,
    inbound: UnboundedReceiver<FeedFrame>,
    reader: Option<JoinHandle<()>>,
}

impl FeedConnection {
    pub fn new(outbound: UnboundedSender<FeedFrame>, inbound: UnboundedReceiver<FeedFrame>) -> Self {
        Self {
            id: format!("conn-{}", Uuid::new_v4()),
            outbound,
            inbound,
            reader: None,
        }
    }

    /// Ties the transport's receive loop to this connection so it stops with it.
    pub(crate) fn with_reader(mut self, reader: JoinHandle<()>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn send(&self, frame: FeedFrame) -> Result<(), TransportError> {
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::Closed)
    }

    pub async fn recv(&mut self) -> Option<FeedFrame> {
        self.inbound.recv().await
    }
}

impl Drop for FeedConnection {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}
