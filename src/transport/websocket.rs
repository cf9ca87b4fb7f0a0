use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use tokio::spawn;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tracing::{debug, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::transport::connection::{Connector, FeedConnection};
use crate::transport::message::FeedFrame;
use crate::utils::error::TransportError;

/// Connects to a WebSocket feed endpoint such as `ws://127.0.0.1:8000/feed`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    fn connect(&self) -> impl Future<Output = Result<FeedConnection, TransportError>> + Send {
        let url = self.url.clone();
        async move { connect(&url).await }
    }
}

/// Opens a WebSocket and spawns its send and receive loops.
pub async fn connect(url: &str) -> Result<FeedConnection, TransportError> {
    let (ws_stream, _response) =
        connect_async(url)
            .await
            .map_err(|source| TransportError::Connect {
                url: url.to_string(),
                source,
            })?;

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<FeedFrame>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<FeedFrame>();

    let conn = FeedConnection::new(out_tx, in_rx);
    let conn_id = conn.id().to_string();
    debug!(connection = %conn_id, url, "feed connection established");

    // Forward frames from the channel to the socket. Ends when the
    // connection is dropped, closing the socket on the way out.
    let send_id = conn_id.clone();
    spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(e) => {
                    warn!(connection = %send_id, error = %e, "failed to encode frame");
                    continue;
                }
            };
            if let Err(e) = ws_sender.send(WsMessage::text(text)).await {
                warn!(connection = %send_id, error = %e, "failed to send frame");
                break;
            }
        }
        let _ = ws_sender.close().await;
        debug!(connection = %send_id, "send loop closed");
    });

    let reader = spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(connection = %conn_id, error = %e, "feed connection error");
                    break;
                }
            };
            if msg.is_close() {
                break;
            }
            if !msg.is_text() {
                continue;
            }
            let Ok(text) = msg.to_text() else {
                continue;
            };
            match serde_json::from_str::<FeedFrame>(text) {
                Ok(frame) => {
                    if in_tx.send(frame).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(connection = %conn_id, error = %err, frame = text, "invalid feed frame");
                }
            }
        }
        debug!(connection = %conn_id, "disconnected");
    });

    Ok(conn.with_reader(reader))
}
