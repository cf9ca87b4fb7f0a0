use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use url::Url;

use crate::channel::ChannelState;
use crate::client::{FeedClient, FeedSpec};
use crate::dispatch::{CommandDispatcher, RawTagUpdateMsg, SessionContext};
use crate::sync::KeyFn;
use crate::transport::WsConnector;

/// Serves one feed connection: waits for the datapoint subscribe intent,
/// sends the initial state, then forwards every queued delta.
async fn spawn_feed_server(mut deltas: mpsc::UnboundedReceiver<Value>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        let (mut sender, mut receiver) = ws.split();

        while let Some(Ok(msg)) = receiver.next().await {
            if !msg.is_text() {
                continue;
            }
            let frame: Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
            if frame["event"] == "datapoint_subscribe_live_feed" {
                break;
            }
        }

        let snapshot = json!({
            "event": "datapoint_initial_state",
            "data": [
                {"datapoint_identifier": "TANK", "value": 5, "quality": "good"},
                {"datapoint_identifier": "PUMP", "value": "CLOSED", "quality": "good"}
            ]
        });
        sender
            .send(WsMessage::text(snapshot.to_string()))
            .await
            .unwrap();

        while let Some(delta) = deltas.recv().await {
            let frame = json!({"event": "datapoint_tagupdatemsg", "data": [delta]});
            if sender.send(WsMessage::text(frame.to_string())).await.is_err() {
                break;
            }
        }
    });

    format!("ws://{addr}")
}

async fn raw_tag_update(
    State(deltas): State<mpsc::UnboundedSender<Value>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if body["datapoint_identifier"] != "TANK" && body["datapoint_identifier"] != "PUMP" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": "error", "reason": "unknown datapoint"})),
        );
    }
    let _ = deltas.send(body);
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn spawn_backend(deltas: mpsc::UnboundedSender<Value>) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Router::new()
        .route("/datapoint/rawtagupdatemsg", post(raw_tag_update))
        .with_state(deltas);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

#[tokio::test]
async fn command_outcome_arrives_as_delta() {
    let (delta_tx, delta_rx) = mpsc::unbounded_channel();
    let ws_url = spawn_feed_server(delta_rx).await;
    let base_url = spawn_backend(delta_tx).await;

    let session = SessionContext::with_token("operator-token");
    let client = FeedClient::new(
        WsConnector::new(ws_url),
        CommandDispatcher::new(base_url, session),
    );
    let mut view = client.view();
    let feed = view.open(
        FeedSpec::new(
            "datapoint",
            "TagUpdateMsg",
            KeyFn::field("datapoint_identifier"),
        )
        .with_action("rawtagupdatemsg"),
    );

    let mut changes = feed.subscribe();
    changes.wait_for(|items| items.len() == 2).await.unwrap();
    assert_eq!(feed.state(), ChannelState::Synchronized);
    assert_eq!(feed.items()["TANK"]["value"], 5);

    let response = feed
        .post(&RawTagUpdateMsg::new("TANK", json!(12)))
        .await
        .unwrap();
    assert_eq!(response["status"], "ok");

    changes
        .wait_for(|items| items["TANK"]["value"] == 12)
        .await
        .unwrap();
    let items = feed.items();
    assert_eq!(items.len(), 2);
    assert_eq!(items["PUMP"]["value"], "CLOSED");

    let err = feed
        .post(&RawTagUpdateMsg::new("NOPE", json!(1)))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "unknown datapoint");

    view.close().await;
    assert_eq!(feed.state(), ChannelState::Closed);
}
