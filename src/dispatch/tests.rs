use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use futures::future::AbortHandle;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

use super::dispatcher::rejection_reason;
use super::{
    AckAlarmMsg, AnimationUpdateRequestMsg, AuthScheme, ClientAlertFeedbackMsg, Command, CommandDispatcher,
    DispatchError, DriverConnectCommand, EndpointConvention, RawTagUpdateMsg, SendCommandMsg, SessionContext,
    UNKNOWN_ERROR,
};

fn header(headers: &HeaderMap, name: &str) -> Value {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| json!(v))
        .unwrap_or(Value::Null)
}

async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "authorization": header(&headers, "authorization"),
        "x_user": header(&headers, "x-user"),
        "operator": header(&headers, "x-operator"),
        "body": body,
    }))
}

fn backend() -> Router {
    Router::new()
        .route("/alarm/ackalarmmsg", post(echo))
        .route("/command_send_sendcommandmsg", post(echo))
        .route(
            "/datapoint/rawtagupdatemsg",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"status": "error", "reason": "unknown datapoint"})),
                )
            }),
        )
        .route(
            "/command/sendcommandmsg",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<html>boom</html>") }),
        )
        .route(
            "/communication/driverconnectcommand",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"detail": [{"msg": "field required"}]})),
                )
            }),
        )
        .route("/gis/empty", post(|| async { StatusCode::OK }))
        .route("/gis/html", post(|| async { "plain text" }))
        .route(
            "/slow/wait",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                StatusCode::OK
            }),
        )
        .route(
            "/frontend/ping",
            get(|| async { Json(json!({"status": "ok", "timestamp": "16/10/2026 08:30:05"})) }),
        )
}

async fn spawn_backend() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, backend()).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

#[test]
fn test_endpoint_conventions() {
    let base = Url::parse("http://localhost:8000/api/").unwrap();
    let dispatcher = CommandDispatcher::new(base, SessionContext::new());
    assert_eq!(
        dispatcher.endpoint("alarm", "ackalarmmsg").unwrap().as_str(),
        "http://localhost:8000/api/alarm/ackalarmmsg"
    );

    let legacy = dispatcher.with_convention(EndpointConvention::Legacy);
    assert_eq!(
        legacy.endpoint("command", "sendcommandmsg").unwrap().as_str(),
        "http://localhost:8000/api/command_send_sendcommandmsg"
    );
}

#[test]
fn test_endpoint_rejects_empty_parts() {
    let dispatcher = CommandDispatcher::new(
        Url::parse("http://localhost:8000").unwrap(),
        SessionContext::new(),
    );
    assert!(matches!(
        dispatcher.endpoint("", "ackalarmmsg"),
        Err(DispatchError::InvalidEndpoint { .. })
    ));
    assert!(matches!(
        dispatcher.endpoint("alarm", ""),
        Err(DispatchError::InvalidEndpoint { .. })
    ));
}

#[test]
fn test_rejection_reason_fallbacks() {
    assert_eq!(rejection_reason(r#"{"reason":"no"}"#), "no");
    assert_eq!(rejection_reason(r#"{"reason":""}"#), r#"{"reason":""}"#);
    assert_eq!(rejection_reason(r#"{"detail":"x"}"#), r#"{"detail":"x"}"#);
    assert_eq!(rejection_reason(r#"{"reason":42}"#), "42");
    assert_eq!(rejection_reason(r#"{"reason":true}"#), "true");
    assert_eq!(rejection_reason(r#"{"reason":0}"#), r#"{"reason":0}"#);
    assert_eq!(rejection_reason(r#"{"reason":null}"#), r#"{"reason":null}"#);
    assert_eq!(rejection_reason("null"), UNKNOWN_ERROR);
    assert_eq!(rejection_reason(""), UNKNOWN_ERROR);
    assert_eq!(rejection_reason("<html>"), UNKNOWN_ERROR);
}

#[test]
fn test_session_shared_between_clones() {
    let session = SessionContext::new();
    let login = session.clone();
    login.set_token("abc");
    login.set_username("operator");
    assert_eq!(session.token().as_deref(), Some("abc"));
    assert_eq!(session.username().as_deref(), Some("operator"));

    login.clear();
    assert!(session.token().is_none());
    assert!(session.username().is_none());
}

#[tokio::test]
async fn test_send_success_with_bearer_token() {
    let base = spawn_backend().await;
    let dispatcher = CommandDispatcher::new(base, SessionContext::with_token("jwt-123"));

    let result = dispatcher
        .send("alarm", "ackalarmmsg", &json!({"alarm_occurrence_id": "a1"}))
        .await
        .unwrap();

    assert_eq!(result["authorization"], "Bearer jwt-123");
    assert_eq!(result["body"]["alarm_occurrence_id"], "a1");
    assert!(result["x_user"].is_null());
}

#[tokio::test]
async fn test_send_without_token_omits_authorization() {
    let base = spawn_backend().await;
    let dispatcher = CommandDispatcher::new(base, SessionContext::new());

    let result = dispatcher
        .send("alarm", "ackalarmmsg", &json!({"alarm_occurrence_id": "a1"}))
        .await
        .unwrap();
    assert!(result["authorization"].is_null());
}

#[tokio::test]
async fn test_send_legacy_convention_with_user_header() {
    let base = spawn_backend().await;
    let session = SessionContext::new();
    session.set_username("operator");
    session.set_token("ignored");
    let dispatcher = CommandDispatcher::new(base, session)
        .with_convention(EndpointConvention::Legacy)
        .with_auth_scheme(AuthScheme::UserHeader);

    let result = dispatcher
        .send(
            "command",
            "sendcommandmsg",
            &json!({"command_id": "OPEN", "datapoint_identifier": "VALVE", "value": 1}),
        )
        .await
        .unwrap();

    assert_eq!(result["x_user"], "operator");
    assert!(result["authorization"].is_null());
    assert_eq!(result["body"]["command_id"], "OPEN");
}

#[tokio::test]
async fn test_send_custom_user_header() {
    let base = spawn_backend().await;
    let session = SessionContext::new();
    session.set_username("night-shift");
    let dispatcher = CommandDispatcher::new(base, session)
        .with_auth_scheme(AuthScheme::UserHeader)
        .with_user_header("X-Operator");

    let result = dispatcher
        .send("alarm", "ackalarmmsg", &json!({}))
        .await
        .unwrap();
    assert_eq!(result["operator"], "night-shift");
}

#[tokio::test]
async fn test_failure_surfaces_reason() {
    let base = spawn_backend().await;
    let dispatcher = CommandDispatcher::new(base, SessionContext::new());

    let err = dispatcher
        .send(
            "datapoint",
            "rawtagupdatemsg",
            &json!({"datapoint_identifier": "NOPE", "value": 1}),
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "unknown datapoint");
    match err {
        DispatchError::Rejected { status, .. } => assert_eq!(status.as_u16(), 400),
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failure_without_parseable_body() {
    let base = spawn_backend().await;
    let dispatcher = CommandDispatcher::new(base, SessionContext::new());

    let err = dispatcher
        .send("command", "sendcommandmsg", &json!({}))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), UNKNOWN_ERROR);
    assert!(!err.to_string().is_empty());
    assert!(matches!(err, DispatchError::Rejected { status, .. } if status.as_u16() == 500));
}

#[tokio::test]
async fn test_failure_without_reason_uses_body_text() {
    let base = spawn_backend().await;
    let dispatcher = CommandDispatcher::new(base, SessionContext::new());

    let err = dispatcher
        .send("communication", "driverconnectcommand", &json!({}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("field required"));
}

#[tokio::test]
async fn test_empty_success_body_is_null() {
    let base = spawn_backend().await;
    let dispatcher = CommandDispatcher::new(base, SessionContext::new());

    let result = dispatcher.send("gis", "empty", &json!({})).await.unwrap();
    assert!(result.is_null());
}

#[tokio::test]
async fn test_non_json_success_body_is_decode_error() {
    let base = spawn_backend().await;
    let dispatcher = CommandDispatcher::new(base, SessionContext::new());

    let err = dispatcher.send("gis", "html", &json!({})).await.unwrap_err();
    assert!(matches!(err, DispatchError::Decode(_)));
}

#[tokio::test]
async fn test_network_failure_is_distinct() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dispatcher = CommandDispatcher::new(
        Url::parse(&format!("http://{addr}")).unwrap(),
        SessionContext::new(),
    );
    let err = dispatcher
        .send("alarm", "ackalarmmsg", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Network(_)));
    assert!(err.to_string().starts_with("network error"));
}

#[tokio::test]
async fn test_abort_in_flight_send() {
    let base = spawn_backend().await;
    let dispatcher = CommandDispatcher::new(base, SessionContext::new());
    let (handle, registration) = AbortHandle::new_pair();

    let pending = tokio::spawn(async move {
        dispatcher
            .send_with_abort("slow", "wait", &json!({}), registration)
            .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.abort();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, DispatchError::Aborted));
}

#[tokio::test]
async fn test_ping_reports_server_time() {
    let base = spawn_backend().await;
    let dispatcher = CommandDispatcher::new(base, SessionContext::new());

    let status = dispatcher.ping().await.unwrap();
    assert_eq!(status.status, "ok");
    let ts = status.parsed_timestamp().unwrap();
    assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2026-10-16 08:30:05");
}

#[test]
fn test_command_action_names() {
    assert_eq!(AckAlarmMsg::ACTION, "ackalarmmsg");
    assert_eq!(SendCommandMsg::ACTION, "sendcommandmsg");
    assert_eq!(RawTagUpdateMsg::ACTION, "rawtagupdatemsg");
    assert_eq!(DriverConnectCommand::ACTION, "driverconnectcommand");
    assert_eq!(ClientAlertFeedbackMsg::ACTION, "clientalertfeedbackmsg");
    assert_eq!(AnimationUpdateRequestMsg::ACTION, "animationupdaterequestmsg");
    assert_eq!(DriverConnectCommand::TOPIC, "communication");
}

#[test]
fn test_command_payload_shapes() {
    let raw = RawTagUpdateMsg::new("TANK", json!(12));
    assert_eq!(
        serde_json::to_value(&raw).unwrap(),
        json!({"datapoint_identifier": "TANK", "value": 12, "quality": "good"})
    );

    let animation = AnimationUpdateRequestMsg::new("PUMP", "good")
        .with_value(0.5)
        .with_track_id("t-9");
    assert_eq!(
        serde_json::to_value(&animation).unwrap(),
        json!({"datapoint_identifier": "PUMP", "quality": "good", "value": 0.5, "track_id": "t-9"})
    );

    let driver = DriverConnectCommand::new("modbus-1", "connect");
    assert_eq!(
        serde_json::to_value(&driver).unwrap(),
        json!({"driver_name": "modbus-1", "status": "connect"})
    );
}

#[tokio::test]
async fn test_send_command_posts_to_action_endpoint() {
    let base = spawn_backend().await;
    let dispatcher = CommandDispatcher::new(base, SessionContext::with_token("jwt-123"));

    let ack = AckAlarmMsg::new("occ-7").with_track_id("track-1");
    let result = dispatcher.send_command(AckAlarmMsg::TOPIC, &ack).await.unwrap();

    assert_eq!(result["authorization"], "Bearer jwt-123");
    assert_eq!(
        result["body"],
        json!({"alarm_occurrence_id": "occ-7", "track_id": "track-1"})
    );
}

#[tokio::test]
async fn test_send_command_legacy_and_rejected() {
    let base = spawn_backend().await;
    let legacy = CommandDispatcher::new(base.clone(), SessionContext::new())
        .with_convention(EndpointConvention::Legacy);
    let command = SendCommandMsg::new("OPEN", "VALVE", json!(1));
    let result = legacy.send_command("command", &command).await.unwrap();
    assert_eq!(result["body"]["datapoint_identifier"], "VALVE");

    let dispatcher = CommandDispatcher::new(base, SessionContext::new());
    let err = dispatcher
        .send_command("datapoint", &RawTagUpdateMsg::new("NOPE", json!(1)))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "unknown datapoint");
}
