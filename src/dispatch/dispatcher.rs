use chrono::NaiveDateTime;
use futures::future::{AbortRegistration, Abortable};
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::DispatchSettings;
use crate::dispatch::commands::Command;
use crate::dispatch::endpoint::{AuthScheme, EndpointConvention};
use crate::dispatch::session::SessionContext;

/// Message used when a failed response carries no readable reason.
pub const UNKNOWN_ERROR: &str = "Unknown error";

const PING_PATH: &str = "/frontend/ping";
const PING_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Error returned when a command cannot be delivered or is refused.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The backend answered with a non-success status.
    ///
    /// `reason` is the `reason` field of the error body when it is a
    /// non-empty string, non-zero number or `true`, the body's JSON text
    /// otherwise, or [`UNKNOWN_ERROR`] when the body is
    /// not JSON at all.
    #[error("{reason}")]
    Rejected { status: StatusCode, reason: String },

    /// No response was received.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The caller aborted the request before it completed.
    #[error("request aborted")]
    Aborted,

    #[error("invalid endpoint {path}: {reason}")]
    InvalidEndpoint { path: String, reason: String },

    #[error("failed to encode payload: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A success response whose body is not JSON.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Body of the backend's ping endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ServerStatus {
    /// The server's local clock, when the timestamp is in the backend's
    /// `dd/mm/yyyy HH:MM:SS` format.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        let raw = self.timestamp.as_deref()?;
        NaiveDateTime::parse_from_str(raw, PING_TIMESTAMP_FORMAT).ok()
    }
}

/// Sends commands as single HTTP request/response exchanges.
///
/// Holds no per-call state. There is no retry and no timeout beyond what the
/// underlying HTTP client applies; failures go straight back to the caller.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    http: reqwest::Client,
    base_url: Url,
    convention: EndpointConvention,
    auth: AuthScheme,
    user_header: String,
    session: SessionContext,
}

impl CommandDispatcher {
    pub fn new(base_url: Url, session: SessionContext) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            convention: EndpointConvention::default(),
            auth: AuthScheme::default(),
            user_header: "X-User".to_string(),
            session,
        }
    }

    pub fn from_settings(base_url: Url, settings: &DispatchSettings, session: SessionContext) -> Self {
        Self::new(base_url, session)
            .with_convention(settings.endpoint_convention)
            .with_auth_scheme(settings.auth_scheme)
            .with_user_header(settings.user_header.clone())
    }

    pub fn with_convention(mut self, convention: EndpointConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn with_auth_scheme(mut self, auth: AuthScheme) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_user_header(mut self, header: impl Into<String>) -> Self {
        self.user_header = header.into();
        self
    }

    /// Reuses an existing HTTP client (connection pool, proxies, TLS setup).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// The URL a command for `(topic, action)` is posted to.
    pub fn endpoint(&self, topic: &str, action: &str) -> Result<Url, DispatchError> {
        let path = self.convention.path(topic, action);
        if topic.is_empty() || action.is_empty() {
            return Err(DispatchError::InvalidEndpoint {
                path,
                reason: "topic and action must not be empty".to_string(),
            });
        }
        self.url_for(&path)
    }

    /// POSTs `payload` as JSON and returns the parsed response body.
    ///
    /// An empty success body yields `Value::Null`.
    pub async fn send<P>(&self, topic: &str, action: &str, payload: &P) -> Result<Value, DispatchError>
    where
        P: Serialize + ?Sized,
    {
        let url = self.endpoint(topic, action)?;
        let body = serde_json::to_vec(payload).map_err(DispatchError::Serialize)?;

        debug!(%url, topic, action, "sending command");
        let request = self
            .authorize(self.http.post(url.clone()))
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        let response = request.send().await.map_err(DispatchError::Network)?;
        let status = response.status();
        let text = response.text().await.map_err(DispatchError::Network)?;

        if !status.is_success() {
            let reason = rejection_reason(&text);
            warn!(%url, %status, reason = %reason, "command rejected");
            return Err(DispatchError::Rejected { status, reason });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(DispatchError::Decode)
    }

    /// Posts a typed command to its action on `topic`.
    pub async fn send_command<C: Command>(&self, topic: &str, command: &C) -> Result<Value, DispatchError> {
        self.send(topic, C::ACTION, command).await
    }

    /// Like [`send`](Self::send), but resolves to [`DispatchError::Aborted`]
    /// as soon as the matching `AbortHandle` is triggered.
    pub async fn send_with_abort<P>(
        &self,
        topic: &str,
        action: &str,
        payload: &P,
        abort: AbortRegistration,
    ) -> Result<Value, DispatchError>
    where
        P: Serialize + ?Sized,
    {
        Abortable::new(self.send(topic, action, payload), abort)
            .await
            .unwrap_or(Err(DispatchError::Aborted))
    }

    /// Asks the backend for its status.
    pub async fn ping(&self) -> Result<ServerStatus, DispatchError> {
        let url = self.url_for(PING_PATH)?;
        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(DispatchError::Network)?;
        let status = response.status();
        let text = response.text().await.map_err(DispatchError::Network)?;

        if !status.is_success() {
            return Err(DispatchError::Rejected {
                status,
                reason: rejection_reason(&text),
            });
        }
        serde_json::from_str(&text).map_err(DispatchError::Decode)
    }

    fn url_for(&self, path: &str) -> Result<Url, DispatchError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}")).map_err(|e| DispatchError::InvalidEndpoint {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth {
            AuthScheme::Bearer => match self.session.token() {
                Some(token) => request.bearer_auth(token),
                None => request,
            },
            AuthScheme::UserHeader => match self.session.username() {
                Some(username) => request.header(self.user_header.as_str(), username),
                None => request,
            },
        }
    }
}

/// Best-effort human-readable reason from an error body.
pub(crate) fn rejection_reason(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) | Err(_) => UNKNOWN_ERROR.to_string(),
        Ok(value) => match value.get("reason") {
            Some(Value::String(reason)) if !reason.is_empty() => reason.clone(),
            Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
            Some(Value::Bool(true)) => "true".to_string(),
            _ => value.to_string(),
        },
    }
}
