use serde::Deserialize;

use crate::dispatch::{AuthScheme, EndpointConvention};

/// Top-level configuration settings for a feed client.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub dispatch: DispatchSettings,
    pub feed: FeedSettings,
    pub logging: LoggingSettings,
}

/// Where the backend lives.
///
/// `http_base_url` is the root that command and ping paths are appended to;
/// `ws_url` is the real-time feed endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub http_base_url: String,
    pub ws_url: String,
}

/// Command endpoint naming and credential header selection.
#[derive(Debug, Deserialize, Clone)]
pub struct DispatchSettings {
    pub endpoint_convention: EndpointConvention,
    pub auth_scheme: AuthScheme,
    pub user_header: String,
}

/// Topic channel behaviour.
#[derive(Debug, Deserialize, Clone)]
pub struct FeedSettings {
    pub reconnect: bool,
    pub reconnect_base_delay_ms: u64,
    pub reconnect_max_delay_ms: u64,
    pub ping_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Every field is optional; missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub dispatch: Option<PartialDispatchSettings>,
    pub feed: Option<PartialFeedSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialServerSettings {
    pub http_base_url: Option<String>,
    pub ws_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialDispatchSettings {
    pub endpoint_convention: Option<EndpointConvention>,
    pub auth_scheme: Option<AuthScheme>,
    pub user_header: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialFeedSettings {
    pub reconnect: Option<bool>,
    pub reconnect_base_delay_ms: Option<u64>,
    pub reconnect_max_delay_ms: Option<u64>,
    pub ping_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                http_base_url: "http://127.0.0.1:8000".to_string(),
                ws_url: "ws://127.0.0.1:8000/feed".to_string(),
            },
            dispatch: DispatchSettings {
                endpoint_convention: EndpointConvention::Path,
                auth_scheme: AuthScheme::Bearer,
                user_header: "X-User".to_string(),
            },
            feed: FeedSettings {
                reconnect: false,
                reconnect_base_delay_ms: 1_000,
                reconnect_max_delay_ms: 30_000,
                ping_interval_ms: 5_000,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Settings {
    /// Fills every missing value of `partial` from the defaults.
    pub fn merge(partial: PartialSettings) -> Self {
        let default = Settings::default();
        let server = partial.server.unwrap_or_default();
        let dispatch = partial.dispatch.unwrap_or_default();
        let feed = partial.feed.unwrap_or_default();
        let logging = partial.logging.unwrap_or_default();

        Settings {
            server: ServerSettings {
                http_base_url: server.http_base_url.unwrap_or(default.server.http_base_url),
                ws_url: server.ws_url.unwrap_or(default.server.ws_url),
            },
            dispatch: DispatchSettings {
                endpoint_convention: dispatch
                    .endpoint_convention
                    .unwrap_or(default.dispatch.endpoint_convention),
                auth_scheme: dispatch.auth_scheme.unwrap_or(default.dispatch.auth_scheme),
                user_header: dispatch.user_header.unwrap_or(default.dispatch.user_header),
            },
            feed: FeedSettings {
                reconnect: feed.reconnect.unwrap_or(default.feed.reconnect),
                reconnect_base_delay_ms: feed
                    .reconnect_base_delay_ms
                    .unwrap_or(default.feed.reconnect_base_delay_ms),
                reconnect_max_delay_ms: feed
                    .reconnect_max_delay_ms
                    .unwrap_or(default.feed.reconnect_max_delay_ms),
                ping_interval_ms: feed.ping_interval_ms.unwrap_or(default.feed.ping_interval_ms),
            },
            logging: LoggingSettings {
                level: logging.level.unwrap_or(default.logging.level),
            },
        }
    }
}
