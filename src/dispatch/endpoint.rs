use serde::Deserialize;

/// How a command endpoint path is derived from `(topic, action)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointConvention {
    /// `/{topic}_send_{action}`
    Legacy,
    /// `/{topic}/{action}`
    #[default]
    Path,
}

impl EndpointConvention {
    pub fn path(self, topic: &str, action: &str) -> String {
        match self {
            Self::Legacy => format!("/{topic}_send_{action}"),
            Self::Path => format!("/{topic}/{action}"),
        }
    }
}

/// Which credential a command request carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>`
    #[default]
    Bearer,
    /// The username in a plain header, `X-User` unless configured otherwise.
    UserHeader,
}
