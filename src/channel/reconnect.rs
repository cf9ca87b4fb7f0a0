use std::time::Duration;

use crate::config::FeedSettings;

/// What a topic channel does when its connection drops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Stay on the last known collection and report the channel as stale.
    #[default]
    Never,
    /// Reconnect after `base`, doubling up to `max` between attempts. A
    /// received snapshot resets the delay.
    Backoff { base: Duration, max: Duration },
}

impl ReconnectPolicy {
    pub fn from_settings(settings: &FeedSettings) -> Self {
        if settings.reconnect {
            Self::Backoff {
                base: Duration::from_millis(settings.reconnect_base_delay_ms),
                max: Duration::from_millis(settings.reconnect_max_delay_ms),
            }
        } else {
            Self::Never
        }
    }

    /// Delay to wait after `current`, `None` when reconnecting is disabled.
    pub(crate) fn next_delay(&self, current: Option<Duration>) -> Option<Duration> {
        match *self {
            Self::Never => None,
            Self::Backoff { base, max } => Some(match current {
                None => base.min(max),
                Some(delay) => delay.saturating_mul(2).min(max),
            }),
        }
    }
}
