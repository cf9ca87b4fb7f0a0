//! Typed command messages accepted by the backend.
//!
//! Each message knows its action name, which is the message type name
//! lowercased. Posting one with [`CommandDispatcher::send_command`] targets
//! `(topic, action)` under the dispatcher's endpoint convention.
//!
//! [`CommandDispatcher::send_command`]: crate::dispatch::CommandDispatcher::send_command

use serde::Serialize;
use serde_json::Value;

/// A payload with a fixed action name.
pub trait Command: Serialize {
    const ACTION: &'static str;

    /// Topic the backend usually serves this command on.
    const TOPIC: &'static str;
}

fn default_quality() -> String {
    "good".to_string()
}

/// Acknowledges one alarm occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AckAlarmMsg {
    pub alarm_occurrence_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

impl AckAlarmMsg {
    pub fn new(alarm_occurrence_id: impl Into<String>) -> Self {
        Self {
            alarm_occurrence_id: alarm_occurrence_id.into(),
            timestamp: None,
            track_id: None,
        }
    }

    pub fn with_track_id(mut self, track_id: impl Into<String>) -> Self {
        self.track_id = Some(track_id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

impl Command for AckAlarmMsg {
    const ACTION: &'static str = "ackalarmmsg";
    const TOPIC: &'static str = "alarm";
}

/// Sets a command datapoint to a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendCommandMsg {
    pub command_id: String,
    pub datapoint_identifier: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

impl SendCommandMsg {
    pub fn new(
        command_id: impl Into<String>,
        datapoint_identifier: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            command_id: command_id.into(),
            datapoint_identifier: datapoint_identifier.into(),
            value,
            track_id: None,
        }
    }

    pub fn with_track_id(mut self, track_id: impl Into<String>) -> Self {
        self.track_id = Some(track_id.into());
        self
    }
}

impl Command for SendCommandMsg {
    const ACTION: &'static str = "sendcommandmsg";
    const TOPIC: &'static str = "command";
}

/// Writes a raw value into a datapoint, as a driver would.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawTagUpdateMsg {
    pub datapoint_identifier: String,
    pub value: Value,
    pub quality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

impl RawTagUpdateMsg {
    /// A good-quality update.
    pub fn new(datapoint_identifier: impl Into<String>, value: Value) -> Self {
        Self {
            datapoint_identifier: datapoint_identifier.into(),
            value,
            quality: default_quality(),
            timestamp: None,
            track_id: None,
        }
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_track_id(mut self, track_id: impl Into<String>) -> Self {
        self.track_id = Some(track_id.into());
        self
    }
}

impl Command for RawTagUpdateMsg {
    const ACTION: &'static str = "rawtagupdatemsg";
    const TOPIC: &'static str = "datapoint";
}

/// Connects or disconnects a driver. `status` is e.g. `"connect"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverConnectCommand {
    pub driver_name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

impl DriverConnectCommand {
    pub fn new(driver_name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            driver_name: driver_name.into(),
            status: status.into(),
            track_id: None,
        }
    }

    pub fn with_track_id(mut self, track_id: impl Into<String>) -> Self {
        self.track_id = Some(track_id.into());
        self
    }
}

impl Command for DriverConnectCommand {
    const ACTION: &'static str = "driverconnectcommand";
    const TOPIC: &'static str = "communication";
}

/// Operator response to a client-side alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientAlertFeedbackMsg {
    pub feedback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

impl ClientAlertFeedbackMsg {
    pub fn new(feedback: impl Into<String>) -> Self {
        Self {
            feedback: feedback.into(),
            track_id: None,
        }
    }

    pub fn with_track_id(mut self, track_id: impl Into<String>) -> Self {
        self.track_id = Some(track_id.into());
        self
    }
}

impl Command for ClientAlertFeedbackMsg {
    const ACTION: &'static str = "clientalertfeedbackmsg";
    const TOPIC: &'static str = "alert";
}

/// Asks for an animation to be re-rendered for a datapoint state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationUpdateRequestMsg {
    pub datapoint_identifier: String,
    pub quality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

impl AnimationUpdateRequestMsg {
    pub fn new(datapoint_identifier: impl Into<String>, quality: impl Into<String>) -> Self {
        Self {
            datapoint_identifier: datapoint_identifier.into(),
            quality: quality.into(),
            value: None,
            alarm_status: None,
            track_id: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_alarm_status(mut self, alarm_status: impl Into<String>) -> Self {
        self.alarm_status = Some(alarm_status.into());
        self
    }

    pub fn with_track_id(mut self, track_id: impl Into<String>) -> Self {
        self.track_id = Some(track_id.into());
        self
    }
}

impl Command for AnimationUpdateRequestMsg {
    const ACTION: &'static str = "animationupdaterequestmsg";
    const TOPIC: &'static str = "animation";
}
