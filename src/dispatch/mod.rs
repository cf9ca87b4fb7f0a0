//! The `dispatch` module sends commands to the backend over HTTP.
//!
//! A command is one POST of a JSON payload to an endpoint derived from
//! `(topic, action)`. The dispatcher holds no per-call state and is
//! independent of any feed subscription: the outcome of a command shows up
//! later as an ordinary delta on whatever topic it affects.

pub mod commands;
pub mod dispatcher;
pub mod endpoint;
pub mod session;

pub use commands::{
    AckAlarmMsg, AnimationUpdateRequestMsg, ClientAlertFeedbackMsg, Command, DriverConnectCommand,
    RawTagUpdateMsg, SendCommandMsg,
};
pub use dispatcher::{CommandDispatcher, DispatchError, ServerStatus, UNKNOWN_ERROR};
pub use endpoint::{AuthScheme, EndpointConvention};
pub use session::SessionContext;

#[cfg(test)]
mod tests;
