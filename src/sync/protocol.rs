//! Wire shapes exchanged between the phone and the watch.
//!
//! Both envelopes travel as flat JSON objects. Commands go watch → phone and are
//! answered with a status reply; contexts go phone → watch and are decoded
//! sparsely so that partial or malformed payloads never fail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::TimerState;

/// Flat JSON object carried by the transport
pub type Payload = Map<String, Value>;

pub const ACTION_KEY: &str = "action";
pub const STATUS_KEY: &str = "status";
pub const MESSAGE_KEY: &str = "message";
pub const IS_RUNNING_KEY: &str = "isRunning";
pub const ELAPSED_TIME_KEY: &str = "elapsedTime";
pub const START_TIME_KEY: &str = "startTime";

/// Command sent from the watch to the phone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Start,
    Stop,
    SendNotification,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::SendNotification => "sendNotification",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Action::Start),
            "stop" => Some(Action::Stop),
            "sendNotification" => Some(Action::SendNotification),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status token in a command reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Started,
    Stopped,
    NotificationSent,
    UnknownAction,
    Error,
}

/// Reply to a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    pub status: ReplyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommandReply {
    fn status(status: ReplyStatus) -> Self {
        Self {
            status,
            message: None,
        }
    }

    pub fn started() -> Self {
        Self::status(ReplyStatus::Started)
    }

    pub fn stopped() -> Self {
        Self::status(ReplyStatus::Stopped)
    }

    pub fn notification_sent() -> Self {
        Self::status(ReplyStatus::NotificationSent)
    }

    pub fn unknown_action() -> Self {
        Self::status(ReplyStatus::UnknownAction)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == ReplyStatus::Error
    }

    pub fn to_payload(&self) -> Payload {
        to_object(self)
    }

    pub fn from_payload(payload: &Payload) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(payload.clone()))
    }
}

/// Build the payload for a command
pub fn command_payload(action: Action) -> Payload {
    let mut payload = Payload::new();
    payload.insert(ACTION_KEY.to_string(), Value::from(action.as_str()));
    payload
}

/// Read the action from an inbound command, or the reply to send back if there is none
pub fn parse_command(payload: &Payload) -> Result<Action, CommandReply> {
    let name = payload
        .get(ACTION_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| CommandReply::error("No action specified"))?;

    Action::from_name(name).ok_or_else(CommandReply::unknown_action)
}

/// Full timer state as broadcast by the phone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncContext {
    pub is_running: bool,
    pub elapsed_time: f64,
    /// Epoch seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
}

impl SyncContext {
    pub fn from_state(state: &TimerState) -> Self {
        Self {
            is_running: state.is_running,
            elapsed_time: state.elapsed_time,
            start_time: state.start_time.map(to_epoch_seconds),
        }
    }

    pub fn to_payload(&self) -> Payload {
        to_object(self)
    }
}

/// Sparse view of a received context: each field is `None` when absent or unusable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextUpdate {
    pub is_running: Option<bool>,
    pub elapsed_time: Option<f64>,
    pub start_time: Option<DateTime<Utc>>,
}

impl ContextUpdate {
    /// Decode leniently; wrong types, negative or non-finite numbers are dropped
    pub fn from_payload(payload: &Payload) -> Self {
        let is_running = payload.get(IS_RUNNING_KEY).and_then(Value::as_bool);
        let elapsed_time = payload
            .get(ELAPSED_TIME_KEY)
            .and_then(Value::as_f64)
            .filter(|secs| secs.is_finite() && *secs >= 0.0);
        let start_time = payload
            .get(START_TIME_KEY)
            .and_then(Value::as_f64)
            .and_then(from_epoch_seconds);

        Self {
            is_running,
            elapsed_time,
            start_time,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.is_running.is_none() && self.elapsed_time.is_none() && self.start_time.is_none()
    }
}

pub fn to_epoch_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp() as f64 + f64::from(time.timestamp_subsec_micros()) / 1_000_000.0
}

pub fn from_epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1_000_000_000.0).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

fn to_object<T: Serialize>(value: &T) -> Payload {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Payload::new(),
    }
}
