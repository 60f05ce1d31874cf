//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    services::ActivityContent,
    state::{AppState, TimerState},
    sync::ActivationState,
    utils::format_elapsed,
};

/// Timer as shown on one endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointView {
    pub is_running: bool,
    pub elapsed_time: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub display: String,
}

impl EndpointView {
    fn new(state: TimerState, display_elapsed: f64) -> Self {
        Self {
            is_running: state.is_running,
            elapsed_time: state.elapsed_time,
            start_time: state.start_time,
            display: format_elapsed(display_elapsed),
        }
    }
}

/// Watch view with its fallback flag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchView {
    #[serde(flatten)]
    pub timer: EndpointView,
    pub standalone: bool,
}

/// Both endpoints at one instant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Views {
    pub phone: EndpointView,
    pub watch: WatchView,
}

impl Views {
    pub fn capture(state: &AppState) -> Result<Self, String> {
        let phone = state.phone.snapshot()?;
        let phone_elapsed = phone.elapsed_time;
        let watch = state.watch.snapshot()?;
        let watch_elapsed = state.watch.display_elapsed()?;

        Ok(Self {
            phone: EndpointView::new(phone, phone_elapsed),
            watch: WatchView {
                timer: EndpointView::new(watch, watch_elapsed),
                standalone: state.watch.is_standalone(),
            },
        })
    }
}

/// API response structure for action endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub views: Views,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String, views: Views) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            views,
        }
    }

    /// Create an ok response
    pub fn ok(message: String, views: Views) -> Self {
        Self::new("ok", message, views)
    }

    /// Create a response for an action that went to the local fallback
    pub fn standalone(message: String, views: Views) -> Self {
        Self::new("standalone", message, views)
    }

    /// Create an error response
    pub fn error(message: String, views: Views) -> Self {
        Self::new("error", message, views)
    }
}

/// Session state as seen by the control surface
#[derive(Debug, Clone, Serialize)]
pub struct LinkView {
    pub activation: ActivationState,
    pub reachable: bool,
}

/// Full status response
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub views: Views,
    pub link: LinkView,
    pub live_activity: Option<ActivityContent>,
    pub notifications_authorized: bool,
    pub notifications_delivered: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
