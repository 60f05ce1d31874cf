//! Presence surface (Live Activity) kept in step with the timer

use std::sync::Mutex;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    timer::{TimerEvent, TimerObserver},
    utils::format_elapsed,
};

/// Presence failures are logged by [`PresenceObserver`] and never reach the engine
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error("live activities are disabled")]
    Disabled,

    #[error("no live activity in progress")]
    NotStarted,

    #[error("failed to lock live activity: {0}")]
    Lock(String),
}

/// Out-of-band status display updated alongside the timer
pub trait Presence: Send + Sync {
    fn begin(&self, start_time: DateTime<Utc>) -> Result<(), PresenceError>;

    fn update(&self, elapsed_time: f64, is_running: bool) -> Result<(), PresenceError>;

    fn end(&self, elapsed_time: f64) -> Result<(), PresenceError>;
}

/// Content currently shown by the live activity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityContent {
    pub start_time: DateTime<Utc>,
    pub elapsed_time: f64,
    pub is_running: bool,
}

/// Logging live activity that tracks its displayed content
#[derive(Debug)]
pub struct LiveActivity {
    enabled: bool,
    current: Mutex<Option<ActivityContent>>,
}

impl LiveActivity {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            current: Mutex::new(None),
        }
    }

    pub fn current(&self) -> Option<ActivityContent> {
        self.current.lock().ok().and_then(|current| current.clone())
    }
}

impl Presence for LiveActivity {
    fn begin(&self, start_time: DateTime<Utc>) -> Result<(), PresenceError> {
        if !self.enabled {
            return Err(PresenceError::Disabled);
        }

        let mut current = self.current.lock().map_err(|e| PresenceError::Lock(e.to_string()))?;
        if current.is_some() {
            debug!("Replacing live activity still in progress");
        }
        *current = Some(ActivityContent {
            start_time,
            elapsed_time: 0.0,
            is_running: true,
        });
        info!("Live activity started at {}", start_time);
        Ok(())
    }

    fn update(&self, elapsed_time: f64, is_running: bool) -> Result<(), PresenceError> {
        let mut current = self.current.lock().map_err(|e| PresenceError::Lock(e.to_string()))?;
        let content = current.as_mut().ok_or(PresenceError::NotStarted)?;
        content.elapsed_time = elapsed_time;
        content.is_running = is_running;
        Ok(())
    }

    fn end(&self, elapsed_time: f64) -> Result<(), PresenceError> {
        let mut current = self.current.lock().map_err(|e| PresenceError::Lock(e.to_string()))?;
        current.take().ok_or(PresenceError::NotStarted)?;
        info!("Live activity ended at {}", format_elapsed(elapsed_time));
        Ok(())
    }
}

/// Forwards timer events to a presence surface, swallowing its failures
pub struct PresenceObserver<P> {
    presence: P,
}

impl<P: Presence> PresenceObserver<P> {
    pub fn new(presence: P) -> Self {
        Self { presence }
    }
}

impl<P: Presence> TimerObserver for PresenceObserver<P> {
    fn on_event(&self, event: &TimerEvent) {
        let result = match event {
            TimerEvent::Started { start_time, .. } => self.presence.begin(*start_time),
            TimerEvent::Tick(state) => self.presence.update(state.elapsed_time, state.is_running),
            TimerEvent::Stopped { final_elapsed } => self.presence.end(*final_elapsed),
        };

        if let Err(e) = result {
            match event {
                TimerEvent::Tick(_) => debug!("Live activity update skipped: {}", e),
                _ => warn!("Live activity request failed: {}", e),
            }
        }
    }
}

impl<P: Presence> Presence for std::sync::Arc<P> {
    fn begin(&self, start_time: DateTime<Utc>) -> Result<(), PresenceError> {
        (**self).begin(start_time)
    }

    fn update(&self, elapsed_time: f64, is_running: bool) -> Result<(), PresenceError> {
        (**self).update(elapsed_time, is_running)
    }

    fn end(&self, elapsed_time: f64) -> Result<(), PresenceError> {
        (**self).end(elapsed_time)
    }
}
