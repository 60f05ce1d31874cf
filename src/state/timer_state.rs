//! Timer state structure shared by both endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::format_elapsed;

/// Stopwatch state: running flag, elapsed seconds and the start timestamp
///
/// A stopped timer always has `elapsed_time == 0` and no `start_time`;
/// stopping is a full reset, not a pause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub is_running: bool,
    pub elapsed_time: f64,
    pub start_time: Option<DateTime<Utc>>,
}

impl TimerState {
    /// Create a new stopped timer state
    pub fn new() -> Self {
        Self::stopped()
    }

    /// Create a stopped timer state
    pub fn stopped() -> Self {
        Self {
            is_running: false,
            elapsed_time: 0.0,
            start_time: None,
        }
    }

    /// Create a running timer state started at `start_time`
    pub fn running(start_time: DateTime<Utc>, elapsed_time: f64) -> Self {
        Self {
            is_running: true,
            elapsed_time: elapsed_time.max(0.0),
            start_time: Some(start_time),
        }
    }

    /// Check if the timer is running
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Elapsed seconds as of `now`.
    ///
    /// Running states with a known start time are derived continuously and never
    /// drop below the last snapshot; everything else returns the snapshot.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> f64 {
        match (self.is_running, self.start_time) {
            (true, Some(start)) => self.elapsed_time.max(seconds_between(start, now)),
            _ => self.elapsed_time,
        }
    }

    /// Snapshot elapsed time formatted for display
    pub fn formatted(&self) -> String {
        format_elapsed(self.elapsed_time)
    }

    /// Enforce the stopped-means-reset invariant
    pub fn normalize(&mut self) {
        if !self.is_running {
            self.start_time = None;
            self.elapsed_time = 0.0;
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Seconds from `start` to `end`, clamped at zero
pub fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let delta = end.signed_duration_since(start);
    match delta.num_microseconds() {
        Some(micros) => (micros as f64 / 1_000_000.0).max(0.0),
        None => (delta.num_milliseconds() as f64 / 1000.0).max(0.0),
    }
}
