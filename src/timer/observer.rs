//! Timer event fan-out

use chrono::{DateTime, Utc};

use crate::state::TimerState;

/// Lifecycle events emitted by a [`TimerEngine`](super::TimerEngine)
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    /// A new run began
    Started {
        start_time: DateTime<Utc>,
        state: TimerState,
    },
    /// Elapsed time was recomputed
    Tick(TimerState),
    /// The run ended; `final_elapsed` is the value just before the reset
    Stopped { final_elapsed: f64 },
}

impl TimerEvent {
    /// State the engine holds once this event has been applied
    pub fn state(&self) -> TimerState {
        match self {
            TimerEvent::Started { state, .. } | TimerEvent::Tick(state) => state.clone(),
            TimerEvent::Stopped { .. } => TimerState::stopped(),
        }
    }
}

/// Receives timer events synchronously from the engine.
///
/// Called while the engine holds its state lock: implementations must not call
/// back into the engine that notified them.
pub trait TimerObserver: Send + Sync {
    fn on_event(&self, event: &TimerEvent);
}
