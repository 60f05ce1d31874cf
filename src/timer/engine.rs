//! Local timer engine: owns the start time and running flag on one endpoint

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tracing::{debug, info};

use super::{Clock, TimerEvent, TimerObserver};
use crate::{
    state::{timer_state::seconds_between, TimerState},
    tasks::spawn_ticker,
    utils::format_elapsed,
};

/// Default recomputation cadence
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Stopwatch engine for a single endpoint
pub struct TimerEngine {
    /// Endpoint name used in logs
    name: &'static str,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    state: Mutex<TimerState>,
    /// Periodic recomputation task, present while running
    ticker: Mutex<Option<JoinHandle<()>>>,
    observers: Mutex<Vec<Arc<dyn TimerObserver>>>,
    state_tx: watch::Sender<TimerState>,
}

impl TimerEngine {
    /// Create a stopped engine
    pub fn new(name: &'static str, clock: Arc<dyn Clock>, tick_interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(TimerState::new());

        Self {
            name,
            clock,
            tick_interval,
            state: Mutex::new(TimerState::new()),
            ticker: Mutex::new(None),
            observers: Mutex::new(Vec::new()),
            state_tx,
        }
    }

    /// Endpoint name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register an observer for start, tick and stop events
    pub fn add_observer(&self, observer: Arc<dyn TimerObserver>) -> Result<(), String> {
        self.observers
            .lock()
            .map_err(|e| format!("Failed to lock timer observers: {}", e))?
            .push(observer);
        Ok(())
    }

    /// Start the stopwatch.
    ///
    /// Returns `Ok(false)` without touching the state when already running.
    pub fn start(self: &Arc<Self>) -> Result<bool, String> {
        let runtime = Handle::try_current()
            .map_err(|e| format!("Timer ticks need a tokio runtime: {}", e))?;

        let mut ticker = self.ticker.lock()
            .map_err(|e| format!("Failed to lock timer ticker: {}", e))?;
        let mut state = self.state.lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))?;

        if state.is_running {
            debug!("{} timer already running, ignoring start", self.name);
            return Ok(false);
        }

        let start_time = self.clock.now();
        *state = TimerState::running(start_time, 0.0);
        let snapshot = state.clone();

        self.notify(&TimerEvent::Started {
            start_time,
            state: snapshot.clone(),
        });
        self.state_tx.send_replace(snapshot);
        drop(state);

        if let Some(previous) = ticker.take() {
            previous.abort();
        }
        *ticker = Some(spawn_ticker(&runtime, Arc::downgrade(self), self.tick_interval));

        info!("{} timer started at {}", self.name, start_time);
        Ok(true)
    }

    /// Stop the stopwatch and reset it to zero.
    ///
    /// Always leaves the engine stopped with no start time and zero elapsed time.
    pub fn stop(&self) -> Result<TimerState, String> {
        let mut ticker = self.ticker.lock()
            .map_err(|e| format!("Failed to lock timer ticker: {}", e))?;
        if let Some(handle) = ticker.take() {
            handle.abort();
        }

        let mut state = self.state.lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))?;
        let was_running = state.is_running;
        let final_elapsed = state.elapsed_at(self.clock.now());

        *state = TimerState::stopped();
        let snapshot = state.clone();

        if was_running {
            self.notify(&TimerEvent::Stopped { final_elapsed });
            info!("{} timer stopped after {}", self.name, format_elapsed(final_elapsed));
        } else {
            debug!("{} timer stop requested while idle", self.name);
        }
        self.state_tx.send_replace(snapshot.clone());

        Ok(snapshot)
    }

    /// Recompute elapsed time from the start time.
    ///
    /// Returns the new state, or `None` when the engine is not running.
    pub fn recompute(&self) -> Result<Option<TimerState>, String> {
        let mut state = self.state.lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))?;

        let Some(start_time) = state.start_time.filter(|_| state.is_running) else {
            return Ok(None);
        };

        let elapsed = seconds_between(start_time, self.clock.now());
        state.elapsed_time = state.elapsed_time.max(elapsed);
        let snapshot = state.clone();

        self.notify(&TimerEvent::Tick(snapshot.clone()));
        self.state_tx.send_replace(snapshot.clone());

        Ok(Some(snapshot))
    }

    /// Current state
    pub fn snapshot(&self) -> Result<TimerState, String> {
        self.state.lock()
            .map(|state| state.clone())
            .map_err(|e| format!("Failed to lock timer state: {}", e))
    }

    /// Check if the engine is running
    pub fn is_running(&self) -> bool {
        self.snapshot().map(|state| state.is_running).unwrap_or(false)
    }

    /// Current elapsed time formatted for display
    pub fn formatted_time(&self) -> Result<String, String> {
        self.snapshot().map(|state| state.formatted())
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state_tx.subscribe()
    }

    fn notify(&self, event: &TimerEvent) {
        let observers = match self.observers.lock() {
            Ok(observers) => observers.clone(),
            Err(e) => {
                tracing::warn!("Failed to lock timer observers: {}", e);
                return;
            }
        };

        for observer in observers {
            observer.on_event(event);
        }
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        if let Ok(mut ticker) = self.ticker.lock() {
            if let Some(handle) = ticker.take() {
                handle.abort();
            }
        }
    }
}
