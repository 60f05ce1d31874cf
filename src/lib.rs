//! Stopwatch Sync - a stopwatch shared between a phone and a paired watch
//!
//! The phone owns the authoritative timer and broadcasts its state; the watch
//! mirrors it, sends start/stop commands, and falls back to a standalone timer
//! whenever the session between the two is unavailable.

pub mod api;
pub mod config;
pub mod services;
pub mod state;
pub mod sync;
pub mod tasks;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::{AppState, SessionInbound, TimerState};
pub use tasks::spawn_background_tasks;
pub use timer::TimerEngine;
pub use utils::{format_elapsed, signals::shutdown_signal};
