//! State management module
//!
//! This module contains the synchronized timer state and the application
//! state that wires both endpoints together.

pub mod app_state;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, SessionInbound};
pub use timer_state::TimerState;
