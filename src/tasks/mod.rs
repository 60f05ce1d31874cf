//! Background tasks module
//!
//! This module contains the timer ticker and the listeners that connect the
//! endpoints to their inbound channels.

pub mod command_listener;
pub mod context_listener;
pub mod stop_listener;
pub mod ticker;

// Re-export main functions
pub use command_listener::command_listener_task;
pub use context_listener::context_listener_task;
pub use stop_listener::stop_listener_task;
pub use ticker::spawn_ticker;

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::state::{AppState, SessionInbound};

/// Spawn the listeners that connect both endpoints to the session
pub fn spawn_background_tasks(state: &Arc<AppState>, inbound: SessionInbound) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(command_listener_task(
            Arc::clone(&state.phone),
            inbound.phone.commands,
        )),
        tokio::spawn(context_listener_task(
            Arc::clone(&state.watch),
            inbound.watch.contexts,
        )),
        tokio::spawn(stop_listener_task(
            Arc::clone(state.phone.engine()),
            state.stop_signal.subscribe(),
        )),
    ]
}
