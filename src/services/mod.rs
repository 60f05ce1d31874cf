//! Collaborators driven by the timer
//!
//! This module contains the live activity presence surface, local notification
//! scheduling and the cross-process stop signal.

pub mod notifications;
pub mod presence;
pub mod stop_signal;

// Re-export main types
pub use notifications::{DeliveredNotification, NotificationCenter};
pub use presence::{ActivityContent, LiveActivity, Presence, PresenceError, PresenceObserver};
pub use stop_signal::StopSignal;
