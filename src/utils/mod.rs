//! Utility functions module
//!
//! Formatting shared by both endpoints and process signal handling.

pub mod format;
pub mod signals;

// Re-export main functions
pub use format::format_elapsed;
pub use signals::shutdown_signal;
