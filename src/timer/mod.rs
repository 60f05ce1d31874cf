//! Local timer engine module
//!
//! Each endpoint owns one [`TimerEngine`]; the phone's is authoritative and the
//! watch's only runs while the watch is in standalone mode.

pub mod clock;
pub mod engine;
pub mod observer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{TimerEngine, DEFAULT_TICK_INTERVAL};
pub use observer::{TimerEvent, TimerObserver};
