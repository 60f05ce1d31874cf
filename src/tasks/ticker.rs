//! Periodic elapsed-time recomputation

use std::{sync::Weak, time::Duration};
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::timer::TimerEngine;

/// Spawn the recomputation loop for a running engine.
///
/// The loop ends once the engine is dropped; `stop()` aborts it directly.
pub fn spawn_ticker(runtime: &Handle, engine: Weak<TimerEngine>, period: Duration) -> JoinHandle<()> {
    runtime.spawn(async move {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;

            let Some(engine) = engine.upgrade() else {
                debug!("Timer engine dropped, ending ticker");
                break;
            };
            match engine.recompute() {
                Ok(Some(_)) => {}
                Ok(None) => {
                    debug!("{} timer no longer running, ending ticker", engine.name());
                    break;
                }
                Err(e) => warn!("Failed to recompute {} timer: {}", engine.name(), e),
            }
        }
    })
}
