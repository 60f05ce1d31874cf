//! Listener for out-of-app stop requests

use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{error, info, warn};

use crate::timer::TimerEngine;

/// Stop `engine` whenever a stop request arrives
pub async fn stop_listener_task(engine: Arc<TimerEngine>, mut requests: broadcast::Receiver<()>) {
    info!("Starting stop request listener");

    loop {
        match requests.recv().await {
            Ok(()) => {}
            Err(RecvError::Lagged(missed)) => {
                warn!("Missed {} stop requests, stopping once", missed);
            }
            Err(RecvError::Closed) => break,
        }

        info!("Stop requested from outside the app");
        if let Err(e) = engine.stop() {
            error!("Failed to stop timer on request: {}", e);
        }
    }

    info!("Stop request listener stopped");
}
