//! Watch-side context listener

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::sync::{Payload, WatchEndpoint};

/// Apply the latest context from the phone each time it changes
pub async fn context_listener_task(
    watch: Arc<WatchEndpoint>,
    mut contexts: watch::Receiver<Option<Payload>>,
) {
    info!("Starting watch context listener");

    while contexts.changed().await.is_ok() {
        let Some(payload) = contexts.borrow_and_update().clone() else {
            continue;
        };
        if let Err(e) = watch.apply_context(&payload) {
            warn!("Failed to apply context from phone: {}", e);
        }
    }

    info!("Watch context listener stopped, session closed");
}
