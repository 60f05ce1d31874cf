//! Cross-process "stop requested" signal
//!
//! Raised by the live activity or a notification action; the phone's stop
//! listener treats it exactly like a local stop.

use tokio::sync::broadcast;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: broadcast::Sender<()>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Raise the signal; returns how many listeners received it
    pub fn request_stop(&self) -> usize {
        info!("Stop requested from live activity");
        match self.tx.send(()) {
            Ok(listeners) => listeners,
            Err(_) => {
                debug!("Stop request had no listeners");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listeners_receive_requests() {
        let signal = StopSignal::new();
        assert_eq!(signal.request_stop(), 0);

        let mut rx = signal.subscribe();
        assert_eq!(signal.request_stop(), 1);
        rx.recv().await.unwrap();
    }
}
