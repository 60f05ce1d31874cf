//! Watch endpoint: mirrors the phone's timer and falls back to a local one
//!
//! Commands go to the phone while the session is activated. When the session
//! is down or a send fails, the watch runs its own engine in standalone mode
//! and stays there while that engine runs. Nothing is replayed to the phone
//! once the link recovers; the next context from the phone takes over.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{
    protocol::{command_payload, Action, CommandReply, ContextUpdate, Payload},
    reconciler::merge_context,
    transport::{await_reply, ActivationState, ChannelError, Transport},
};
use crate::{
    state::TimerState,
    timer::{Clock, TimerEngine, TimerEvent, TimerObserver},
    utils::format_elapsed,
};

/// How a watch command was carried out
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The phone answered
    Delivered(CommandReply),
    /// The local engine handled it
    Standalone { reason: String },
}

/// Observable timer state on the watch
#[derive(Debug)]
pub struct Mirror {
    state: Mutex<TimerState>,
    tx: watch::Sender<TimerState>,
}

impl Mirror {
    fn new() -> Self {
        let (tx, _) = watch::channel(TimerState::new());
        Self {
            state: Mutex::new(TimerState::new()),
            tx,
        }
    }

    fn set(&self, new_state: TimerState) -> Result<(), String> {
        let mut state = self.state.lock()
            .map_err(|e| format!("Failed to lock mirror state: {}", e))?;
        *state = new_state.clone();
        self.tx.send_replace(new_state);
        Ok(())
    }

    fn merge(&self, update: &ContextUpdate) -> Result<TimerState, String> {
        let mut state = self.state.lock()
            .map_err(|e| format!("Failed to lock mirror state: {}", e))?;
        if merge_context(&mut state, update) {
            self.tx.send_replace(state.clone());
        }
        Ok(state.clone())
    }

    pub fn snapshot(&self) -> Result<TimerState, String> {
        self.state.lock()
            .map(|state| state.clone())
            .map_err(|e| format!("Failed to lock mirror state: {}", e))
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.tx.subscribe()
    }
}

/// Copies the standalone engine's state into the mirror
struct StandaloneFeed(Arc<Mirror>);

impl TimerObserver for StandaloneFeed {
    fn on_event(&self, event: &TimerEvent) {
        if let Err(e) = self.0.set(event.state()) {
            warn!("Failed to mirror local timer: {}", e);
        }
    }
}

/// The watch side of the pair
pub struct WatchEndpoint {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    local: Arc<TimerEngine>,
    mirror: Arc<Mirror>,
    standalone: AtomicBool,
}

impl WatchEndpoint {
    /// `local` must be a dedicated engine; it only runs in standalone mode
    pub fn new(
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        local: Arc<TimerEngine>,
    ) -> Result<Self, String> {
        let mirror = Arc::new(Mirror::new());
        local.add_observer(Arc::new(StandaloneFeed(Arc::clone(&mirror))))?;
        info!("Watch endpoint ready, session is {}", transport.activation_state());

        Ok(Self {
            transport,
            clock,
            local,
            mirror,
            standalone: AtomicBool::new(false),
        })
    }

    pub fn is_standalone(&self) -> bool {
        self.standalone.load(Ordering::SeqCst)
    }

    pub fn mirror(&self) -> &Arc<Mirror> {
        &self.mirror
    }

    pub fn snapshot(&self) -> Result<TimerState, String> {
        self.mirror.snapshot()
    }

    /// Elapsed time for display, derived from the start time when one is known
    pub fn display_elapsed(&self) -> Result<f64, String> {
        Ok(self.mirror.snapshot()?.elapsed_at(self.clock.now()))
    }

    pub fn display_time(&self) -> Result<String, String> {
        self.display_elapsed().map(format_elapsed)
    }

    /// Ask the phone to start, or start locally
    pub async fn send_start(&self) -> Result<CommandOutcome, String> {
        self.send_timer_command(Action::Start).await
    }

    /// Ask the phone to stop, or stop locally
    pub async fn send_stop(&self) -> Result<CommandOutcome, String> {
        self.send_timer_command(Action::Stop).await
    }

    async fn send_timer_command(&self, action: Action) -> Result<CommandOutcome, String> {
        if let Some(reason) = self.local_reason() {
            warn!("{} - using local timer for {}", reason, action);
            return self.run_locally(action, reason);
        }

        let pending = match self.transport.send_command(command_payload(action)) {
            Ok(pending) => pending,
            Err(e) => {
                error!("Error sending {} command: {}", action, e);
                return self.run_locally(action, e.to_string());
            }
        };

        match await_reply(pending).await {
            Ok(reply) => {
                if reply.is_error() {
                    warn!("Phone rejected {} command: {:?}", action, reply.message);
                } else {
                    info!("{} command sent, reply: {:?}", action, reply.status);
                }
                Ok(CommandOutcome::Delivered(reply))
            }
            Err(e) => {
                error!("Error sending {} command: {}", action, e);
                self.run_locally(action, e.to_string())
            }
        }
    }

    /// Why the next command cannot go to the phone, if anything
    fn local_reason(&self) -> Option<String> {
        let state = self.transport.activation_state();
        if state != ActivationState::Activated {
            return Some(format!("Session is {}", state));
        }
        if self.is_standalone() {
            if self.local.is_running() {
                return Some("Standalone timer running".to_string());
            }
            debug!("Session activated and local timer idle, leaving standalone mode");
            self.standalone.store(false, Ordering::SeqCst);
        }
        None
    }

    fn run_locally(&self, action: Action, reason: String) -> Result<CommandOutcome, String> {
        if !self.standalone.swap(true, Ordering::SeqCst) {
            info!("Entering standalone mode");
        }

        match action {
            Action::Start => {
                self.local.start()?;
                info!("Local timer started");
            }
            Action::Stop => {
                self.local.stop()?;
                // mirrored phone state may still show a run the local engine never saw
                self.mirror.set(TimerState::stopped())?;
                info!("Local timer stopped");
            }
            Action::SendNotification => {
                return Err(format!("{} cannot run without the phone", action));
            }
        }

        Ok(CommandOutcome::Standalone { reason })
    }

    /// Ask the phone to schedule its push demo. No local fallback.
    pub async fn send_notification_request(&self) -> Result<CommandReply, ChannelError> {
        let state = self.transport.activation_state();
        if state != ActivationState::Activated {
            warn!("Notification request not sent, session is {}", state);
            return Err(ChannelError::NotActivated(state));
        }

        let pending = self.transport
            .send_command(command_payload(Action::SendNotification))
            .map_err(|e| {
                error!("Error sending notification request: {}", e);
                e
            })?;

        let reply = await_reply(pending).await.map_err(|e| {
            error!("Error sending notification request: {}", e);
            e
        })?;
        info!("Notification request sent, reply: {:?}", reply.status);
        Ok(reply)
    }

    /// Merge a context broadcast from the phone.
    ///
    /// The latest arrival wins: a standalone run is abandoned in its favour.
    pub fn apply_context(&self, payload: &Payload) -> Result<TimerState, String> {
        let update = ContextUpdate::from_payload(payload);
        if update.is_empty() {
            debug!("Ignoring context without usable fields: {:?}", payload);
            return self.mirror.snapshot();
        }

        if self.standalone.swap(false, Ordering::SeqCst) {
            info!("Context received from phone, leaving standalone mode");
            self.local.stop()?;
        }

        let state = self.mirror.merge(&update)?;
        info!(
            "Received context: isRunning={}, elapsed={:.1}",
            state.is_running, state.elapsed_time
        );
        Ok(state)
    }
}
