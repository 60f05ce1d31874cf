//! Phone endpoint: owns the authoritative timer and broadcasts it to the watch

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    protocol::{parse_command, Action, Payload, SyncContext},
    reconciler::CommandHandler,
    transport::{ChannelError, Transport},
};
use crate::{
    services::NotificationCenter,
    state::TimerState,
    timer::{TimerEngine, TimerEvent, TimerObserver},
};

/// Default spacing of context re-broadcasts while running
pub const DEFAULT_BROADCAST_INTERVAL: Duration = Duration::from_secs(1);

/// Broadcasts the engine's state on every transition and periodically while running
struct ContextPublisher {
    transport: Arc<dyn Transport>,
    interval_secs: f64,
    /// Elapsed time at the last broadcast of the current run
    last_sent: Mutex<Option<f64>>,
}

impl ContextPublisher {
    fn publish(&self, state: &TimerState) {
        let context = SyncContext::from_state(state);
        match self.transport.broadcast_context(context.to_payload()) {
            Ok(()) => debug!(
                "Sent timer state to watch: isRunning={}, elapsed={:.1}",
                context.is_running, context.elapsed_time
            ),
            Err(ChannelError::NotActivated(state)) => {
                debug!("Context not sent, session is {}", state)
            }
            Err(e) => warn!("Error sending context to watch: {}", e),
        }
    }

    fn mark_sent(&self, elapsed: Option<f64>) {
        if let Ok(mut last_sent) = self.last_sent.lock() {
            *last_sent = elapsed;
        }
    }

    fn due(&self, elapsed: f64) -> bool {
        match self.last_sent.lock() {
            Ok(last_sent) => last_sent.map_or(true, |last| elapsed - last >= self.interval_secs),
            Err(_) => true,
        }
    }
}

impl TimerObserver for ContextPublisher {
    fn on_event(&self, event: &TimerEvent) {
        match event {
            TimerEvent::Started { state, .. } => {
                self.publish(state);
                self.mark_sent(Some(state.elapsed_time));
            }
            TimerEvent::Tick(state) => {
                if self.due(state.elapsed_time) {
                    self.publish(state);
                    self.mark_sent(Some(state.elapsed_time));
                }
            }
            TimerEvent::Stopped { .. } => {
                self.publish(&TimerState::stopped());
                self.mark_sent(None);
            }
        }
    }
}

/// The phone side of the pair
pub struct PhoneEndpoint {
    engine: Arc<TimerEngine>,
    transport: Arc<dyn Transport>,
    notifications: Arc<NotificationCenter>,
    handler: CommandHandler,
}

impl PhoneEndpoint {
    /// Wire the endpoint and register its context publisher on `engine`
    pub fn new(
        engine: Arc<TimerEngine>,
        transport: Arc<dyn Transport>,
        notifications: Arc<NotificationCenter>,
        broadcast_interval: Duration,
    ) -> Result<Self, String> {
        engine.add_observer(Arc::new(ContextPublisher {
            transport: Arc::clone(&transport),
            interval_secs: broadcast_interval.as_secs_f64(),
            last_sent: Mutex::new(None),
        }))?;

        let handler = CommandHandler::new(Arc::clone(&engine), Some(Arc::clone(&notifications)));
        info!("Phone endpoint ready, session is {}", transport.activation_state());

        Ok(Self {
            engine,
            transport,
            notifications,
            handler,
        })
    }

    pub fn engine(&self) -> &Arc<TimerEngine> {
        &self.engine
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    /// Local start from the phone's own controls
    pub fn start(&self) -> Result<bool, String> {
        self.engine.start()
    }

    /// Local stop from the phone's own controls
    pub fn stop(&self) -> Result<TimerState, String> {
        self.engine.stop()
    }

    /// Local push demo; returns whether a notification was scheduled
    pub fn send_notification(&self) -> bool {
        if !self.notifications.is_authorized() {
            self.notifications.request_authorization();
        }
        self.notifications.schedule_offline_notification().is_some()
    }

    /// Answer a command received from the watch.
    ///
    /// Start and stop are followed by a fresh broadcast, so a mirror that missed
    /// an earlier transition converges even when the engine state did not change.
    pub fn handle_command(&self, message: &Payload) -> Payload {
        let reply = self.handler.handle(message);

        if matches!(parse_command(message), Ok(Action::Start | Action::Stop)) {
            if let Err(e) = self.publish_state() {
                warn!("Failed to publish state after watch command: {}", e);
            }
        }
        reply
    }

    /// Broadcast the current state right away
    pub fn publish_state(&self) -> Result<(), ChannelError> {
        let state = self.engine.snapshot().map_err(ChannelError::Transport)?;
        self.transport
            .broadcast_context(SyncContext::from_state(&state).to_payload())
    }

    pub fn snapshot(&self) -> Result<TimerState, String> {
        self.engine.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{link, protocol::{command_payload, CommandReply, ContextUpdate, ReplyStatus}};
    use crate::timer::{Clock, ManualClock, DEFAULT_TICK_INTERVAL};
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    fn phone(connected: bool) -> (PhoneEndpoint, Arc<ManualClock>, link::LinkControl, link::Peer) {
        let (control, phone_peer, watch_peer) = link::pair(connected);
        let clock = Arc::new(ManualClock::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap()));
        let engine = Arc::new(TimerEngine::new("phone", clock.clone(), DEFAULT_TICK_INTERVAL));
        let notifications = Arc::new(NotificationCenter::new(true, Duration::from_secs(5)));
        let phone = PhoneEndpoint::new(engine, phone_peer.transport, notifications, DEFAULT_BROADCAST_INTERVAL).unwrap();
        (phone, clock, control, watch_peer)
    }

    fn received(watch: &mut link::Peer) -> ContextUpdate {
        let payload = watch.inbound.contexts.borrow_and_update().clone().unwrap();
        ContextUpdate::from_payload(&payload)
    }

    #[tokio::test]
    async fn start_and_stop_are_broadcast() {
        let (phone, clock, _control, mut watch) = phone(true);

        phone.start().unwrap();
        let update = received(&mut watch);
        assert_eq!(update.is_running, Some(true));
        assert_eq!(update.start_time, Some(clock.now()));

        phone.stop().unwrap();
        let update = received(&mut watch);
        assert_eq!(update.is_running, Some(false));
        assert_eq!(update.elapsed_time, Some(0.0));
        assert_eq!(update.start_time, None);
    }

    #[tokio::test]
    async fn ticks_are_throttled() {
        let (phone, clock, _control, mut watch) = phone(true);
        phone.start().unwrap();
        received(&mut watch);

        clock.advance(ChronoDuration::milliseconds(400));
        phone.engine().recompute().unwrap();
        assert!(!watch.inbound.contexts.has_changed().unwrap());

        clock.advance(ChronoDuration::milliseconds(700));
        phone.engine().recompute().unwrap();
        assert!(watch.inbound.contexts.has_changed().unwrap());
        assert_eq!(received(&mut watch).elapsed_time, Some(1.1));
    }

    #[tokio::test]
    async fn inactive_session_does_not_block_the_timer() {
        let (phone, _clock, control, mut watch) = phone(false);

        assert!(phone.start().unwrap());
        assert!(phone.publish_state().is_err());

        control.connect();
        phone.publish_state().unwrap();
        assert_eq!(received(&mut watch).is_running, Some(true));
    }

    #[tokio::test]
    async fn watch_stop_republishes_when_already_idle() {
        let (phone, _clock, control, mut watch) = phone(true);
        phone.start().unwrap();
        received(&mut watch);

        // stop transition lost while the session was down
        control.deactivate();
        phone.stop().unwrap();
        control.connect();
        assert_eq!(received(&mut watch).is_running, Some(true));

        let reply = phone.handle_command(&command_payload(Action::Stop));
        assert_eq!(CommandReply::from_payload(&reply).unwrap().status, ReplyStatus::Stopped);
        assert!(watch.inbound.contexts.has_changed().unwrap());
        assert_eq!(received(&mut watch).is_running, Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn local_notification_demo() {
        let (phone, _clock, _control, _watch) = phone(true);

        assert!(phone.send_notification());
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(phone.notifications().delivered().len(), 1);
    }
}
