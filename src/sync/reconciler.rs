//! State reconciliation on the receiving endpoint

use std::sync::Arc;
use tracing::{error, info, warn};

use super::protocol::{parse_command, Action, CommandReply, ContextUpdate, Payload};
use crate::{
    services::NotificationCenter,
    state::TimerState,
    timer::TimerEngine,
};

/// Answers inbound commands by driving the local engine
pub struct CommandHandler {
    engine: Arc<TimerEngine>,
    notifications: Option<Arc<NotificationCenter>>,
}

impl CommandHandler {
    pub fn new(engine: Arc<TimerEngine>, notifications: Option<Arc<NotificationCenter>>) -> Self {
        Self {
            engine,
            notifications,
        }
    }

    /// Handle one command payload and build the reply payload
    pub fn handle(&self, message: &Payload) -> Payload {
        let reply = match parse_command(message) {
            Ok(action) => {
                info!("Received action from peer: {}", action);
                self.dispatch(action)
            }
            Err(reply) => {
                warn!("Rejecting command {:?}: {:?}", message, reply.status);
                reply
            }
        };
        reply.to_payload()
    }

    fn dispatch(&self, action: Action) -> CommandReply {
        match action {
            Action::Start => match self.engine.start() {
                Ok(_) => CommandReply::started(),
                Err(e) => {
                    error!("Failed to start timer for peer: {}", e);
                    CommandReply::error(e)
                }
            },
            Action::Stop => match self.engine.stop() {
                Ok(_) => CommandReply::stopped(),
                Err(e) => {
                    error!("Failed to stop timer for peer: {}", e);
                    CommandReply::error(e)
                }
            },
            Action::SendNotification => match &self.notifications {
                Some(notifications) => {
                    if !notifications.is_authorized() {
                        notifications.request_authorization();
                    }
                    notifications.schedule_offline_notification();
                    CommandReply::notification_sent()
                }
                None => CommandReply::error("Notification center not available"),
            },
        }
    }
}

/// Merge a sparse context update into local observable state.
///
/// Present fields overwrite, absent ones are left alone. `isRunning: false`
/// without a `startTime` clears the start time. The result is then normalized,
/// so a stopped state always ends with zero elapsed time and no start time.
/// Returns whether anything changed.
pub fn merge_context(state: &mut TimerState, update: &ContextUpdate) -> bool {
    let before = state.clone();

    if let Some(is_running) = update.is_running {
        state.is_running = is_running;
    }
    if let Some(elapsed_time) = update.elapsed_time {
        state.elapsed_time = elapsed_time;
    }
    match update.start_time {
        Some(start_time) => state.start_time = Some(start_time),
        None if update.is_running == Some(false) => state.start_time = None,
        None => {}
    }

    state.normalize();
    *state != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::protocol::{command_payload, ReplyStatus};
    use crate::timer::{ManualClock, DEFAULT_TICK_INTERVAL};
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn handler(notifications: Option<Arc<NotificationCenter>>) -> (CommandHandler, Arc<TimerEngine>) {
        let clock = Arc::new(ManualClock::new(at(0)));
        let engine = Arc::new(TimerEngine::new("phone", clock, DEFAULT_TICK_INTERVAL));
        (CommandHandler::new(Arc::clone(&engine), notifications), engine)
    }

    fn status(reply: &Payload) -> ReplyStatus {
        CommandReply::from_payload(reply).unwrap().status
    }

    #[tokio::test]
    async fn start_and_stop_drive_the_engine() {
        let (handler, engine) = handler(None);

        let reply = handler.handle(&command_payload(Action::Start));
        assert_eq!(status(&reply), ReplyStatus::Started);
        assert!(engine.is_running());

        // repeated start still acknowledges
        let reply = handler.handle(&command_payload(Action::Start));
        assert_eq!(status(&reply), ReplyStatus::Started);

        let reply = handler.handle(&command_payload(Action::Stop));
        assert_eq!(status(&reply), ReplyStatus::Stopped);
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn rejects_unknown_and_missing_actions() {
        let (handler, engine) = handler(None);

        let reply = handler.handle(json!({"action": "lap"}).as_object().unwrap());
        assert_eq!(status(&reply), ReplyStatus::UnknownAction);

        let reply = handler.handle(&Payload::new());
        assert_eq!(Value::Object(reply), json!({"status": "error", "message": "No action specified"}));
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn notification_needs_a_center() {
        let (handler, _) = handler(None);
        let reply = handler.handle(&command_payload(Action::SendNotification));
        assert_eq!(status(&reply), ReplyStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn notification_is_scheduled() {
        let center = Arc::new(NotificationCenter::new(true, Duration::from_secs(5)));
        let (handler, _) = handler(Some(Arc::clone(&center)));

        let reply = handler.handle(&command_payload(Action::SendNotification));
        assert_eq!(status(&reply), ReplyStatus::NotificationSent);
        assert!(center.is_authorized());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(center.delivered().len(), 1);
    }

    #[test]
    fn stop_without_start_time_clears_start_time() {
        let mut state = TimerState::running(at(0), 12.0);
        let changed = merge_context(&mut state, &ContextUpdate {
            is_running: Some(false),
            ..Default::default()
        });

        assert!(changed);
        assert_eq!(state, TimerState::stopped());
    }

    #[test]
    fn elapsed_only_update_is_sparse() {
        let mut state = TimerState::running(at(0), 12.0);
        merge_context(&mut state, &ContextUpdate {
            elapsed_time: Some(30.0),
            ..Default::default()
        });

        assert!(state.is_running);
        assert_eq!(state.start_time, Some(at(0)));
        assert_eq!(state.elapsed_time, 30.0);
    }

    #[test]
    fn full_update_replaces_fields() {
        let mut state = TimerState::stopped();
        merge_context(&mut state, &ContextUpdate {
            is_running: Some(true),
            elapsed_time: Some(4.0),
            start_time: Some(at(-4)),
        });
        assert_eq!(state, TimerState::running(at(-4), 4.0));
    }

    #[test]
    fn stopped_receiver_stays_reset() {
        let mut state = TimerState::stopped();
        let changed = merge_context(&mut state, &ContextUpdate {
            elapsed_time: Some(30.0),
            ..Default::default()
        });
        assert!(!changed);
        assert_eq!(state, TimerState::stopped());
    }

    #[test]
    fn empty_update_changes_nothing() {
        let mut state = TimerState::running(at(0), 1.0);
        assert!(!merge_context(&mut state, &ContextUpdate::default()));
    }
}
