//! End-to-end phone/watch synchronization over the in-memory session

use std::{sync::Arc, time::Duration};

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use clap::Parser;
use tokio::time::timeout;

use stopwatch_sync::{
    config::Config,
    spawn_background_tasks,
    state::{AppState, TimerState},
    sync::CommandOutcome,
    timer::ManualClock,
};

struct Harness {
    state: Arc<AppState>,
    clock: Arc<ManualClock>,
}

fn harness(args: &[&str]) -> Harness {
    let mut argv = vec!["stopwatch-sync"];
    argv.extend_from_slice(args);
    let config = Config::parse_from(argv);

    let clock = Arc::new(ManualClock::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap()));
    let (state, inbound) = AppState::with_clock(&config, clock.clone()).unwrap();
    let state = Arc::new(state);
    spawn_background_tasks(&state, inbound);

    Harness { state, clock }
}

async fn watch_mirror_until(h: &Harness, predicate: impl FnMut(&TimerState) -> bool) -> TimerState {
    let mut rx = h.state.watch.mirror().subscribe();
    let state = timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("watch mirror did not converge")
        .expect("mirror channel closed")
        .clone();
    state
}

#[tokio::test]
async fn watch_start_runs_the_phone_timer_and_mirrors_it() {
    let h = harness(&[]);

    let outcome = h.state.watch.send_start().await.unwrap();
    assert!(matches!(outcome, CommandOutcome::Delivered(_)));
    assert!(h.state.phone.snapshot().unwrap().is_running);

    let mirrored = watch_mirror_until(&h, |s| s.is_running).await;
    assert_eq!(mirrored.start_time, h.state.phone.snapshot().unwrap().start_time);
    assert!(!h.state.watch.is_standalone());

    h.clock.advance(ChronoDuration::seconds(65));
    assert_eq!(h.state.watch.display_time().unwrap(), "01:05.0");

    h.state.watch.send_stop().await.unwrap();
    assert_eq!(h.state.phone.snapshot().unwrap(), TimerState::stopped());
    let mirrored = watch_mirror_until(&h, |s| !s.is_running).await;
    assert_eq!(mirrored, TimerState::stopped());
}

#[tokio::test]
async fn phone_controls_are_mirrored_on_the_watch() {
    let h = harness(&[]);

    assert!(h.state.phone.start().unwrap());
    watch_mirror_until(&h, |s| s.is_running).await;

    h.state.phone.stop().unwrap();
    watch_mirror_until(&h, |s| !s.is_running && s.start_time.is_none()).await;
}

#[tokio::test]
async fn offline_watch_runs_standalone_without_touching_the_phone() {
    let h = harness(&["--offline"]);

    let outcome = h.state.watch.send_start().await.unwrap();
    assert!(matches!(outcome, CommandOutcome::Standalone { .. }));
    assert!(h.state.watch.is_standalone());
    assert!(h.state.watch.snapshot().unwrap().is_running);
    assert!(!h.state.phone.snapshot().unwrap().is_running);

    // no catch-up once the session comes back
    h.state.link.connect();
    assert!(!h.state.phone.snapshot().unwrap().is_running);

    let outcome = h.state.watch.send_stop().await.unwrap();
    assert!(matches!(outcome, CommandOutcome::Standalone { .. }));
    assert_eq!(h.state.watch.snapshot().unwrap(), TimerState::stopped());

    // local timer idle and session back: commands go to the phone again
    let outcome = h.state.watch.send_start().await.unwrap();
    assert!(matches!(outcome, CommandOutcome::Delivered(_)));
    assert!(h.state.phone.snapshot().unwrap().is_running);
}

#[tokio::test]
async fn queued_context_is_delivered_on_reconnect() {
    let h = harness(&[]);
    h.state.link.disconnect();

    h.state.phone.start().unwrap();
    h.clock.advance(ChronoDuration::seconds(2));
    h.state.phone.engine().recompute().unwrap();
    tokio::task::yield_now().await;
    assert!(!h.state.watch.snapshot().unwrap().is_running);

    h.state.link.connect();
    let mirrored = watch_mirror_until(&h, |s| s.is_running).await;
    assert_eq!(mirrored.elapsed_time, 2.0);
}

#[tokio::test]
async fn live_activity_stop_request_stops_both_sides() {
    let h = harness(&[]);
    h.state.phone.start().unwrap();
    watch_mirror_until(&h, |s| s.is_running).await;
    assert!(h.state.live_activity.current().is_some());

    assert_eq!(h.state.stop_signal.request_stop(), 1);
    watch_mirror_until(&h, |s| !s.is_running).await;

    assert_eq!(h.state.phone.snapshot().unwrap(), TimerState::stopped());
    assert!(h.state.live_activity.current().is_none());
}

#[tokio::test(start_paused = true)]
async fn watch_notification_request_schedules_on_the_phone() {
    let h = harness(&["--notification-delay", "5"]);

    let reply = h.state.watch.send_notification_request().await.unwrap();
    assert_eq!(reply.status, stopwatch_sync::sync::ReplyStatus::NotificationSent);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(h.state.phone.notifications().delivered().len(), 1);
}

#[tokio::test]
async fn denied_notifications_are_not_delivered() {
    let h = harness(&["--deny-notifications"]);
    assert!(!h.state.phone.send_notification());
    assert!(!h.state.phone.notifications().is_authorized());
}

#[tokio::test]
async fn watch_stop_heals_a_mirror_that_missed_the_phone_stop() {
    let h = harness(&[]);
    h.state.phone.start().unwrap();
    watch_mirror_until(&h, |s| s.is_running).await;

    h.state.link.deactivate();
    h.state.phone.stop().unwrap();
    h.state.link.connect();
    assert!(h.state.watch.snapshot().unwrap().is_running);

    let outcome = h.state.watch.send_stop().await.unwrap();
    assert!(matches!(outcome, CommandOutcome::Delivered(_)));
    assert!(!h.state.phone.snapshot().unwrap().is_running);

    let mirrored = watch_mirror_until(&h, |s| !s.is_running).await;
    assert_eq!(mirrored, TimerState::stopped());
}
