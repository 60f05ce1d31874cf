//! HTTP control surface

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use clap::Parser;
use serde_json::Value;
use tower::ServiceExt;

use stopwatch_sync::{
    api::{create_router, responses::ApiResponse},
    config::Config,
    spawn_background_tasks,
    state::AppState,
};

fn app(args: &[&str]) -> (Router, Arc<AppState>) {
    let mut argv = vec!["stopwatch-sync"];
    argv.extend_from_slice(args);
    let config = Config::parse_from(argv);

    let (state, inbound) = AppState::new(&config).unwrap();
    let state = Arc::new(state);
    spawn_background_tasks(&state, inbound);
    (create_router(Arc::clone(&state)), state)
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app(&[]);
    let (status, body) = call(&app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn phone_start_and_stop() {
    let (app, _) = app(&[]);

    let (status, body) = call(&app, "POST", "/phone/start").await;
    assert_eq!(status, StatusCode::OK);
    let response: ApiResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.status, "ok");
    assert!(response.views.phone.is_running);
    assert!(response.views.phone.start_time.is_some());

    let (_, body) = call(&app, "POST", "/phone/start").await;
    assert_eq!(body["message"], "Phone timer already running");

    let (_, body) = call(&app, "POST", "/phone/stop").await;
    assert_eq!(body["phone"]["isRunning"], false);
    assert_eq!(body["phone"]["elapsedTime"], 0.0);
    assert_eq!(body["phone"]["display"], "00:00.0");
}

#[tokio::test]
async fn watch_falls_back_when_session_is_down() {
    let (app, state) = app(&[]);

    call(&app, "POST", "/link/disconnect").await;
    let (status, body) = call(&app, "POST", "/watch/start").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "standalone");
    assert_eq!(body["watch"]["standalone"], true);
    assert_eq!(body["watch"]["isRunning"], true);
    assert_eq!(body["phone"]["isRunning"], false);

    let (_, body) = call(&app, "POST", "/watch/stop").await;
    assert_eq!(body["watch"]["isRunning"], false);
    assert!(!state.phone.snapshot().unwrap().is_running);
}

#[tokio::test]
async fn watch_start_goes_through_the_phone() {
    let (app, state) = app(&[]);

    let (_, body) = call(&app, "POST", "/watch/start").await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["phone"]["isRunning"], true);
    assert!(state.phone.snapshot().unwrap().is_running);

    call(&app, "POST", "/watch/stop").await;
    assert!(!state.phone.snapshot().unwrap().is_running);
}

#[tokio::test]
async fn watch_notify_without_session_reports_error() {
    let (app, _) = app(&["--offline"]);
    let (status, body) = call(&app, "POST", "/watch/notify").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn status_reports_session_and_last_action() {
    let (app, _) = app(&["--offline", "--disable-live-activity"]);

    call(&app, "POST", "/phone/start").await;
    let (status, body) = call(&app, "GET", "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["link"]["activation"], "not_activated");
    assert_eq!(body["link"]["reachable"], false);
    assert_eq!(body["last_action"], "phone-start");
    assert!(body["live_activity"].is_null());
    assert_eq!(body["phone"]["isRunning"], true);

    call(&app, "POST", "/link/connect").await;
    let (_, body) = call(&app, "GET", "/status").await;
    assert_eq!(body["link"]["activation"], "activated");
    assert_eq!(body["link"]["reachable"], true);
}

#[tokio::test]
async fn live_activity_stop_endpoint_stops_the_phone() {
    let (app, state) = app(&[]);

    call(&app, "POST", "/phone/start").await;
    let (_, body) = call(&app, "POST", "/live-activity/stop").await;
    assert_eq!(body["message"], "Stop requested");

    for _ in 0..100 {
        if !state.phone.snapshot().unwrap().is_running {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(!state.phone.snapshot().unwrap().is_running);
}
