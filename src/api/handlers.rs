//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    state::AppState,
    sync::{CommandOutcome, ReplyStatus},
};
use super::responses::{ApiResponse, HealthResponse, LinkView, StatusResponse, Views};

fn views(state: &AppState) -> Result<Views, StatusCode> {
    Views::capture(state).map_err(|e| {
        error!("Failed to capture timer views: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Handle POST /phone/start - Start the phone timer
pub async fn phone_start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_action("phone-start");
    match state.phone.start() {
        Ok(started) => {
            let message = if started { "Phone timer started" } else { "Phone timer already running" };
            info!("{}", message);
            Ok(Json(ApiResponse::ok(message.to_string(), views(&state)?)))
        }
        Err(e) => {
            error!("Failed to start phone timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /phone/stop - Stop and reset the phone timer
pub async fn phone_stop_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_action("phone-stop");
    match state.phone.stop() {
        Ok(_) => {
            info!("Phone timer stopped");
            Ok(Json(ApiResponse::ok("Phone timer stopped".to_string(), views(&state)?)))
        }
        Err(e) => {
            error!("Failed to stop phone timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /phone/notify - Schedule the local push demo
pub async fn phone_notify_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_action("phone-notify");
    let response = if state.phone.send_notification() {
        ApiResponse::ok("Notification scheduled".to_string(), views(&state)?)
    } else {
        warn!("Notification not scheduled, authorization missing");
        ApiResponse::error("Notifications are not authorized".to_string(), views(&state)?)
    };
    Ok(Json(response))
}

fn watch_timer_command(
    state: &AppState,
    outcome: Result<CommandOutcome, String>,
    verb: &str,
) -> Result<Json<ApiResponse>, StatusCode> {
    match outcome {
        Ok(CommandOutcome::Delivered(reply)) if reply.status == ReplyStatus::Error => {
            let message = reply.message.unwrap_or_else(|| "Phone reported an error".to_string());
            Ok(Json(ApiResponse::error(message, views(state)?)))
        }
        Ok(CommandOutcome::Delivered(_)) => Ok(Json(ApiResponse::ok(
            format!("Phone {} the timer for the watch", verb),
            views(state)?,
        ))),
        Ok(CommandOutcome::Standalone { reason }) => Ok(Json(ApiResponse::standalone(
            format!("Watch {} its local timer: {}", verb, reason),
            views(state)?,
        ))),
        Err(e) => {
            error!("Watch command failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /watch/start - Start from the watch
pub async fn watch_start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_action("watch-start");
    let outcome = state.watch.send_start().await;
    watch_timer_command(&state, outcome, "started")
}

/// Handle POST /watch/stop - Stop from the watch
pub async fn watch_stop_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_action("watch-stop");
    let outcome = state.watch.send_stop().await;
    watch_timer_command(&state, outcome, "stopped")
}

/// Handle POST /watch/notify - Ask the phone for the push demo
pub async fn watch_notify_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_action("watch-notify");
    let response = match state.watch.send_notification_request().await {
        Ok(reply) if reply.status == ReplyStatus::NotificationSent => {
            ApiResponse::ok("Phone scheduled the notification".to_string(), views(&state)?)
        }
        Ok(reply) => ApiResponse::error(
            reply.message.unwrap_or_else(|| format!("Phone replied {:?}", reply.status)),
            views(&state)?,
        ),
        Err(e) => ApiResponse::error(format!("Notification request failed: {}", e), views(&state)?),
    };
    Ok(Json(response))
}

/// Handle POST /live-activity/stop - Stop button on the live activity
pub async fn live_activity_stop_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_action("live-activity-stop");
    let listeners = state.stop_signal.request_stop();
    let message = if listeners > 0 {
        "Stop requested".to_string()
    } else {
        "Stop requested, but nothing is listening".to_string()
    };
    Ok(Json(ApiResponse::ok(message, views(&state)?)))
}

/// Handle POST /link/connect - Activate the session
pub async fn link_connect_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_action("link-connect");
    state.link.connect();
    Ok(Json(ApiResponse::ok("Session activated, peer reachable".to_string(), views(&state)?)))
}

/// Handle POST /link/disconnect - Deactivate the session
pub async fn link_disconnect_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_action("link-disconnect");
    state.link.deactivate();
    Ok(Json(ApiResponse::ok("Session deactivated".to_string(), views(&state)?)))
}

/// Handle GET /status - Return both endpoints and the session
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let (last_action, last_action_time) = state.get_last_action();
    let notifications = state.phone.notifications();

    Ok(Json(StatusResponse {
        views: views(&state)?,
        link: LinkView {
            activation: state.link.activation_state(),
            reachable: state.link.is_reachable(),
        },
        live_activity: state.live_activity.current(),
        notifications_authorized: notifications.is_authorized(),
        notifications_delivered: notifications.delivered().len(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
