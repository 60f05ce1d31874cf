//! HTTP control surface
//!
//! Drives both endpoints and the simulated session, standing in for the
//! phone and watch user interfaces.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/phone/start", post(phone_start_handler))
        .route("/phone/stop", post(phone_stop_handler))
        .route("/phone/notify", post(phone_notify_handler))
        .route("/watch/start", post(watch_start_handler))
        .route("/watch/stop", post(watch_stop_handler))
        .route("/watch/notify", post(watch_notify_handler))
        .route("/live-activity/stop", post(live_activity_stop_handler))
        .route("/link/connect", post(link_connect_handler))
        .route("/link/disconnect", post(link_disconnect_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
