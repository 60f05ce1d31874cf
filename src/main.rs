//! Stopwatch Sync - a stopwatch shared between a phone and a paired watch
//!
//! This is the main entry point: it wires both endpoints over an in-memory
//! session and serves the HTTP control surface.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use stopwatch_sync::{
    api::create_router,
    config::Config,
    state::AppState,
    tasks::spawn_background_tasks,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("stopwatch_sync={},tower_http=info", config.log_level()))
        .init();

    info!("Starting stopwatch-sync v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, tick={}ms, broadcast={}ms, offline={}",
        config.host, config.port, config.tick_ms, config.broadcast_ms, config.offline
    );

    let (state, inbound) = AppState::new(&config).map_err(anyhow::Error::msg)?;
    let state = Arc::new(state);
    let tasks = spawn_background_tasks(&state, inbound);

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /phone/start         - Start the phone timer");
    info!("  POST /phone/stop          - Stop the phone timer");
    info!("  POST /phone/notify        - Schedule the push demo");
    info!("  POST /watch/start         - Start from the watch");
    info!("  POST /watch/stop          - Stop from the watch");
    info!("  POST /watch/notify        - Ask the phone for the push demo");
    info!("  POST /live-activity/stop  - Stop from the live activity");
    info!("  POST /link/connect        - Activate the phone/watch session");
    info!("  POST /link/disconnect     - Deactivate the phone/watch session");
    info!("  GET  /status              - Check both endpoints");
    info!("  GET  /health              - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        result = shutdown_signal() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => tracing::error!("Failed to listen for shutdown signals: {}", e),
            }
        }
    }

    if let Err(e) = state.phone.stop() {
        tracing::warn!("Failed to stop phone timer on shutdown: {}", e);
    }
    for task in tasks {
        task.abort();
    }

    info!("Server shutdown complete");
    Ok(())
}
