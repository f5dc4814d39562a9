//! Stage Countdown - A countdown display server for live events
//!
//! This is the main entry point for the stage-countdown application.

use std::{future::IntoFuture, sync::Arc};
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use stage_countdown::{
    api::create_router,
    config::Config,
    services::UploadStore,
    shutdown_signal,
    state::{AppState, CountdownEngine},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("stage_countdown={},tower_http=info", config.log_level()))
        .init();

    info!("Starting stage-countdown server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, minutes={}, tick={}ms, uploads={}",
        config.host,
        config.port,
        config.minutes,
        config.tick_interval().as_millis(),
        config.upload_dir.display()
    );

    let initial_seconds = config
        .initial_seconds()
        .context("--minutes must be a positive number")?;

    let uploads = UploadStore::new(config.upload_dir.clone(), config.max_upload_bytes);
    uploads
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create {}", config.upload_dir.display()))?;

    // Create application state
    let countdown = CountdownEngine::with_system_clock(initial_seconds, config.tick_interval());
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        countdown,
        uploads,
    ));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /timer/configure - Set duration {{\"minutes\": n}}");
    info!("  POST   /timer/start     - Start the countdown");
    info!("  POST   /timer/pause     - Pause the countdown");
    info!("  POST   /timer/resume    - Resume the countdown");
    info!("  POST   /timer/reset     - Reset the countdown to zero");
    info!("  GET    /timer           - Current display values");
    info!("  GET    /timer/events    - Display values as server-sent events");
    info!("  GET    /backdrop        - Current backdrop (PUT to set, DELETE to clear)");
    info!("  POST   /upload          - Upload a backdrop image (field \"image\")");
    info!("  GET    /status          - Server status");
    info!("  GET    /health          - Health check");

    // Open display streams never finish on their own, so stop on the signal
    let server = axum::serve(listener, app).into_future();

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
