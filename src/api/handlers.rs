//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};

use super::{
    error::ApiError,
    responses::{
        ApiResponse, BackdropRequest, ConfigureRequest, HealthResponse, StatusResponse,
        UploadResponse,
    },
};
use crate::{
    services::UploadError,
    state::{AppState, Backdrop, DisplaySnapshot},
};

/// Multipart field carrying the uploaded image
pub const UPLOAD_FIELD: &str = "image";

/// Handle POST /timer/configure - Set a new duration
pub async fn configure_handler(
    State(state): State<Arc<AppState>>,
    request: Result<Json<ConfigureRequest>, JsonRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    // JSON has no NaN or infinity, so unusable numbers fail here instead of in configure
    let Json(request) = request
        .map_err(|e| ApiError::BadRequest(format!("Invalid duration: {}", e.body_text())))?;
    let snapshot = state.countdown.configure(request.minutes)?;
    state.record_action("configure");
    Ok(Json(ApiResponse::new(
        format!("Countdown set to {}", snapshot.formatted),
        snapshot,
    )))
}

/// Handle POST /timer/start - Start counting down
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let snapshot = state.countdown.start()?;
    state.record_action("start");
    Ok(Json(ApiResponse::new("Countdown started", snapshot)))
}

/// Handle POST /timer/pause - Freeze the remaining time
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let snapshot = state.countdown.pause();
    state.record_action("pause");
    Json(ApiResponse::new("Countdown paused", snapshot))
}

/// Handle POST /timer/resume - Continue a paused countdown
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let snapshot = state.countdown.resume();
    state.record_action("resume");
    Json(ApiResponse::new("Countdown resumed", snapshot))
}

/// Handle POST /timer/reset - Zero the countdown
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let snapshot = state.countdown.reset();
    state.record_action("reset");
    Json(ApiResponse::new("Countdown reset", snapshot))
}

/// Handle GET /timer - Current display values
pub async fn timer_handler(State(state): State<Arc<AppState>>) -> Json<DisplaySnapshot> {
    Json(state.countdown.snapshot())
}

/// Handle GET /timer/events - Stream display values as server-sent events
pub async fn timer_events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let updates = WatchStream::new(state.countdown.subscribe());
    let stream = updates.filter_map(|snapshot| async move {
        match Event::default().event("countdown").json_data(&snapshot) {
            Ok(event) => Some(Ok::<_, Infallible>(event)),
            Err(e) => {
                warn!("Failed to encode countdown event: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /backdrop - Current backdrop reference
pub async fn get_backdrop_handler(State(state): State<Arc<AppState>>) -> Json<Backdrop> {
    Json(state.get_backdrop())
}

/// Handle PUT /backdrop - Select a backdrop
pub async fn set_backdrop_handler(
    State(state): State<Arc<AppState>>,
    request: Result<Json<BackdropRequest>, JsonRejection>,
) -> Result<Json<Backdrop>, ApiError> {
    let Json(request) = request.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let backdrop = state.set_backdrop(&request.url)?;
    state.record_action("backdrop");
    Ok(Json(backdrop))
}

/// Handle DELETE /backdrop - Clear the backdrop
pub async fn clear_backdrop_handler(State(state): State<Arc<AppState>>) -> Json<Backdrop> {
    let backdrop = state.clear_backdrop();
    state.record_action("backdrop-clear");
    Json(backdrop)
}

/// Handle POST /upload - Store the `image` field and return its reference
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Upload without multipart body: {}", e);
        UploadError::MissingFile
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Multipart(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| UploadError::Multipart(e.to_string()))?;

        // browsers send an empty part when no file was picked
        if original_name.is_empty() && bytes.is_empty() {
            break;
        }

        let filename = state.uploads.save(&original_name, &bytes).await?;
        info!("Upload stored as {}", filename);
        return Ok(Json(UploadResponse { filename }));
    }

    Err(UploadError::MissingFile.into())
}

/// Handle GET /status - Return current server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        countdown: state.countdown.snapshot(),
        backdrop: state.get_backdrop(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
