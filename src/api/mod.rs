//! HTTP API module
//!
//! This module contains the operator panel endpoints, the display feed,
//! the upload relay and the response structures they share.

pub mod error;
pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer,
};

use crate::state::AppState;
use handlers::*;

pub use error::ApiError;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.uploads.max_bytes();
    let uploads_dir = state.uploads.dir().to_path_buf();

    // multipart uploads get their own limit instead of axum's default
    let upload_routes = Router::new()
        .route("/upload", post(upload_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_limit));

    Router::new()
        .route("/timer", get(timer_handler))
        .route("/timer/events", get(timer_events_handler))
        .route("/timer/configure", post(configure_handler))
        .route("/timer/start", post(start_handler))
        .route("/timer/pause", post(pause_handler))
        .route("/timer/resume", post(resume_handler))
        .route("/timer/reset", post(reset_handler))
        .route(
            "/backdrop",
            get(get_backdrop_handler)
                .put(set_backdrop_handler)
                .delete(clear_backdrop_handler),
        )
        .merge(upload_routes)
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
