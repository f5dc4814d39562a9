//! Mapping of domain errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use super::responses::ErrorResponse;
use crate::{
    services::UploadError,
    state::{BackdropError, CountdownError},
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Countdown(#[from] CountdownError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Backdrop(#[from] BackdropError),

    /// Request body could not be decoded
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Countdown(CountdownError::InvalidDuration(_)) => StatusCode::BAD_REQUEST,
            ApiError::Countdown(CountdownError::NothingToStart)
            | ApiError::Countdown(CountdownError::StillRunning) => StatusCode::CONFLICT,
            ApiError::Upload(UploadError::MissingFile)
            | ApiError::Upload(UploadError::Multipart(_)) => StatusCode::BAD_REQUEST,
            ApiError::Upload(UploadError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Backdrop(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
