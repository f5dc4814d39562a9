//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{Backdrop, DisplaySnapshot};

/// Body of `POST /timer/configure`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigureRequest {
    pub minutes: f64,
}

/// Body of `PUT /backdrop`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackdropRequest {
    pub url: String,
}

/// API response structure for operator actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub countdown: DisplaySnapshot,
}

impl ApiResponse {
    /// Create a response whose status is the countdown phase
    pub fn new(message: impl Into<String>, countdown: DisplaySnapshot) -> Self {
        Self {
            status: countdown.phase.as_str().to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            countdown,
        }
    }
}

/// Error body shared by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Successful upload relay response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
}

/// Enhanced status response with countdown information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub countdown: DisplaySnapshot,
    pub backdrop: Backdrop,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
