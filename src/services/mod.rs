//! External service module
//!
//! This module contains the upload relay storage used for backdrop images.

pub mod uploads;

// Re-export main types
pub use uploads::{UploadError, UploadStore};
