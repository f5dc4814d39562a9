//! Backdrop selection shown behind the countdown

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackdropError {
    #[error("Backdrop URL must not be empty")]
    EmptyUrl,
}

/// Currently selected backdrop reference
///
/// The URL is opaque: either a client-local object URL or an
/// `uploads/<name>` reference handed out by the upload relay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backdrop {
    pub url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Backdrop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a new backdrop
    pub fn set(&mut self, url: &str) -> Result<(), BackdropError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(BackdropError::EmptyUrl);
        }
        self.url = Some(url.to_string());
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Drop the backdrop; returns whether one was set
    pub fn clear(&mut self) -> bool {
        let had_url = self.url.take().is_some();
        self.updated_at = Some(Utc::now());
        had_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_trims_and_records_time() {
        let mut backdrop = Backdrop::new();
        backdrop.set("  uploads/1-stage.png ").unwrap();
        assert_eq!(backdrop.url.as_deref(), Some("uploads/1-stage.png"));
        assert!(backdrop.updated_at.is_some());
    }

    #[test]
    fn test_empty_url_rejected() {
        let mut backdrop = Backdrop::new();
        assert_eq!(backdrop.set("   "), Err(BackdropError::EmptyUrl));
        assert_eq!(backdrop, Backdrop::new());
    }

    #[test]
    fn test_clear() {
        let mut backdrop = Backdrop::new();
        assert!(!backdrop.clear());
        backdrop.set("blob:abc").unwrap();
        assert!(backdrop.clear());
        assert!(backdrop.url.is_none());
    }
}
