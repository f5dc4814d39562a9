//! Main application state management

use std::{
    sync::{Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::info;

use super::{Backdrop, BackdropError, CountdownEngine};
use crate::services::UploadStore;

/// Shared state behind every request handler
#[derive(Debug)]
pub struct AppState {
    /// The one countdown this server displays
    pub countdown: CountdownEngine,
    /// Backdrop behind the countdown
    pub backdrop: Mutex<Backdrop>,
    /// Storage for the upload relay
    pub uploads: UploadStore,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(port: u16, host: String, countdown: CountdownEngine, uploads: UploadStore) -> Self {
        Self {
            countdown,
            backdrop: Mutex::new(Backdrop::new()),
            uploads,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    /// Remember the last operator action for the status endpoint
    pub fn record_action(&self, action: &str) {
        *lock(&self.last_action) = Some(action.to_string());
        *lock(&self.last_action_time) = Some(Utc::now());
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        (lock(&self.last_action).clone(), *lock(&self.last_action_time))
    }

    pub fn get_backdrop(&self) -> Backdrop {
        lock(&self.backdrop).clone()
    }

    pub fn set_backdrop(&self, url: &str) -> Result<Backdrop, BackdropError> {
        let mut backdrop = lock(&self.backdrop);
        backdrop.set(url)?;
        info!("Backdrop set to {}", url.trim());
        Ok(backdrop.clone())
    }

    pub fn clear_backdrop(&self) -> Backdrop {
        let mut backdrop = lock(&self.backdrop);
        if backdrop.clear() {
            info!("Backdrop cleared");
        }
        backdrop.clone()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Tear down background work; the server calls this once on exit
    pub fn shutdown(&self) {
        self.countdown.shutdown();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
