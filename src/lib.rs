//! Stage Countdown - A countdown display server for live events
//!
//! This library provides a drift-free countdown engine controlled through a
//! hidden operator API, a display feed for full-screen renderers, and a small
//! upload relay for backdrop images.

pub mod api;
pub mod config;
pub mod services;
pub mod signals;
pub mod state;
pub mod tasks;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use services::UploadStore;
pub use state::{AppState, CountdownEngine, CountdownError, DisplaySnapshot, Phase};
pub use signals::shutdown_signal;
