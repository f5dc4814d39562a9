//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

use crate::state::{countdown::seconds_from_minutes, engine::MIN_TICK_INTERVAL, CountdownError};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "stage-countdown")]
#[command(about = "A drift-free countdown display server for live events")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Initial countdown duration in minutes
    #[arg(short, long, default_value = "5")]
    pub minutes: f64,

    /// Display refresh interval in milliseconds
    #[arg(long, default_value = "250")]
    pub tick_ms: u64,

    /// Directory where uploaded backdrop images are stored
    #[arg(long, default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Maximum accepted upload size in bytes
    #[arg(long, default_value = "10485760")]
    pub max_upload_bytes: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Sampler interval, never finer than the engine allows
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms).max(MIN_TICK_INTERVAL)
    }

    /// Initial duration in whole seconds
    pub fn initial_seconds(&self) -> Result<u64, CountdownError> {
        seconds_from_minutes(self.minutes)
    }
}
