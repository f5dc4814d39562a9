//! Countdown state machine and the pure display math derived from it
//!
//! Every time-dependent operation takes `now` as epoch milliseconds so the
//! state machine can be driven by any clock, real or simulated.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Largest duration accepted by `configure`, in seconds
pub const MAX_TOTAL_SECONDS: u64 = u32::MAX as u64;

/// Coarse run state of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Expired,
}

impl Phase {
    /// Lowercase name used in API responses and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Paused => "paused",
            Phase::Expired => "expired",
        }
    }
}

/// Rejected operator actions
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CountdownError {
    /// Duration was non-positive, non-finite, rounded to zero seconds or too large
    #[error("Invalid duration: {0} minutes")]
    InvalidDuration(f64),

    /// Start requested with no time left on the clock
    #[error("Nothing to start")]
    NothingToStart,

    /// A new duration was set while the countdown was running
    #[error("Countdown is running; pause or reset it before setting a new duration")]
    StillRunning,
}

/// Convert an operator-entered duration in minutes into whole seconds
pub fn seconds_from_minutes(minutes: f64) -> Result<u64, CountdownError> {
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(CountdownError::InvalidDuration(minutes));
    }

    let seconds = (minutes * 60.0).round();
    if seconds < 1.0 || seconds > MAX_TOTAL_SECONDS as f64 {
        return Err(CountdownError::InvalidDuration(minutes));
    }

    Ok(seconds as u64)
}

/// Whole seconds between `now` and `target`, rounded to nearest and clamped at zero
pub fn remaining_from_target(target_epoch_millis: i64, now_epoch_millis: i64) -> u64 {
    let delta = target_epoch_millis.saturating_sub(now_epoch_millis);
    if delta <= 0 {
        return 0;
    }
    (delta.saturating_add(500) / 1000) as u64
}

/// Fraction of the configured duration still remaining, in `0.0..=1.0`
pub fn progress_fraction(remaining_seconds: u64, total_seconds: u64) -> f64 {
    if total_seconds == 0 {
        return 0.0;
    }
    (remaining_seconds as f64 / total_seconds as f64).clamp(0.0, 1.0)
}

/// Whether the countdown is in its last quarter and should show a warning
pub fn is_in_final_quarter(remaining_seconds: u64, total_seconds: u64) -> bool {
    remaining_seconds > 0 && remaining_seconds <= total_seconds.div_ceil(4)
}

/// Format seconds as `HH:MM:SS`; the hours field grows past two digits as needed
pub fn format_hms(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Everything a display surface needs to render one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub remaining_seconds: u64,
    pub total_seconds: u64,
    pub phase: Phase,
    pub progress_fraction: f64,
    pub is_in_final_quarter: bool,
    pub formatted: String,
}

/// Authoritative countdown state
///
/// While `Running`, `remaining_seconds` is only a cache of the last sample;
/// the truth is `target_epoch_millis`. In every other phase there is no
/// target and `remaining_seconds` is authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct CountdownState {
    remaining_seconds: u64,
    target_epoch_millis: Option<i64>,
    total_seconds: u64,
    phase: Phase,
    holding: bool,
}

impl CountdownState {
    /// Create an idle countdown with the given duration
    pub fn new(total_seconds: u64) -> Self {
        let total_seconds = total_seconds.clamp(1, MAX_TOTAL_SECONDS);
        Self {
            remaining_seconds: total_seconds,
            target_epoch_millis: None,
            total_seconds,
            phase: Phase::Idle,
            holding: false,
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn target_epoch_millis(&self) -> Option<i64> {
        self.target_epoch_millis
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Whether the display is frozen because the clock went backwards
    #[cfg(test)]
    pub fn is_holding(&self) -> bool {
        self.holding
    }

    /// Set a new duration and return to `Idle`
    ///
    /// # Errors
    ///
    /// `InvalidDuration` for unusable input, `StillRunning` while running.
    /// The state is untouched on error.
    pub fn configure(&mut self, minutes: f64) -> Result<(), CountdownError> {
        let seconds = seconds_from_minutes(minutes)?;
        if self.is_running() {
            return Err(CountdownError::StillRunning);
        }

        self.total_seconds = seconds;
        self.remaining_seconds = seconds;
        self.target_epoch_millis = None;
        self.phase = Phase::Idle;
        self.holding = false;
        info!("Countdown configured to {}s", seconds);
        Ok(())
    }

    /// Begin counting down from the current remaining time
    ///
    /// Starting an already running countdown keeps its target untouched.
    ///
    /// # Errors
    ///
    /// `NothingToStart` when no time is left.
    pub fn start(&mut self, now: i64) -> Result<(), CountdownError> {
        if self.is_running() {
            debug!("Start requested while running, keeping current target");
            return Ok(());
        }
        if self.remaining_seconds == 0 {
            return Err(CountdownError::NothingToStart);
        }

        self.arm(now);
        info!("Countdown started with {}s remaining", self.remaining_seconds);
        Ok(())
    }

    /// Freeze the remaining time; returns false when not running
    pub fn pause(&mut self, now: i64) -> bool {
        if !self.is_running() {
            return false;
        }

        self.sample(now);
        if self.phase == Phase::Running {
            self.target_epoch_millis = None;
            self.phase = Phase::Paused;
            self.holding = false;
            info!("Countdown paused at {}s", self.remaining_seconds);
        }
        true
    }

    /// Continue a paused countdown; returns false when there is nothing to resume
    pub fn resume(&mut self, now: i64) -> bool {
        if self.phase != Phase::Paused || self.remaining_seconds == 0 {
            return false;
        }

        self.arm(now);
        info!("Countdown resumed with {}s remaining", self.remaining_seconds);
        true
    }

    /// Zero the clock and return to `Idle`
    pub fn reset(&mut self) {
        self.remaining_seconds = 0;
        self.target_epoch_millis = None;
        self.phase = Phase::Idle;
        self.holding = false;
        info!("Countdown reset");
    }

    /// Recompute the remaining time from the target and expire at zero
    ///
    /// The value never increases while running: if the wall clock stepped
    /// backwards the last sample is kept instead.
    pub fn sample(&mut self, now: i64) -> Phase {
        let Some(target) = self.target_epoch_millis else {
            return self.phase;
        };

        let computed = remaining_from_target(target, now);
        if computed > self.remaining_seconds {
            if self.holding {
                debug!("Still holding at {}s (sampled {}s)", self.remaining_seconds, computed);
            } else {
                warn!(
                    "Clock moved backwards (sampled {}s, last {}s), holding display",
                    computed, self.remaining_seconds
                );
                self.holding = true;
            }
        } else {
            if self.holding {
                info!("Clock caught up, display released at {}s", computed);
                self.holding = false;
            }
            self.remaining_seconds = computed;
        }

        if self.remaining_seconds == 0 {
            self.target_epoch_millis = None;
            self.phase = Phase::Expired;
            info!("Countdown expired");
        }

        self.phase
    }

    /// Derive the values a display renders from the current state
    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            remaining_seconds: self.remaining_seconds,
            total_seconds: self.total_seconds,
            phase: self.phase,
            progress_fraction: progress_fraction(self.remaining_seconds, self.total_seconds),
            is_in_final_quarter: is_in_final_quarter(self.remaining_seconds, self.total_seconds),
            formatted: format_hms(self.remaining_seconds),
        }
    }

    fn arm(&mut self, now: i64) {
        let span = (self.remaining_seconds as i64).saturating_mul(1000);
        self.target_epoch_millis = Some(now.saturating_add(span));
        self.phase = Phase::Running;
        self.holding = false;
    }
}
