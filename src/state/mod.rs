//! State management module
//!
//! This module contains the countdown state machine, the engine that drives
//! it, and the shared application state.

pub mod app_state;
pub mod backdrop;
pub mod clock;
pub mod countdown;
pub mod engine;

// Re-export main types
pub use app_state::AppState;
pub use backdrop::{Backdrop, BackdropError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use countdown::{
    format_hms, is_in_final_quarter, progress_fraction, CountdownError, CountdownState,
    DisplaySnapshot, Phase,
};
pub use engine::CountdownEngine;
