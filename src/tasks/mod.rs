//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod sampler;

// Re-export main types
pub use sampler::{spawn_sampler, SamplerHandle, TickOutcome};
