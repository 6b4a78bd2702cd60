//! Mimic Common Utilities
//!
//! Shared infrastructure for all Mimic crates:
//! - Error types and result aliases
//! - Frame and session clocks for driving the rig
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
