//! # Loopfade Common Library
//!
//! Shared code for the loopfade binaries including:
//! - Error types
//! - Configuration file discovery and TOML loading
//! - Human-readable duration formatting for log output

pub mod config;
pub mod error;
pub mod human_time;

pub use error::{Error, Result};
