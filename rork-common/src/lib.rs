//! # Rork Common Library
//!
//! Shared code for the Rork track-identification crates:
//! - Error type and result alias
//! - TOML configuration loading and logging configuration
//! - Tracing subscriber setup
//! - Set timestamp parsing and formatting

pub mod config;
pub mod error;
pub mod logging;
pub mod time;

pub use error::{Error, Result};
