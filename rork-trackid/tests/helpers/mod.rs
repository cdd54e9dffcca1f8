//! Test Helper Utilities
//!
//! Shared utilities for rork-trackid integration tests

#![allow(dead_code)]

pub mod flaky_store;
pub mod log_capture;

pub use flaky_store::FlakyStore;
pub use log_capture::{capture_logs, LogCapture};

use rork_trackid::CommentRecord;

/// Description block used across the end-to-end tests
pub const SET_DESCRIPTION: &str = "0:00 Fisher - Losing It\n4:32 Meduza - Bad Memories";

/// Comments accompanying [`SET_DESCRIPTION`]: one ID request, one answer
pub fn set_comments() -> Vec<CommentRecord> {
    vec![
        CommentRecord::new("0:05 anyone know the ID?", 2, "curious_listener"),
        CommentRecord::new("12:45 CamelPhat - Cola", 14, "raver99"),
    ]
}
