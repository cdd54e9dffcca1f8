//! Timestamp utilities
//!
//! Set positions are whole seconds from the start of a recording, written in
//! comments and descriptions as `M:SS`, `MM:SS` or `H:MM:SS`.

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a set timestamp literal to seconds
///
/// Accepts `M:SS`/`MM:SS` (minutes may exceed 59) and `H:MM:SS`/`HH:MM:SS`
/// (minutes and seconds both below 60). Seconds must always be below 60.
///
/// ```
/// use rork_common::time::parse_timestamp_literal;
///
/// assert_eq!(parse_timestamp_literal("4:32"), Some(272));
/// assert_eq!(parse_timestamp_literal("1:02:03"), Some(3723));
/// assert_eq!(parse_timestamp_literal("4:75"), None);
/// ```
pub fn parse_timestamp_literal(literal: &str) -> Option<u32> {
    let parts: Vec<&str> = literal.trim().split(':').collect();

    let numbers: Vec<u32> = parts
        .iter()
        .map(|p| {
            if p.is_empty() || p.len() > 2 || !p.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                p.parse::<u32>().ok()
            }
        })
        .collect::<Option<Vec<u32>>>()?;

    match numbers.as_slice() {
        [h, m, s] if *m < 60 && *s < 60 && parts[1].len() == 2 && parts[2].len() == 2 => {
            Some(h * 3600 + m * 60 + s)
        }
        [m, s] if *s < 60 && parts[1].len() == 2 => Some(m * 60 + s),
        _ => None,
    }
}

/// Format seconds as a set timestamp
///
/// `M:SS` below one hour, `H:MM:SS` from one hour on.
pub fn format_timestamp(seconds: u32) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}
