//! Timestamp extraction
//!
//! **Algorithm:**
//! 1. Scan for long-form `H:MM:SS` / `HH:MM:SS` literals
//! 2. Scan for short-form `M:SS` / `MM:SS` literals
//! 3. Drop short matches that start inside a long match or within 3 bytes
//!    after its end (the `MM:SS` tail of `H:MM:SS`)
//! 4. Merge and order by byte offset
//!
//! Long form must be scanned first: scanning short form alone produces
//! phantom matches inside long literals.

use once_cell::sync::Lazy;
use regex::Regex;
use rork_common::time::parse_timestamp_literal;

static LONG_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}:\d{2}:\d{2}\b").expect("valid regex"));
static SHORT_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}:\d{2}\b").expect("valid regex"));

/// Bytes after a long match in which a short match is still its tail
const LONG_TAIL_GUARD: usize = 3;

/// One timestamp literal found in a text block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampMatch {
    /// Position in seconds
    pub seconds: u32,
    /// The literal as written, e.g. `1:02:03`
    pub literal: String,
    /// Byte offset of the literal's first character
    pub byte_offset: usize,
    /// Byte offset one past the literal's last character
    pub byte_end: usize,
}

/// Find all timestamp literals in `text`
///
/// Returns matches ordered by `byte_offset` with no overlaps. Literals with
/// out-of-range fields (`4:75`, `1:60:00`) are skipped.
pub fn extract_timestamps(text: &str) -> Vec<TimestampMatch> {
    let mut matches: Vec<TimestampMatch> = LONG_FORM
        .find_iter(text)
        .filter_map(|m| to_match(m.as_str(), m.start(), m.end()))
        .collect();

    let long_spans: Vec<(usize, usize)> = LONG_FORM
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();

    for m in SHORT_FORM.find_iter(text) {
        let shadowed = long_spans
            .iter()
            .any(|&(start, end)| m.start() >= start && m.start() < end + LONG_TAIL_GUARD);
        if shadowed {
            continue;
        }
        if let Some(found) = to_match(m.as_str(), m.start(), m.end()) {
            matches.push(found);
        }
    }

    matches.sort_by_key(|m| m.byte_offset);
    matches
}

fn to_match(literal: &str, start: usize, end: usize) -> Option<TimestampMatch> {
    let seconds = parse_timestamp_literal(literal)?;
    Some(TimestampMatch {
        seconds,
        literal: literal.to_string(),
        byte_offset: start,
        byte_end: end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_short_timestamps_not_three() {
        let text = "intro 0:45 Fisher - Losing It 4:32 Meduza - Bad Memories";
        let found = extract_timestamps(text);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].seconds, 45);
        assert_eq!(found[0].literal, "0:45");
        assert_eq!(found[0].byte_offset, 6);
        assert_eq!(found[1].seconds, 272);
        assert_eq!(found[1].literal, "4:32");
        assert_eq!(found[1].byte_offset, 30);
        assert_eq!(&text[found[1].byte_offset..found[1].byte_end], "4:32");
    }

    #[test]
    fn test_long_form_not_double_counted() {
        let found = extract_timestamps("1:02:03 Tiga - Shoes\n1:05:30 Adam Beyer - Your Mind");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].seconds, 3723);
        assert_eq!(found[0].literal, "1:02:03");
        assert_eq!(found[1].seconds, 3930);
    }

    #[test]
    fn test_mixed_forms_ordered() {
        let text = "58:10 first 59:59 second 1:00:30 third";
        let found = extract_timestamps(text);

        let seconds: Vec<u32> = found.iter().map(|m| m.seconds).collect();
        assert_eq!(seconds, vec![3490, 3599, 3630]);
        assert!(found.windows(2).all(|w| w[0].byte_end <= w[1].byte_offset));
    }

    #[test]
    fn test_short_right_after_long_is_suppressed() {
        // A short literal starting within 3 bytes of a long literal's end
        let found = extract_timestamps("1:00:00 2:00");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].seconds, 3600);
    }

    #[test]
    fn test_invalid_fields_skipped() {
        assert!(extract_timestamps("score was 4:75 tonight").is_empty());
        assert!(extract_timestamps("no times here").is_empty());
        // Word characters glued to the digits are not timestamps
        assert!(extract_timestamps("x12:30pm").is_empty());
    }

    #[test]
    fn test_unicode_text_offsets_are_bytes() {
        let text = "🔥 3:15 Björk - Army Of Me";
        let found = extract_timestamps(text);
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].byte_offset..found[0].byte_end], "3:15");
    }
}
