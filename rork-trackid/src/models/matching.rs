//! Tiered match results

use serde::{Deserialize, Serialize};

/// Confidence reported for an exact name/title hit
pub const EXACT_CONFIDENCE: f32 = 1.0;

/// Confidence reported for a normalized alias hit
pub const ALIAS_CONFIDENCE: f32 = 0.95;

/// Which lookup tier produced a match
///
/// Tiers are strictly ordered: `Exact` before `Alias` before `Fuzzy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Alias,
    Fuzzy,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Alias => "alias",
            MatchType::Fuzzy => "fuzzy",
        }
    }
}

/// Result of looking up one name or title against the canonical store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult<T> {
    pub entity: T,
    /// Confidence (0.0-1.0)
    pub confidence: f32,
    pub match_type: MatchType,
    /// The literal string that matched, for audit
    pub matched_on: String,
}

impl<T> MatchResult<T> {
    pub fn exact(entity: T, matched_on: impl Into<String>) -> Self {
        Self {
            entity,
            confidence: EXACT_CONFIDENCE,
            match_type: MatchType::Exact,
            matched_on: matched_on.into(),
        }
    }

    pub fn alias(entity: T, matched_on: impl Into<String>) -> Self {
        Self {
            entity,
            confidence: ALIAS_CONFIDENCE,
            match_type: MatchType::Alias,
            matched_on: matched_on.into(),
        }
    }

    pub fn fuzzy(entity: T, score: f32, matched_on: impl Into<String>) -> Self {
        Self {
            entity,
            confidence: score.clamp(0.0, 1.0),
            match_type: MatchType::Fuzzy,
            matched_on: matched_on.into(),
        }
    }
}
