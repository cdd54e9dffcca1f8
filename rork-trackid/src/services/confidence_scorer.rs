//! Confidence Scorer
//!
//! Scores a mention from signals about the block it came from. Every signal
//! only ever adds to the base, so the score is monotonic in each input.

use crate::config::ScoringConfig;
use crate::models::SourceRef;

/// Author substrings that mark a dedicated identification account
const AUTHORITY_MARKERS: &[&str] = &["tracklist", "trackid"];

/// Signal describing a text block's source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSignal<'a> {
    pub endorsement_count: u32,
    pub author: &'a str,
}

impl<'a> From<&'a SourceRef> for SourceSignal<'a> {
    fn from(source: &'a SourceRef) -> Self {
        Self {
            endorsement_count: source.endorsement_count,
            author: &source.author,
        }
    }
}

/// Confidence Scorer
pub struct ConfidenceScorer {
    config: ScoringConfig,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl ConfidenceScorer {
    pub fn new(mut config: ScoringConfig) -> Self {
        // Highest threshold first so the first tier reached is the best one
        config
            .endorsement_tiers
            .sort_by(|a, b| b.min_count.cmp(&a.min_count));
        Self { config }
    }

    /// Number of timestamps that makes a block look like a tracklist
    pub fn tracklist_min_timestamps(&self) -> usize {
        self.config.tracklist_min_timestamps
    }

    /// Score one mention, clamped to 1.0
    pub fn score(&self, signal: SourceSignal<'_>, has_timestamp: bool, looks_like_tracklist: bool) -> f32 {
        let mut score = self.config.base;

        if has_timestamp {
            score += self.config.timestamp_bonus;
        }
        if looks_like_tracklist {
            score += self.config.tracklist_bonus;
        }

        score += self.endorsement_bonus(signal.endorsement_count);

        if is_authority(signal.author) {
            score += self.config.authority_bonus;
        }

        score.min(1.0)
    }

    fn endorsement_bonus(&self, count: u32) -> f32 {
        self.config
            .endorsement_tiers
            .iter()
            .find(|tier| count >= tier.min_count)
            .map(|tier| tier.bonus)
            .unwrap_or(0.0)
    }
}

fn is_authority(author: &str) -> bool {
    let author = author.to_lowercase();
    AUTHORITY_MARKERS.iter().any(|marker| author.contains(marker))
}
