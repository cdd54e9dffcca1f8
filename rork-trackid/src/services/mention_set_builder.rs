//! Mention Set Builder
//!
//! Turns one description plus any number of comments into a single
//! deduplicated, time-ordered list of mentions.
//!
//! **Block order:** tracklist-shaped blocks first, then by endorsements
//! (descending). When two blocks disagree, the earlier block wins ties in the
//! dedup step, so this order is the preference order.

use crate::config::{MergeConfig, ParserConfig, ScoringConfig};
use crate::models::{CommentRecord, SourceRef, TrackMention};
use crate::services::confidence_scorer::{ConfidenceScorer, SourceSignal};
use crate::services::mention_parser::MentionParser;
use crate::services::text_normalizer::normalize;
use crate::services::timestamp_extractor::{extract_timestamps, TimestampMatch};
use std::cmp::Reverse;
use tracing::{debug, info};

/// Lines that must each carry a timestamp for line-by-line parsing
const LINE_MODE_MIN_LINES: usize = 3;

/// One text block and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub source_ref: SourceRef,
}

impl TextBlock {
    pub fn description(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_ref: SourceRef::description(),
        }
    }

    pub fn comment(record: &CommentRecord) -> Self {
        Self {
            text: record.text.clone(),
            source_ref: SourceRef::comment(record),
        }
    }
}

/// A block with its timestamps located
struct ScannedBlock {
    block: TextBlock,
    timestamps: Vec<TimestampMatch>,
}

impl ScannedBlock {
    fn is_tracklist(&self, min_timestamps: usize) -> bool {
        self.timestamps.len() >= min_timestamps
    }
}

/// Mention Set Builder
pub struct MentionSetBuilder {
    parser: MentionParser,
    scorer: ConfidenceScorer,
    dedup_window_secs: u32,
}

impl Default for MentionSetBuilder {
    fn default() -> Self {
        Self::new(
            ParserConfig::default(),
            ScoringConfig::default(),
            &MergeConfig::default(),
        )
    }
}

impl MentionSetBuilder {
    pub fn new(parser: ParserConfig, scoring: ScoringConfig, merge: &MergeConfig) -> Self {
        Self {
            parser: MentionParser::new(parser),
            scorer: ConfidenceScorer::new(scoring),
            dedup_window_secs: merge.dedup_window_secs,
        }
    }

    /// Build the mention set for one recording
    pub fn build(&self, description: Option<&str>, comments: &[CommentRecord]) -> Vec<TrackMention> {
        let blocks = description
            .filter(|text| !text.trim().is_empty())
            .map(TextBlock::description)
            .into_iter()
            .chain(comments.iter().map(TextBlock::comment))
            .collect();

        self.build_from_blocks(blocks)
    }

    /// Build the mention set from arbitrary text blocks
    pub fn build_from_blocks(&self, blocks: Vec<TextBlock>) -> Vec<TrackMention> {
        let block_count = blocks.len();
        let min_timestamps = self.scorer.tracklist_min_timestamps();

        let mut scanned: Vec<ScannedBlock> = blocks
            .into_iter()
            .map(|block| {
                let timestamps = extract_timestamps(&block.text);
                ScannedBlock { block, timestamps }
            })
            .filter(|scanned| !scanned.timestamps.is_empty())
            .collect();

        // Stable: equal keys keep input order
        scanned.sort_by_key(|s| {
            (
                Reverse(s.is_tracklist(min_timestamps)),
                Reverse(s.block.source_ref.endorsement_count),
            )
        });

        let candidates: Vec<TrackMention> = scanned
            .iter()
            .flat_map(|s| self.mentions_from_block(s, min_timestamps))
            .collect();
        let candidate_count = candidates.len();

        let mut mentions = dedup_mentions(candidates, self.dedup_window_secs);
        mentions.sort_by_key(|m| m.timestamp_seconds);

        info!(
            blocks = block_count,
            candidates = candidate_count,
            mentions = mentions.len(),
            "Built mention set"
        );

        mentions
    }

    fn mentions_from_block(&self, scanned: &ScannedBlock, min_timestamps: usize) -> Vec<TrackMention> {
        let looks_like_tracklist = scanned.is_tracklist(min_timestamps);
        let source = &scanned.block.source_ref;
        let confidence = self
            .scorer
            .score(SourceSignal::from(source), true, looks_like_tracklist);

        let segments = if timestamped_line_count(&scanned.block.text) >= LINE_MODE_MIN_LINES {
            line_segments(&scanned.block.text)
        } else {
            fallback_segments(&scanned.block.text, &scanned.timestamps)
        };

        segments
            .into_iter()
            .filter_map(|(seconds, text)| {
                let fragment = self.parser.parse(text)?;
                debug!(
                    timestamp = seconds,
                    title = %fragment.title,
                    artist = %fragment.artist,
                    confidence,
                    "Parsed mention"
                );
                Some(TrackMention::from_fragment(fragment, seconds, confidence, source.clone()))
            })
            .collect()
    }
}

fn timestamped_line_count(text: &str) -> usize {
    text.lines()
        .filter(|line| !extract_timestamps(line).is_empty())
        .count()
}

/// One segment per timestamped line
///
/// The segment is the first non-blank text following a timestamp on the line,
/// or the text before the first timestamp when nothing follows it.
fn line_segments(text: &str) -> Vec<(u32, &str)> {
    let mut segments = Vec::new();

    for line in text.lines() {
        let timestamps = extract_timestamps(line);
        let Some(first) = timestamps.first() else {
            continue;
        };

        let following = fallback_segments(line, &timestamps)
            .into_iter()
            .find(|(_, segment)| !is_blank_segment(segment));

        match following {
            Some(segment) => segments.push(segment),
            None => {
                let before = &line[..first.byte_offset];
                if !is_blank_segment(before) {
                    segments.push((first.seconds, before));
                }
            }
        }
    }

    segments
}

/// Text between consecutive timestamps, truncated at the first newline
fn fallback_segments<'a>(text: &'a str, timestamps: &[TimestampMatch]) -> Vec<(u32, &'a str)> {
    timestamps
        .iter()
        .enumerate()
        .map(|(i, ts)| {
            let end = timestamps
                .get(i + 1)
                .map(|next| next.byte_offset)
                .unwrap_or(text.len());
            let segment = &text[ts.byte_end..end];
            let segment = segment.split('\n').next().unwrap_or(segment);
            (ts.seconds, segment)
        })
        .collect()
}

fn is_blank_segment(segment: &str) -> bool {
    !segment.chars().any(|c| c.is_alphanumeric())
}

/// True when two title/artist pairs name the same track
///
/// Equal normalized titles, or one side's normalized `artist title` contains
/// the other's normalized title.
pub fn same_identity(a_title: &str, a_artist: &str, b_title: &str, b_artist: &str) -> bool {
    let a_norm = normalize(a_title);
    let b_norm = normalize(b_title);
    if a_norm.is_empty() || b_norm.is_empty() {
        return false;
    }
    if a_norm == b_norm {
        return true;
    }

    let a_full = normalize(&format!("{} {}", a_artist, a_title));
    let b_full = normalize(&format!("{} {}", b_artist, b_title));
    a_full.contains(&b_norm) || b_full.contains(&a_norm)
}

/// Timestamps within `window` seconds of each other
pub fn within_window(a: u32, b: u32, window: u32) -> bool {
    a.abs_diff(b) <= window
}

/// Collapse mentions of the same event, keeping the higher confidence
///
/// Ties keep the mention encountered first.
fn dedup_mentions(candidates: Vec<TrackMention>, window: u32) -> Vec<TrackMention> {
    let mut kept: Vec<TrackMention> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let existing = kept.iter().position(|m| {
            within_window(m.timestamp_seconds, candidate.timestamp_seconds, window)
                && same_identity(&m.title, &m.artist, &candidate.title, &candidate.artist)
        });

        match existing {
            Some(index) if candidate.confidence > kept[index].confidence => {
                debug!(
                    title = %candidate.title,
                    timestamp = candidate.timestamp_seconds,
                    "Duplicate mention replaced by higher confidence"
                );
                kept[index] = candidate;
            }
            Some(_) => {
                debug!(
                    title = %candidate.title,
                    timestamp = candidate.timestamp_seconds,
                    "Duplicate mention dropped"
                );
            }
            None => kept.push(candidate),
        }
    }

    kept
}
