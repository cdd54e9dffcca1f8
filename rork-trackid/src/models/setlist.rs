//! Resolved setlists and merge statistics

use crate::models::{MatchType, SourceRef, TrackMention};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a mention was resolved against the canonical store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    /// Linked to a pre-existing track
    Matched { match_type: MatchType, confidence: f32 },
    /// A new canonical track was created
    Created,
    /// Store unavailable for this mention; only denormalized fields are set
    Unresolved,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved)
    }
}

/// One setlist entry: a mention plus its (best-effort) resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrack {
    pub timestamp_seconds: u32,
    pub title: String,
    pub artist: String,
    /// Mention confidence (0.0-1.0)
    pub confidence: f32,
    pub track_id: Option<Uuid>,
    pub artist_id: Option<Uuid>,
    pub resolution: Resolution,
    pub provenance: SourceRef,
    pub is_unreleased: bool,
    pub remix_info: Option<String>,
}

impl ResolvedTrack {
    /// Entry carrying only the mention's own title/artist
    pub fn unresolved(mention: &TrackMention) -> Self {
        Self {
            timestamp_seconds: mention.timestamp_seconds,
            title: mention.title.clone(),
            artist: mention.artist.clone(),
            confidence: mention.confidence,
            track_id: None,
            artist_id: None,
            resolution: Resolution::Unresolved,
            provenance: mention.source_ref.clone(),
            is_unreleased: mention.is_unreleased,
            remix_info: mention.remix_info.clone(),
        }
    }
}

/// Two sources disagreeing about the track at one position
///
/// Both entries stay in the setlist until something outside this crate
/// (e.g. user voting) arbitrates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetlistConflict {
    pub timestamp_seconds: u32,
    pub existing: ResolvedTrack,
    pub incoming: ResolvedTrack,
}

/// Time-ordered resolved tracks for one set recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Setlist {
    pub tracks: Vec<ResolvedTrack>,
    pub conflicts: Vec<SetlistConflict>,
}

impl Setlist {
    pub fn new(mut tracks: Vec<ResolvedTrack>) -> Self {
        tracks.sort_by_key(|t| t.timestamp_seconds);
        Self {
            tracks,
            conflicts: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Insert keeping timestamp order (after any entries at the same second)
    pub fn insert(&mut self, track: ResolvedTrack) {
        let pos = self
            .tracks
            .partition_point(|t| t.timestamp_seconds <= track.timestamp_seconds);
        self.tracks.insert(pos, track);
    }

    pub fn titles(&self) -> Vec<&str> {
        self.tracks.iter().map(|t| t.title.as_str()).collect()
    }
}

/// Outcome of folding a secondary source into an existing setlist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    /// Incoming mentions that matched a track already in the setlist
    pub matched: u32,
    /// Incoming mentions inserted as new setlist entries
    pub new_from_secondary: u32,
    /// Incoming mentions that disagree with an existing entry in the same window
    pub conflicts_created: u32,
}

impl MergeResult {
    pub fn total(&self) -> u32 {
        self.matched + self.new_from_secondary + self.conflicts_created
    }

    /// One-line summary for display
    pub fn summary(&self) -> String {
        format!(
            "{} matched, {} new, {} conflict{}",
            self.matched,
            self.new_from_secondary,
            self.conflicts_created,
            if self.conflicts_created == 1 { "" } else { "s" }
        )
    }
}
