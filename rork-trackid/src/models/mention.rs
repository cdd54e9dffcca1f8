//! Track mentions and their provenance

use serde::{Deserialize, Serialize};

/// Where a text block came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// The recording's description text
    Description,
    /// A platform comment
    Comment,
}

/// Audit reference back to the text block a mention was parsed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub kind: SourceKind,
    /// Platform comment id, if the fetcher supplied one
    pub id: Option<String>,
    pub author: String,
    pub endorsement_count: u32,
}

impl SourceRef {
    /// Reference for the description block
    pub fn description() -> Self {
        Self {
            kind: SourceKind::Description,
            id: None,
            author: String::new(),
            endorsement_count: 0,
        }
    }

    /// Reference for a comment block
    pub fn comment(record: &CommentRecord) -> Self {
        Self {
            kind: SourceKind::Comment,
            id: record.id.clone(),
            author: record.author.clone(),
            endorsement_count: record.endorsement_count,
        }
    }
}

/// One platform comment as handed over by a fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    /// Likes/upvotes on the comment
    #[serde(default)]
    pub endorsement_count: u32,
    #[serde(default)]
    pub author: String,
}

impl CommentRecord {
    pub fn new(text: impl Into<String>, endorsement_count: u32, author: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            endorsement_count,
            author: author.into(),
        }
    }
}

/// Title/artist split of one timestamped line, before scoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionFragment {
    pub title: String,
    pub artist: String,
    /// `feat.` credit split off the artist side
    pub featured_artist: Option<String>,
    /// Inner text of a remix/edit credit, e.g. `Chris Lake Remix`
    pub remix_info: Option<String>,
    pub is_unreleased: bool,
}

/// A parsed candidate track identification, not yet resolved
///
/// Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMention {
    pub timestamp_seconds: u32,
    pub title: String,
    pub artist: String,
    pub featured_artist: Option<String>,
    /// Confidence (0.0-1.0)
    pub confidence: f32,
    pub is_unreleased: bool,
    pub remix_info: Option<String>,
    pub source_ref: SourceRef,
}

impl TrackMention {
    /// Attach position, confidence and provenance to a parsed fragment
    pub fn from_fragment(
        fragment: MentionFragment,
        timestamp_seconds: u32,
        confidence: f32,
        source_ref: SourceRef,
    ) -> Self {
        Self {
            timestamp_seconds,
            title: fragment.title,
            artist: fragment.artist,
            featured_artist: fragment.featured_artist,
            confidence: confidence.clamp(0.0, 1.0),
            is_unreleased: fragment.is_unreleased,
            remix_info: fragment.remix_info,
            source_ref,
        }
    }
}
