//! Data model for track identification
//!
//! - [`mention`]: parsed, not-yet-resolved candidates and their provenance
//! - [`canonical`]: long-lived artist and track records
//! - [`matching`]: tiered lookup results
//! - [`setlist`]: resolved output, conflicts and merge statistics

pub mod canonical;
pub mod matching;
pub mod mention;
pub mod setlist;

pub use canonical::{CanonicalArtist, CanonicalTrack, NewTrack};
pub use matching::{MatchResult, MatchType, ALIAS_CONFIDENCE, EXACT_CONFIDENCE};
pub use mention::{CommentRecord, MentionFragment, SourceKind, SourceRef, TrackMention};
pub use setlist::{MergeResult, Resolution, ResolvedTrack, Setlist, SetlistConflict};
