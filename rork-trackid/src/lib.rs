//! # Rork Track Identification
//!
//! Turns crowd-sourced text attached to DJ set recordings (comments, video
//! descriptions) into a deduplicated, time-ordered list of track
//! identifications, and resolves each one against a canonical store of
//! artists and tracks.
//!
//! Pipeline:
//! 1. [`services::timestamp_extractor`] + [`services::mention_parser`]: raw text → candidate mentions
//! 2. [`services::confidence_scorer`]: per-mention confidence from source signals
//! 3. [`services::mention_set_builder`]: dedup and order across text blocks
//! 4. [`services::entity_resolver`]: get-or-create artists, then tracks
//! 5. [`services::source_merger`]: fold a second source into an existing setlist
//!
//! [`workflow::ImportSession`] wires the stages together around a caller-owned
//! [`store::CanonicalStore`].

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

pub use crate::config::TrackIdConfig;
pub use crate::error::{IdError, IdResult};
pub use crate::models::{
    CanonicalArtist, CanonicalTrack, CommentRecord, MatchResult, MatchType, MergeResult,
    ResolvedTrack, Setlist, SourceRef, TrackMention,
};
pub use crate::store::{CanonicalStore, InMemoryStore, StoreError, StoreResult, Upserted};
pub use crate::workflow::ImportSession;
