//! Pipeline services
//!
//! Pure text stages (no I/O):
//! - [`text_normalizer`], [`similarity`]: comparison primitives
//! - [`timestamp_extractor`], [`mention_parser`], [`confidence_scorer`]: per-line parsing
//! - [`mention_set_builder`]: many text blocks → one deduplicated mention list
//!
//! Store-backed stages:
//! - [`entity_matcher`]: tiered exact/alias/fuzzy lookup
//! - [`entity_resolver`]: get-or-create on top of the matchers
//! - [`source_merger`]: folds a second source into a setlist
//!
//! Maintenance:
//! - [`catalog_cleanup`]: dry-run dedup and normalization plans

pub mod catalog_cleanup;
pub mod confidence_scorer;
pub mod entity_matcher;
pub mod entity_resolver;
pub mod mention_parser;
pub mod mention_set_builder;
pub mod similarity;
pub mod source_merger;
pub mod text_normalizer;
pub mod timestamp_extractor;

pub use confidence_scorer::{ConfidenceScorer, SourceSignal};
pub use entity_matcher::{ArtistMatcher, TrackMatcher};
pub use entity_resolver::{ArtistResolution, EntityResolver, TrackResolution};
pub use mention_parser::MentionParser;
pub use mention_set_builder::{MentionSetBuilder, TextBlock};
pub use similarity::similarity;
pub use source_merger::SourceMerger;
pub use text_normalizer::{normalize, slugify};
pub use timestamp_extractor::{extract_timestamps, TimestampMatch};
