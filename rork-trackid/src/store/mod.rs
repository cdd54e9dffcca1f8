//! Canonical store abstraction
//!
//! The matchers and resolvers only ever see this trait. Implementations must
//! make every create/upsert an atomic "insert or return existing" keyed on
//! the unique key named below, so concurrent resolvers never need a lock of
//! their own.
//!
//! - [`InMemoryStore`]: process-local store for tests and short-lived sessions
//! - [`crate::db::SqliteStore`]: sqlx-backed SQLite adapter

mod memory;

pub use memory::InMemoryStore;

use crate::models::{CanonicalArtist, CanonicalTrack, NewTrack};
use async_trait::async_trait;
use std::ops::Deref;
use thiserror::Error;
use uuid::Uuid;

/// Canonical store error
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Gave up waiting (lock contention, slow backend)
    #[error("Store operation '{operation}' timed out after {waited_ms} ms")]
    Timeout { operation: String, waited_ms: u64 },

    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be mapped to a canonical record
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Row returned by an insert-or-return create
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<T> {
    pub entity: T,
    /// `false` when the unique key already existed and that row came back
    pub inserted: bool,
}

impl<T> Upserted<T> {
    pub fn inserted(entity: T) -> Self {
        Self {
            entity,
            inserted: true,
        }
    }

    pub fn existing(entity: T) -> Self {
        Self {
            entity,
            inserted: false,
        }
    }

    pub fn into_inner(self) -> T {
        self.entity
    }
}

impl<T> Deref for Upserted<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entity
    }
}

/// Canonical artist/track store
///
/// Lookups by name/title are case-insensitive. Track lookups take an optional
/// `artist_id`; when given, only tracks linked to that artist or to no artist
/// are returned.
#[async_trait]
pub trait CanonicalStore: Send + Sync {
    /// Reachability check made once at batch start
    async fn ping(&self) -> StoreResult<()>;

    /// Artist whose name equals `name` case-insensitively
    async fn find_artist_exact(&self, name: &str) -> StoreResult<Option<CanonicalArtist>>;

    /// Artist owning the normalized alias
    async fn find_artist_alias(&self, normalized: &str) -> StoreResult<Option<CanonicalArtist>>;

    /// Fuzzy candidate pool, most popular first
    async fn scan_artists(&self, limit: usize) -> StoreResult<Vec<CanonicalArtist>>;

    /// Create an artist; returns the existing artist on slug collision
    async fn create_artist(&self, name: &str, slug: &str) -> StoreResult<Upserted<CanonicalArtist>>;

    /// Register an alias; no-op if the normalized alias already exists
    async fn upsert_artist_alias(
        &self,
        artist_id: Uuid,
        alias: &str,
        normalized: &str,
    ) -> StoreResult<()>;

    async fn increment_artist_tracks(&self, artist_id: Uuid) -> StoreResult<()>;

    /// Tracks whose title equals `title` case-insensitively
    async fn find_tracks_exact(
        &self,
        title: &str,
        artist_id: Option<Uuid>,
    ) -> StoreResult<Vec<CanonicalTrack>>;

    /// Tracks owning the normalized title alias
    async fn find_tracks_by_alias(
        &self,
        normalized_title: &str,
        artist_id: Option<Uuid>,
    ) -> StoreResult<Vec<CanonicalTrack>>;

    /// Fuzzy candidate pool, most played first
    async fn scan_tracks(
        &self,
        limit: usize,
        artist_id: Option<Uuid>,
    ) -> StoreResult<Vec<CanonicalTrack>>;

    /// Create a track; returns the existing track with the same
    /// `(title_normalized, artist_name_normalized)`
    async fn create_track(&self, track: NewTrack) -> StoreResult<Upserted<CanonicalTrack>>;

    /// Register a title alias; no-op if `(track_id, normalized)` exists
    async fn upsert_track_alias(
        &self,
        track_id: Uuid,
        alias: &str,
        normalized: &str,
    ) -> StoreResult<()>;

    async fn increment_track_usage(&self, track_id: Uuid) -> StoreResult<()>;
}

/// Track visible under an optional artist scope
pub(crate) fn in_artist_scope(track: &CanonicalTrack, artist_id: Option<Uuid>) -> bool {
    match (artist_id, track.artist_id) {
        (None, _) => true,
        (Some(_), None) => true,
        (Some(wanted), Some(linked)) => wanted == linked,
    }
}
