//! Canonical artist and track records
//!
//! Long-lived entities owned by the canonical store. This crate only ever adds
//! aliases and increments counters; it never deletes an entity.

use crate::services::text_normalizer::normalize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Canonical artist
///
/// Invariant: `aliases` always contains the normalized form of `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalArtist {
    pub id: Uuid,
    pub name: String,
    /// URL-safe, globally unique
    pub slug: String,
    /// Normalized alias strings
    pub aliases: BTreeSet<String>,
    pub tracks_count: u32,
    pub sets_count: u32,
    pub created_at: DateTime<Utc>,
}

impl CanonicalArtist {
    /// Create a new artist record with its own normalized name as first alias
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        let name = name.into();
        let mut aliases = BTreeSet::new();
        aliases.insert(normalize(&name));

        Self {
            id: Uuid::new_v4(),
            name,
            slug: slug.into(),
            aliases,
            tracks_count: 0,
            sets_count: 0,
            created_at: rork_common::time::now(),
        }
    }

    /// Add a normalized alias; returns `false` if already present
    pub fn add_alias(&mut self, normalized_alias: &str) -> bool {
        if normalized_alias.is_empty() {
            return false;
        }
        self.aliases.insert(normalized_alias.to_string())
    }

    /// Popularity used to order fuzzy candidate pools
    pub fn popularity(&self) -> u32 {
        self.tracks_count.saturating_add(self.sets_count)
    }
}

/// Create request for a canonical track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrack {
    pub title: String,
    pub artist_id: Option<Uuid>,
    /// Always present, even when `artist_id` is unresolved
    pub artist_name: String,
    pub remix_artist_id: Option<Uuid>,
    pub remix_type: Option<String>,
    pub is_unreleased: bool,
}

impl NewTrack {
    pub fn title_normalized(&self) -> String {
        normalize(&self.title)
    }

    pub fn artist_name_normalized(&self) -> String {
        normalize(&self.artist_name)
    }
}

/// Canonical track
///
/// `title` and `title_normalized` are private so they can only change
/// together through [`CanonicalTrack::set_title`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTrack {
    pub id: Uuid,
    title: String,
    title_normalized: String,
    pub artist_id: Option<Uuid>,
    pub artist_name: String,
    pub artist_name_normalized: String,
    pub remix_artist_id: Option<Uuid>,
    pub remix_type: Option<String>,
    pub is_unreleased: bool,
    /// Number of set appearances resolved to this track
    pub times_played: u32,
    pub created_at: DateTime<Utc>,
}

impl CanonicalTrack {
    /// Build a track from a create request with a fresh id
    pub fn from_new(new: NewTrack) -> Self {
        Self::with_id(Uuid::new_v4(), new, rork_common::time::now())
    }

    /// Build a track with a known id and creation time (store read-back)
    pub fn with_id(id: Uuid, new: NewTrack, created_at: DateTime<Utc>) -> Self {
        let title_normalized = new.title_normalized();
        let artist_name_normalized = new.artist_name_normalized();

        Self {
            id,
            title: new.title,
            title_normalized,
            artist_id: new.artist_id,
            artist_name: new.artist_name,
            artist_name_normalized,
            remix_artist_id: new.remix_artist_id,
            remix_type: new.remix_type,
            is_unreleased: new.is_unreleased,
            times_played: 0,
            created_at,
        }
    }

    /// Rebuild a persisted track with its normalized columns as stored
    ///
    /// The stored values are kept even when they disagree with `normalize`, so
    /// maintenance can see the drift.
    pub fn from_stored(
        id: Uuid,
        new: NewTrack,
        title_normalized: String,
        artist_name_normalized: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title_normalized,
            artist_name_normalized,
            ..Self::with_id(id, new, created_at)
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn title_normalized(&self) -> &str {
        &self.title_normalized
    }

    /// Replace the title, recomputing its normalized form
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.title_normalized = normalize(&self.title);
    }

    /// Store-side identity key: normalized title + normalized artist name
    pub fn identity_key(&self) -> (&str, &str) {
        (&self.title_normalized, &self.artist_name_normalized)
    }
}
