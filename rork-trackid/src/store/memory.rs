//! In-memory canonical store
//!
//! All state sits behind one tokio `RwLock`; every create/upsert checks its
//! unique key and inserts under the same write guard, which makes it an
//! atomic insert-or-return.

use super::{in_artist_scope, CanonicalStore, StoreError, StoreResult, Upserted};
use crate::models::{CanonicalArtist, CanonicalTrack, NewTrack};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    artists: HashMap<Uuid, CanonicalArtist>,
    /// slug → artist
    slugs: HashMap<String, Uuid>,
    /// normalized alias → artist (globally unique)
    artist_aliases: HashMap<String, Uuid>,
    tracks: HashMap<Uuid, CanonicalTrack>,
    /// (title_normalized, artist_name_normalized) → track
    track_identities: HashMap<(String, String), Uuid>,
    /// normalized title alias → tracks
    track_aliases: HashMap<String, BTreeSet<Uuid>>,
}

/// Process-local canonical store
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn artist_count(&self) -> usize {
        self.inner.read().await.artists.len()
    }

    pub async fn track_count(&self) -> usize {
        self.inner.read().await.tracks.len()
    }

    /// Snapshot of every artist, oldest first
    pub async fn artists(&self) -> Vec<CanonicalArtist> {
        let inner = self.inner.read().await;
        let mut artists: Vec<CanonicalArtist> = inner.artists.values().cloned().collect();
        artists.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        artists
    }

    /// Snapshot of every track, oldest first
    pub async fn tracks(&self) -> Vec<CanonicalTrack> {
        let inner = self.inner.read().await;
        let mut tracks: Vec<CanonicalTrack> = inner.tracks.values().cloned().collect();
        tracks.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.title().cmp(b.title()))
        });
        tracks
    }

    pub async fn get_artist(&self, id: Uuid) -> Option<CanonicalArtist> {
        self.inner.read().await.artists.get(&id).cloned()
    }

    pub async fn get_track(&self, id: Uuid) -> Option<CanonicalTrack> {
        self.inner.read().await.tracks.get(&id).cloned()
    }
}

fn by_popularity(artists: &mut [CanonicalArtist]) {
    artists.sort_by(|a, b| {
        b.popularity()
            .cmp(&a.popularity())
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn by_times_played(tracks: &mut [CanonicalTrack]) {
    tracks.sort_by(|a, b| {
        b.times_played
            .cmp(&a.times_played)
            .then_with(|| a.title().cmp(b.title()))
    });
}

#[async_trait]
impl CanonicalStore for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_artist_exact(&self, name: &str) -> StoreResult<Option<CanonicalArtist>> {
        let wanted = name.trim().to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .artists
            .values()
            .filter(|a| a.name.to_lowercase() == wanted)
            .min_by_key(|a| a.created_at)
            .cloned())
    }

    async fn find_artist_alias(&self, normalized: &str) -> StoreResult<Option<CanonicalArtist>> {
        let inner = self.inner.read().await;
        Ok(inner
            .artist_aliases
            .get(normalized)
            .and_then(|id| inner.artists.get(id))
            .cloned())
    }

    async fn scan_artists(&self, limit: usize) -> StoreResult<Vec<CanonicalArtist>> {
        let inner = self.inner.read().await;
        let mut artists: Vec<CanonicalArtist> = inner.artists.values().cloned().collect();
        by_popularity(&mut artists);
        artists.truncate(limit);
        Ok(artists)
    }

    async fn create_artist(&self, name: &str, slug: &str) -> StoreResult<Upserted<CanonicalArtist>> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.slugs.get(slug).and_then(|id| inner.artists.get(id)) {
            tracing::debug!(slug, artist_id = %existing.id, "Slug exists, returning existing artist");
            return Ok(Upserted::existing(existing.clone()));
        }

        let artist = CanonicalArtist::new(name, slug);
        inner.slugs.insert(artist.slug.clone(), artist.id);
        for alias in &artist.aliases {
            inner.artist_aliases.entry(alias.clone()).or_insert(artist.id);
        }
        inner.artists.insert(artist.id, artist.clone());

        Ok(Upserted::inserted(artist))
    }

    async fn upsert_artist_alias(
        &self,
        artist_id: Uuid,
        _alias: &str,
        normalized: &str,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;

        if !inner.artists.contains_key(&artist_id) {
            return Err(StoreError::Corrupt(format!("Alias for unknown artist {}", artist_id)));
        }
        if normalized.is_empty() || inner.artist_aliases.contains_key(normalized) {
            return Ok(());
        }

        inner.artist_aliases.insert(normalized.to_string(), artist_id);
        if let Some(artist) = inner.artists.get_mut(&artist_id) {
            artist.add_alias(normalized);
        }
        Ok(())
    }

    async fn increment_artist_tracks(&self, artist_id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(artist) = inner.artists.get_mut(&artist_id) {
            artist.tracks_count = artist.tracks_count.saturating_add(1);
        }
        Ok(())
    }

    async fn find_tracks_exact(
        &self,
        title: &str,
        artist_id: Option<Uuid>,
    ) -> StoreResult<Vec<CanonicalTrack>> {
        let wanted = title.trim().to_lowercase();
        let inner = self.inner.read().await;
        let mut tracks: Vec<CanonicalTrack> = inner
            .tracks
            .values()
            .filter(|t| t.title().to_lowercase() == wanted && in_artist_scope(t, artist_id))
            .cloned()
            .collect();
        by_times_played(&mut tracks);
        Ok(tracks)
    }

    async fn find_tracks_by_alias(
        &self,
        normalized_title: &str,
        artist_id: Option<Uuid>,
    ) -> StoreResult<Vec<CanonicalTrack>> {
        let inner = self.inner.read().await;
        let mut tracks: Vec<CanonicalTrack> = inner
            .track_aliases
            .get(normalized_title)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.tracks.get(id))
            .filter(|t| in_artist_scope(t, artist_id))
            .cloned()
            .collect();
        by_times_played(&mut tracks);
        Ok(tracks)
    }

    async fn scan_tracks(
        &self,
        limit: usize,
        artist_id: Option<Uuid>,
    ) -> StoreResult<Vec<CanonicalTrack>> {
        let inner = self.inner.read().await;
        let mut tracks: Vec<CanonicalTrack> = inner
            .tracks
            .values()
            .filter(|t| in_artist_scope(t, artist_id))
            .cloned()
            .collect();
        by_times_played(&mut tracks);
        tracks.truncate(limit);
        Ok(tracks)
    }

    async fn create_track(&self, track: NewTrack) -> StoreResult<Upserted<CanonicalTrack>> {
        let key = (track.title_normalized(), track.artist_name_normalized());
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.track_identities.get(&key).and_then(|id| inner.tracks.get(id)) {
            return Ok(Upserted::existing(existing.clone()));
        }

        let track = CanonicalTrack::from_new(track);
        inner.track_identities.insert(key, track.id);
        inner.tracks.insert(track.id, track.clone());
        Ok(Upserted::inserted(track))
    }

    async fn upsert_track_alias(
        &self,
        track_id: Uuid,
        _alias: &str,
        normalized: &str,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;

        if !inner.tracks.contains_key(&track_id) {
            return Err(StoreError::Corrupt(format!("Alias for unknown track {}", track_id)));
        }
        if !normalized.is_empty() {
            inner
                .track_aliases
                .entry(normalized.to_string())
                .or_default()
                .insert(track_id);
        }
        Ok(())
    }

    async fn increment_track_usage(&self, track_id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(track) = inner.tracks.get_mut(&track_id) {
            track.times_played = track.times_played.saturating_add(1);
        }
        Ok(())
    }
}
