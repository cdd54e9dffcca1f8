//! Entity Matcher
//!
//! Tiered lookup of a name or title against the canonical store:
//!
//! `Exact` (case-insensitive literal) → `Alias` (normalized alias table) →
//! `Fuzzy` (similarity over a bounded candidate pool, best above floor)
//!
//! The first tier with a hit is terminal. A store failure in any tier is
//! logged and treated as "no match" for that tier.

use crate::config::MatchingConfig;
use crate::models::{CanonicalArtist, CanonicalTrack, MatchResult};
use crate::services::similarity::similarity;
use crate::services::text_normalizer::normalize;
use crate::store::{CanonicalStore, StoreResult};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Run one tier, degrading a store error to "no match"
async fn run_tier<T, F>(tier: &'static str, input: &str, lookup: F) -> Option<MatchResult<T>>
where
    F: Future<Output = StoreResult<Option<MatchResult<T>>>>,
{
    match lookup.await {
        Ok(Some(hit)) => {
            debug!(
                tier,
                input = %input,
                matched_on = %hit.matched_on,
                confidence = hit.confidence,
                "Match tier hit"
            );
            Some(hit)
        }
        Ok(None) => None,
        Err(e) => {
            warn!(tier, input = %input, error = %e, "Store lookup failed, treating as no match");
            None
        }
    }
}

/// Artist matcher
pub struct ArtistMatcher {
    store: Arc<dyn CanonicalStore>,
    config: MatchingConfig,
}

impl ArtistMatcher {
    pub fn new(store: Arc<dyn CanonicalStore>, config: MatchingConfig) -> Self {
        Self { store, config }
    }

    /// Best match for an artist name, if any tier hits
    pub async fn find(&self, name: &str) -> Option<MatchResult<CanonicalArtist>> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        if let Some(hit) = run_tier("exact", name, self.exact(name)).await {
            return Some(hit);
        }
        if let Some(hit) = run_tier("alias", name, self.alias(name)).await {
            return Some(hit);
        }
        run_tier("fuzzy", name, self.fuzzy(name)).await
    }

    async fn exact(&self, name: &str) -> StoreResult<Option<MatchResult<CanonicalArtist>>> {
        Ok(self
            .store
            .find_artist_exact(name)
            .await?
            .map(|artist| MatchResult::exact(artist, name)))
    }

    async fn alias(&self, name: &str) -> StoreResult<Option<MatchResult<CanonicalArtist>>> {
        let normalized = normalize(name);
        if normalized.is_empty() {
            return Ok(None);
        }
        Ok(self
            .store
            .find_artist_alias(&normalized)
            .await?
            .map(|artist| MatchResult::alias(artist, normalized)))
    }

    async fn fuzzy(&self, name: &str) -> StoreResult<Option<MatchResult<CanonicalArtist>>> {
        let pool = self.store.scan_artists(self.config.candidate_pool_cap).await?;

        let mut best: Option<(CanonicalArtist, f32, String)> = None;
        for artist in pool {
            let (score, matched_on) = std::iter::once(artist.name.as_str())
                .chain(artist.aliases.iter().map(String::as_str))
                .map(|candidate| (similarity(name, candidate), candidate))
                .fold((0.0f32, ""), |acc, item| if item.0 > acc.0 { item } else { acc });

            let is_better = best.as_ref().map_or(true, |(_, top, _)| score > *top);
            if score >= self.config.artist_fuzzy_floor && is_better {
                let matched_on = matched_on.to_string();
                best = Some((artist, score, matched_on));
            }
        }

        Ok(best.map(|(artist, score, matched_on)| MatchResult::fuzzy(artist, score, matched_on)))
    }
}

/// Track matcher
///
/// Exact and alias hits must also fit the artist: the same linked artist id,
/// or the same normalized denormalized artist name.
pub struct TrackMatcher {
    store: Arc<dyn CanonicalStore>,
    config: MatchingConfig,
}

impl TrackMatcher {
    pub fn new(store: Arc<dyn CanonicalStore>, config: MatchingConfig) -> Self {
        Self { store, config }
    }

    /// Best match for a title by an artist, if any tier hits
    ///
    /// # Arguments
    /// * `artist_name` - Raw artist name from the mention
    /// * `artist_id` - Resolved artist, if the artist link succeeded
    pub async fn find(
        &self,
        title: &str,
        artist_name: &str,
        artist_id: Option<Uuid>,
    ) -> Option<MatchResult<CanonicalTrack>> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        if let Some(hit) = run_tier("exact", title, self.exact(title, artist_name, artist_id)).await {
            return Some(hit);
        }
        if let Some(hit) = run_tier("alias", title, self.alias(title, artist_name, artist_id)).await {
            return Some(hit);
        }
        run_tier("fuzzy", title, self.fuzzy(title, artist_name, artist_id)).await
    }

    async fn exact(
        &self,
        title: &str,
        artist_name: &str,
        artist_id: Option<Uuid>,
    ) -> StoreResult<Option<MatchResult<CanonicalTrack>>> {
        let candidates = self.store.find_tracks_exact(title, artist_id).await?;
        Ok(pick_artist_fit(candidates, artist_name, artist_id)
            .map(|track| MatchResult::exact(track, title)))
    }

    async fn alias(
        &self,
        title: &str,
        artist_name: &str,
        artist_id: Option<Uuid>,
    ) -> StoreResult<Option<MatchResult<CanonicalTrack>>> {
        let normalized = normalize(title);
        if normalized.is_empty() {
            return Ok(None);
        }
        let candidates = self.store.find_tracks_by_alias(&normalized, artist_id).await?;
        Ok(pick_artist_fit(candidates, artist_name, artist_id)
            .map(|track| MatchResult::alias(track, normalized)))
    }

    async fn fuzzy(
        &self,
        title: &str,
        artist_name: &str,
        artist_id: Option<Uuid>,
    ) -> StoreResult<Option<MatchResult<CanonicalTrack>>> {
        let pool = self
            .store
            .scan_tracks(self.config.candidate_pool_cap, artist_id)
            .await?;

        let title_weight = self.config.title_weight;
        let mut best: Option<(CanonicalTrack, f32)> = None;

        for track in pool {
            let score = title_weight * similarity(title, track.title())
                + (1.0 - title_weight) * similarity(artist_name, &track.artist_name);

            let is_better = best.as_ref().map_or(true, |(_, top)| score > *top);
            if score >= self.config.track_fuzzy_floor && is_better {
                best = Some((track, score));
            }
        }

        Ok(best.map(|(track, score)| {
            let matched_on = format!("{} - {}", track.artist_name, track.title());
            MatchResult::fuzzy(track, score, matched_on)
        }))
    }
}

/// First candidate fitting the artist (linked id, or same normalized name)
fn pick_artist_fit(
    candidates: Vec<CanonicalTrack>,
    artist_name: &str,
    artist_id: Option<Uuid>,
) -> Option<CanonicalTrack> {
    let artist_normalized = normalize(artist_name);
    candidates.into_iter().find(|track| {
        let linked = artist_id.is_some() && track.artist_id == artist_id;
        linked || track.artist_name_normalized == artist_normalized
    })
}
