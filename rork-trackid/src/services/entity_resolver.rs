//! Entity Resolver
//!
//! Get-or-create semantics on top of the matchers.
//!
//! **Artist:** reuse the best match at or above `accept_threshold`, otherwise
//! create with a slug derived from the name and register the raw spelling as
//! an alias, so the next mention with that spelling is an alias hit. A create
//! that lands on an existing slug is reported as an alias match.
//!
//! **Track:** resolve the artist first and link it only at or above
//! `artist_link_threshold`; the artist name is denormalized onto the track
//! either way. Then the same reuse-or-create rule for the track itself. The
//! artist's `tracks_count` only moves when a track row was really inserted.
//!
//! No locks are held here. Concurrent resolutions of one new name rely on the
//! store's insert-or-return creates.

use crate::config::MatchingConfig;
use crate::models::{
    CanonicalArtist, CanonicalTrack, MatchResult, MatchType, NewTrack, Resolution, ResolvedTrack,
    TrackMention, ALIAS_CONFIDENCE,
};
use crate::services::entity_matcher::{ArtistMatcher, TrackMatcher};
use crate::services::mention_parser::split_remix_credit;
use crate::services::text_normalizer::{normalize, slugify};
use crate::store::{CanonicalStore, StoreResult};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Outcome of resolving an artist name
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistResolution {
    pub artist: CanonicalArtist,
    pub resolution: Resolution,
}

impl ArtistResolution {
    /// Match confidence; a freshly created artist is certain
    pub fn confidence(&self) -> f32 {
        match self.resolution {
            Resolution::Matched { confidence, .. } => confidence,
            Resolution::Created => 1.0,
            Resolution::Unresolved => 0.0,
        }
    }
}

/// Outcome of resolving one mention to a track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackResolution {
    pub track: CanonicalTrack,
    /// Linked artist (only when confident enough)
    pub artist: Option<CanonicalArtist>,
    pub resolution: Resolution,
}

/// Entity Resolver
pub struct EntityResolver {
    store: Arc<dyn CanonicalStore>,
    artists: ArtistMatcher,
    tracks: TrackMatcher,
    config: MatchingConfig,
}

impl EntityResolver {
    pub fn new(store: Arc<dyn CanonicalStore>, config: MatchingConfig) -> Self {
        Self {
            artists: ArtistMatcher::new(Arc::clone(&store), config.clone()),
            tracks: TrackMatcher::new(Arc::clone(&store), config.clone()),
            store,
            config,
        }
    }

    pub fn artist_matcher(&self) -> &ArtistMatcher {
        &self.artists
    }

    pub fn track_matcher(&self) -> &TrackMatcher {
        &self.tracks
    }

    /// Find or create the canonical artist for `name`
    pub async fn get_or_create_artist(&self, name: &str) -> StoreResult<ArtistResolution> {
        let name = name.trim();

        if let Some(hit) = self.artists.find(name).await {
            if hit.confidence >= self.config.accept_threshold {
                if hit.match_type == MatchType::Fuzzy {
                    self.remember_artist_spelling(hit.entity.id, name).await;
                }
                return Ok(matched(hit));
            }
            debug!(
                artist = %name,
                candidate = %hit.entity.name,
                confidence = hit.confidence,
                "Artist match below accept threshold, creating"
            );
        }

        let slug = match slugify(name) {
            slug if slug.is_empty() => Uuid::new_v4().simple().to_string(),
            slug => slug,
        };

        let created = self.store.create_artist(name, &slug).await?;
        self.store
            .upsert_artist_alias(created.id, name, &normalize(name))
            .await?;

        let resolution = if created.inserted {
            debug!(artist = %created.name, slug = %created.slug, artist_id = %created.id, "Artist created");
            Resolution::Created
        } else {
            debug!(
                artist = %name,
                existing = %created.name,
                slug = %created.slug,
                "Slug taken, reusing existing artist"
            );
            slug_hit()
        };

        Ok(ArtistResolution {
            artist: created.into_inner(),
            resolution,
        })
    }

    /// Resolve a mention to a canonical track, creating it if needed
    ///
    /// Artist and remix-artist failures only drop the link; a store failure on
    /// the track itself is returned.
    pub async fn resolve_track(&self, mention: &TrackMention) -> StoreResult<TrackResolution> {
        let artist = match self.get_or_create_artist(&mention.artist).await {
            Ok(resolved) if resolved.confidence() >= self.config.artist_link_threshold => {
                Some(resolved.artist)
            }
            Ok(resolved) => {
                debug!(
                    artist = %mention.artist,
                    confidence = resolved.confidence(),
                    "Artist not linked, below link threshold"
                );
                None
            }
            Err(e) => {
                warn!(artist = %mention.artist, error = %e, "Artist resolution failed, track left unlinked");
                None
            }
        };
        let artist_id = artist.as_ref().map(|a| a.id);

        if let Some(hit) = self.tracks.find(&mention.title, &mention.artist, artist_id).await {
            if hit.confidence >= self.config.accept_threshold {
                if hit.match_type == MatchType::Fuzzy {
                    self.remember_track_spelling(hit.entity.id, &mention.title).await;
                }
                self.count_usage(hit.entity.id).await;
                let resolution = Resolution::Matched {
                    match_type: hit.match_type,
                    confidence: hit.confidence,
                };
                return Ok(TrackResolution {
                    track: hit.entity,
                    artist,
                    resolution,
                });
            }
        }

        let (remix_artist_id, remix_type) = self.resolve_remix(mention.remix_info.as_deref()).await;

        let created = self
            .store
            .create_track(NewTrack {
                title: mention.title.clone(),
                artist_id,
                artist_name: mention.artist.clone(),
                remix_artist_id,
                remix_type,
                is_unreleased: mention.is_unreleased,
            })
            .await?;
        self.store
            .upsert_track_alias(created.id, &mention.title, &normalize(&mention.title))
            .await?;

        let resolution = if created.inserted {
            if let Some(id) = created.artist_id {
                if let Err(e) = self.store.increment_artist_tracks(id).await {
                    warn!(artist_id = %id, error = %e, "Failed to increment artist track count");
                }
            }
            debug!(
                title = %created.title(),
                artist = %created.artist_name,
                track_id = %created.id,
                linked = created.artist_id.is_some(),
                "Track created"
            );
            Resolution::Created
        } else {
            debug!(
                title = %mention.title,
                track_id = %created.id,
                "Track identity taken, reusing existing track"
            );
            slug_hit()
        };
        self.count_usage(created.id).await;

        Ok(TrackResolution {
            track: created.into_inner(),
            artist,
            resolution,
        })
    }

    /// Resolve a mention into a setlist entry, degrading store failures
    pub async fn resolve_mention(&self, mention: &TrackMention) -> ResolvedTrack {
        match self.resolve_track(mention).await {
            Ok(resolved) => ResolvedTrack {
                timestamp_seconds: mention.timestamp_seconds,
                title: resolved.track.title().to_string(),
                artist: resolved
                    .artist
                    .as_ref()
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| resolved.track.artist_name.clone()),
                confidence: mention.confidence,
                track_id: Some(resolved.track.id),
                artist_id: resolved.artist.as_ref().map(|a| a.id),
                resolution: resolved.resolution,
                provenance: mention.source_ref.clone(),
                is_unreleased: mention.is_unreleased || resolved.track.is_unreleased,
                remix_info: mention.remix_info.clone(),
            },
            Err(e) => {
                warn!(
                    title = %mention.title,
                    artist = %mention.artist,
                    error = %e,
                    "Store failure, mention left unresolved"
                );
                ResolvedTrack::unresolved(mention)
            }
        }
    }

    /// Remix artist id and type from a credit like `Chris Lake Remix`
    async fn resolve_remix(&self, remix_info: Option<&str>) -> (Option<Uuid>, Option<String>) {
        let Some(info) = remix_info else {
            return (None, None);
        };

        let (remixer, remix_type) = split_remix_credit(info);
        let Some(remixer) = remixer else {
            return (None, remix_type);
        };

        match self.get_or_create_artist(&remixer).await {
            Ok(resolved) if resolved.confidence() >= self.config.artist_link_threshold => {
                (Some(resolved.artist.id), remix_type)
            }
            Ok(_) => (None, remix_type),
            Err(e) => {
                warn!(remixer = %remixer, error = %e, "Remix artist resolution failed");
                (None, remix_type)
            }
        }
    }

    async fn remember_artist_spelling(&self, artist_id: Uuid, name: &str) {
        if let Err(e) = self
            .store
            .upsert_artist_alias(artist_id, name, &normalize(name))
            .await
        {
            warn!(artist = %name, error = %e, "Failed to register artist alias");
        }
    }

    async fn remember_track_spelling(&self, track_id: Uuid, title: &str) {
        if let Err(e) = self
            .store
            .upsert_track_alias(track_id, title, &normalize(title))
            .await
        {
            warn!(title = %title, error = %e, "Failed to register track alias");
        }
    }

    async fn count_usage(&self, track_id: Uuid) {
        if let Err(e) = self.store.increment_track_usage(track_id).await {
            warn!(track_id = %track_id, error = %e, "Failed to increment track usage");
        }
    }
}

/// An insert-or-return create that returned an existing row: the unique key
/// is a normalized form of the name, which is what an alias hit is
fn slug_hit() -> Resolution {
    Resolution::Matched {
        match_type: MatchType::Alias,
        confidence: ALIAS_CONFIDENCE,
    }
}

fn matched(hit: MatchResult<CanonicalArtist>) -> ArtistResolution {
    ArtistResolution {
        resolution: Resolution::Matched {
            match_type: hit.match_type,
            confidence: hit.confidence,
        },
        artist: hit.entity,
    }
}
