//! Catalog Cleanup Planning
//!
//! Dry-run plans over snapshots of the canonical catalog. Nothing here writes
//! to a store; an external maintenance job applies the plan.
//!
//! **Plans:**
//! - Duplicate artists (same normalized name) and which one to keep
//! - Duplicate tracks (same normalized title + artist name) and which one to keep
//! - Tracks whose stored `title_normalized` drifted from `normalize(title)`
//! - Artist names with stray punctuation, extra whitespace or ALL CAPS
//! - Artists whose denormalized `tracks_count` disagrees with the track table

use crate::models::{CanonicalArtist, CanonicalTrack};
use crate::services::text_normalizer::normalize;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use tracing::info;
use uuid::Uuid;

/// Abbreviations kept upper case when title-casing an ALL CAPS name
const KEEP_UPPER: &[&str] = &["DJ", "MC", "MK", "GW", "ZHU", "CID"];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

const EDGE_PUNCTUATION: &[char] = &[',', '.', '-', ':', ';'];

/// Keep one artist, fold the rest into it as aliases
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistMergePlan {
    pub normalized_name: String,
    pub canonical_id: Uuid,
    pub canonical_name: String,
    /// (id, name) of each duplicate; names become aliases of the canonical artist
    pub duplicates: Vec<(Uuid, String)>,
}

/// Keep one track, re-point the rest to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackMergePlan {
    pub title_normalized: String,
    pub artist_name_normalized: String,
    pub canonical_id: Uuid,
    pub duplicate_ids: Vec<Uuid>,
}

/// Stored normalized title that no longer matches the title
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationDrift {
    pub track_id: Uuid,
    pub title: String,
    pub stored: String,
    pub expected: String,
}

/// Artist display name that should be tidied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameFix {
    pub artist_id: Uuid,
    pub current: String,
    pub cleaned: String,
}

/// Artist track counter to recompute from the linked tracks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountFix {
    pub artist_id: Uuid,
    pub name: String,
    pub stored: u32,
    pub actual: u32,
}

/// Everything a cleanup run would change
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanupPlan {
    pub artist_merges: Vec<ArtistMergePlan>,
    pub track_merges: Vec<TrackMergePlan>,
    pub normalization_drift: Vec<NormalizationDrift>,
    pub name_fixes: Vec<NameFix>,
    pub count_fixes: Vec<CountFix>,
}

impl CleanupPlan {
    pub fn duplicate_artist_count(&self) -> usize {
        self.artist_merges.iter().map(|p| p.duplicates.len()).sum()
    }

    pub fn duplicate_track_count(&self) -> usize {
        self.track_merges.iter().map(|p| p.duplicate_ids.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.artist_merges.is_empty()
            && self.track_merges.is_empty()
            && self.normalization_drift.is_empty()
            && self.name_fixes.is_empty()
            && self.count_fixes.is_empty()
    }
}

/// Tidy an artist display name
///
/// ```
/// use rork_trackid::services::catalog_cleanup::clean_artist_name;
///
/// assert_eq!(clean_artist_name("  DJ  SNAKE "), "DJ Snake");
/// assert_eq!(clean_artist_name("Above & Beyond,"), "Above & Beyond");
/// ```
pub fn clean_artist_name(name: &str) -> String {
    let mut cleaned = WHITESPACE.replace_all(name, " ").trim().to_string();

    let is_all_caps = cleaned == cleaned.to_uppercase();
    if is_all_caps && cleaned.chars().count() > 3 {
        cleaned = cleaned
            .split(' ')
            .map(|word| {
                if word.chars().count() <= 3 || KEEP_UPPER.contains(&word) {
                    word.to_string()
                } else {
                    title_case(word)
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
    }

    cleaned
        .trim_start_matches(EDGE_PUNCTUATION)
        .trim()
        .trim_end_matches(EDGE_PUNCTUATION)
        .trim()
        .to_string()
}

/// Upper-case the first letter of each alphabetic run, lower-case the rest
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut at_run_start = true;
    for c in word.chars() {
        if c.is_alphabetic() {
            if at_run_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_run_start = false;
        } else {
            out.push(c);
            at_run_start = true;
        }
    }
    out
}

/// Group artists by normalized name; keep the one with the most data
///
/// Canonical: highest `sets_count + tracks_count`, ties to the earliest created.
pub fn plan_artist_merges(artists: &[CanonicalArtist]) -> Vec<ArtistMergePlan> {
    let mut groups: BTreeMap<String, Vec<&CanonicalArtist>> = BTreeMap::new();
    for artist in artists {
        let key = normalize(&artist.name);
        if !key.is_empty() {
            groups.entry(key).or_default().push(artist);
        }
    }

    groups
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|(normalized_name, mut group)| {
            group.sort_by_key(|a| (Reverse(a.popularity()), a.created_at));
            let canonical = group[0];
            ArtistMergePlan {
                normalized_name,
                canonical_id: canonical.id,
                canonical_name: canonical.name.clone(),
                duplicates: group[1..].iter().map(|a| (a.id, a.name.clone())).collect(),
            }
        })
        .collect()
}

/// Group tracks by normalized title and artist name; keep the most played
///
/// Canonical: highest `times_played`, then linked to an artist, then earliest created.
pub fn plan_track_merges(tracks: &[CanonicalTrack]) -> Vec<TrackMergePlan> {
    let mut groups: BTreeMap<(String, String), Vec<&CanonicalTrack>> = BTreeMap::new();
    for track in tracks {
        let title_key = normalize(track.title());
        if !title_key.is_empty() {
            groups
                .entry((title_key, normalize(&track.artist_name)))
                .or_default()
                .push(track);
        }
    }

    groups
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|((title_normalized, artist_name_normalized), mut group)| {
            group.sort_by_key(|t| (Reverse(t.times_played), t.artist_id.is_none(), t.created_at));
            TrackMergePlan {
                title_normalized,
                artist_name_normalized,
                canonical_id: group[0].id,
                duplicate_ids: group[1..].iter().map(|t| t.id).collect(),
            }
        })
        .collect()
}

/// Tracks whose stored normalized title differs from `normalize(title)`
pub fn find_normalization_drift(tracks: &[CanonicalTrack]) -> Vec<NormalizationDrift> {
    tracks
        .iter()
        .filter_map(|track| {
            let expected = normalize(track.title());
            (track.title_normalized() != expected).then(|| NormalizationDrift {
                track_id: track.id,
                title: track.title().to_string(),
                stored: track.title_normalized().to_string(),
                expected,
            })
        })
        .collect()
}

/// Artists whose display name `clean_artist_name` would change
pub fn find_name_fixes(artists: &[CanonicalArtist]) -> Vec<NameFix> {
    artists
        .iter()
        .filter_map(|artist| {
            let cleaned = clean_artist_name(&artist.name);
            (!cleaned.is_empty() && cleaned != artist.name).then(|| NameFix {
                artist_id: artist.id,
                current: artist.name.clone(),
                cleaned,
            })
        })
        .collect()
}

/// Artists whose `tracks_count` differs from the number of tracks linked to them
pub fn find_count_drift(artists: &[CanonicalArtist], tracks: &[CanonicalTrack]) -> Vec<CountFix> {
    let mut linked: HashMap<Uuid, u32> = HashMap::new();
    for artist_id in tracks.iter().filter_map(|t| t.artist_id) {
        *linked.entry(artist_id).or_default() += 1;
    }

    artists
        .iter()
        .filter_map(|artist| {
            let actual = linked.get(&artist.id).copied().unwrap_or(0);
            (artist.tracks_count != actual).then(|| CountFix {
                artist_id: artist.id,
                name: artist.name.clone(),
                stored: artist.tracks_count,
                actual,
            })
        })
        .collect()
}

/// Build the full dry-run plan
pub fn plan_cleanup(artists: &[CanonicalArtist], tracks: &[CanonicalTrack]) -> CleanupPlan {
    let plan = CleanupPlan {
        artist_merges: plan_artist_merges(artists),
        track_merges: plan_track_merges(tracks),
        normalization_drift: find_normalization_drift(tracks),
        name_fixes: find_name_fixes(artists),
        count_fixes: find_count_drift(artists, tracks),
    };

    info!(
        artists = artists.len(),
        tracks = tracks.len(),
        duplicate_artists = plan.duplicate_artist_count(),
        duplicate_tracks = plan.duplicate_track_count(),
        drift = plan.normalization_drift.len(),
        name_fixes = plan.name_fixes.len(),
        count_fixes = plan.count_fixes.len(),
        "Catalog cleanup plan built"
    );

    plan
}
