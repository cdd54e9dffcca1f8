//! Source Merger
//!
//! Folds resolved tracks from a second source into an existing setlist.
//! Incoming entries are compared against the entries present before the
//! merge started; the incoming batch was already deduplicated on its own.
//!
//! Per incoming entry, first rule that applies:
//! 1. Same identity within the dedup window → `matched`
//! 2. A different track within the conflict window → `conflicts_created`,
//!    both entries kept for external arbitration
//! 3. Otherwise inserted → `new_from_secondary`

use crate::config::MergeConfig;
use crate::models::{MergeResult, ResolvedTrack, Setlist, SetlistConflict};
use crate::services::mention_set_builder::{same_identity, within_window};
use rork_common::time::format_timestamp;
use tracing::{debug, info, warn};

/// Source Merger
pub struct SourceMerger {
    dedup_window_secs: u32,
    conflict_window_secs: u32,
}

impl Default for SourceMerger {
    fn default() -> Self {
        Self::new(&MergeConfig::default())
    }
}

impl SourceMerger {
    pub fn new(config: &MergeConfig) -> Self {
        Self {
            dedup_window_secs: config.dedup_window_secs,
            conflict_window_secs: config.conflict_window_secs,
        }
    }

    /// Merge `incoming` into `setlist`
    ///
    /// Never overwrites an existing entry and never touches canonical counts.
    pub fn merge(&self, setlist: &mut Setlist, mut incoming: Vec<ResolvedTrack>) -> MergeResult {
        incoming.sort_by_key(|t| t.timestamp_seconds);

        let existing = setlist.tracks.clone();
        let mut result = MergeResult::default();

        for track in incoming {
            let duplicate = existing.iter().any(|e| {
                within_window(e.timestamp_seconds, track.timestamp_seconds, self.dedup_window_secs)
                    && same_track(e, &track)
            });
            if duplicate {
                debug!(
                    title = %track.title,
                    at = %format_timestamp(track.timestamp_seconds),
                    "Incoming track matches existing entry"
                );
                result.matched += 1;
                continue;
            }

            let contender = existing.iter().find(|e| {
                within_window(e.timestamp_seconds, track.timestamp_seconds, self.conflict_window_secs)
            });
            if let Some(contender) = contender {
                warn!(
                    at = %format_timestamp(track.timestamp_seconds),
                    existing = %contender.title,
                    incoming = %track.title,
                    "Sources disagree on track, conflict recorded"
                );
                setlist.conflicts.push(SetlistConflict {
                    timestamp_seconds: track.timestamp_seconds,
                    existing: contender.clone(),
                    incoming: track.clone(),
                });
                setlist.insert(track);
                result.conflicts_created += 1;
                continue;
            }

            setlist.insert(track);
            result.new_from_secondary += 1;
        }

        info!(
            matched = result.matched,
            new = result.new_from_secondary,
            conflicts = result.conflicts_created,
            "Merged secondary source: {}",
            result.summary()
        );

        result
    }
}

/// Same canonical track when both are resolved, else the text identity rule
fn same_track(a: &ResolvedTrack, b: &ResolvedTrack) -> bool {
    match (a.track_id, b.track_id) {
        (Some(x), Some(y)) => x == y,
        _ => same_identity(&a.title, &a.artist, &b.title, &b.artist),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Resolution, SourceRef};
    use uuid::Uuid;

    fn entry(ts: u32, title: &str, artist: &str) -> ResolvedTrack {
        ResolvedTrack {
            timestamp_seconds: ts,
            title: title.to_string(),
            artist: artist.to_string(),
            confidence: 0.5,
            track_id: None,
            artist_id: None,
            resolution: Resolution::Unresolved,
            provenance: SourceRef::description(),
            is_unreleased: false,
            remix_info: None,
        }
    }

    fn base_setlist() -> Setlist {
        Setlist::new(vec![
            entry(0, "Losing It", "Fisher"),
            entry(272, "Bad Memories", "Meduza"),
            entry(765, "Cola", "CamelPhat"),
        ])
    }

    #[test]
    fn test_same_track_within_window_is_matched() {
        let mut setlist = base_setlist();
        let result = SourceMerger::default().merge(&mut setlist, vec![entry(770, "Cola", "CamelPhat")]);

        assert_eq!(result.matched, 1);
        assert_eq!(result.new_from_secondary, 0);
        assert_eq!(setlist.len(), 3);
    }

    #[test]
    fn test_different_track_within_window_is_conflict() {
        let mut setlist = base_setlist();
        let result = SourceMerger::default()
            .merge(&mut setlist, vec![entry(770, "Drugs From Amsterdam", "Mau P")]);

        assert_eq!(result.conflicts_created, 1);
        assert_eq!(result.matched, 0);
        assert_eq!(setlist.len(), 4);
        assert_eq!(setlist.conflicts.len(), 1);
        assert_eq!(setlist.conflicts[0].existing.title, "Cola");
        assert_eq!(setlist.conflicts[0].incoming.title, "Drugs From Amsterdam");
    }

    #[test]
    fn test_new_track_outside_windows() {
        let mut setlist = base_setlist();
        let result = SourceMerger::default()
            .merge(&mut setlist, vec![entry(1200, "Turn Off The Lights", "Chris Lake")]);

        assert_eq!(result, MergeResult { matched: 0, new_from_secondary: 1, conflicts_created: 0 });
        assert_eq!(setlist.tracks.last().unwrap().title, "Turn Off The Lights");
    }

    #[test]
    fn test_track_ids_decide_identity_when_present() {
        let id = Uuid::new_v4();
        let mut existing = entry(100, "Cola", "CamelPhat");
        existing.track_id = Some(id);
        let mut setlist = Setlist::new(vec![existing]);

        let mut renamed = entry(110, "Cola (Extended Mix)", "CamelPhat & Elderbrook");
        renamed.track_id = Some(id);
        let mut other = entry(150, "Cola", "CamelPhat");
        other.track_id = Some(Uuid::new_v4());

        let result = SourceMerger::default().merge(&mut setlist, vec![renamed, other]);
        assert_eq!(result.matched, 1);
        assert_eq!(result.conflicts_created, 1);
    }

    #[test]
    fn test_mixed_batch_counts() {
        let mut setlist = base_setlist();
        let result = SourceMerger::default().merge(
            &mut setlist,
            vec![
                entry(5, "Losing It", "Fisher"),
                entry(300, "Something Else", "Someone"),
                entry(2000, "Rumble", "Skrillex"),
            ],
        );
        assert_eq!(result.total(), 3);
        assert_eq!(result.summary(), "1 matched, 1 new, 1 conflict");
        let timestamps: Vec<u32> = setlist.tracks.iter().map(|t| t.timestamp_seconds).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
    }
}
