//! End-to-end pipeline tests
//!
//! Description + comments in, resolved setlist out, over an in-memory store.

mod helpers;

use helpers::{capture_logs, set_comments, SET_DESCRIPTION};
use rork_trackid::models::{Resolution, SourceKind};
use rork_trackid::{CommentRecord, ImportSession, InMemoryStore, TrackIdConfig};
use std::sync::Arc;
use tracing::Level;

fn session(store: &Arc<InMemoryStore>) -> ImportSession {
    ImportSession::new(store.clone(), TrackIdConfig::default())
}

#[tokio::test]
async fn test_description_and_comments_become_ordered_setlist() {
    let store = Arc::new(InMemoryStore::new());
    let setlist = session(&store)
        .import_set(Some(SET_DESCRIPTION), &set_comments())
        .await
        .unwrap();

    let rows: Vec<(u32, &str, &str)> = setlist
        .tracks
        .iter()
        .map(|t| (t.timestamp_seconds, t.title.as_str(), t.artist.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (0, "Losing It", "Fisher"),
            (272, "Bad Memories", "Meduza"),
            (765, "Cola", "CamelPhat"),
        ]
    );

    assert_eq!(setlist.tracks[0].provenance.kind, SourceKind::Description);
    assert_eq!(setlist.tracks[2].provenance.kind, SourceKind::Comment);
    assert!(setlist.conflicts.is_empty());
}

#[tokio::test]
async fn test_id_request_comment_contributes_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let session = session(&store);

    let only_request = vec![CommentRecord::new("0:05 anyone know the ID?", 2, "curious_listener")];
    let mentions = session.extract_mentions(None, &only_request);
    assert!(mentions.is_empty());

    let setlist = session.import_set(None, &only_request).await.unwrap();
    assert!(setlist.is_empty());
    assert_eq!(store.track_count().await, 0);
    assert_eq!(store.artist_count().await, 0);
}

#[tokio::test]
async fn test_endorsed_comment_scores_higher_than_description() {
    let store = Arc::new(InMemoryStore::new());
    let mentions = session(&store).extract_mentions(Some(SET_DESCRIPTION), &set_comments());

    let fisher = mentions.iter().find(|m| m.title == "Losing It").unwrap();
    let cola = mentions.iter().find(|m| m.title == "Cola").unwrap();
    assert!(cola.confidence > fisher.confidence);
    assert!(mentions.iter().all(|m| (0.0..=1.0).contains(&m.confidence)));
}

#[tokio::test]
async fn test_repeated_mentions_in_comments_collapse() {
    let store = Arc::new(InMemoryStore::new());
    let comments = vec![
        CommentRecord::new("2:00 Fisher - Losing It", 1, "a"),
        CommentRecord::new("2:25 fisher - losing it!!", 40, "b"),
        CommentRecord::new("30:00 Fisher - Losing It", 0, "c"),
    ];

    let mentions = session(&store).extract_mentions(None, &comments);
    let timestamps: Vec<u32> = mentions.iter().map(|m| m.timestamp_seconds).collect();
    // Inside the window the better-endorsed comment wins; a replay later in
    // the set is its own event
    assert_eq!(timestamps, vec![145, 1800]);
    assert_eq!(mentions[0].source_ref.endorsement_count, 40);
}

#[tokio::test]
async fn test_reimport_reuses_canonical_entities() {
    let store = Arc::new(InMemoryStore::new());
    let session = session(&store);

    session.import_set(Some(SET_DESCRIPTION), &set_comments()).await.unwrap();
    let second = session
        .import_set(Some("1:00 FISHER - losing it\n5:00 Meduza - Bad Memories"), &[])
        .await
        .unwrap();

    assert_eq!(store.track_count().await, 3);
    assert_eq!(store.artist_count().await, 3);
    assert!(second
        .tracks
        .iter()
        .all(|t| matches!(t.resolution, Resolution::Matched { .. })));
    // Canonical spelling wins over the mention's
    assert_eq!(second.tracks[0].title, "Losing It");
    assert_eq!(second.tracks[0].artist, "Fisher");

    let losing_it = store
        .tracks()
        .await
        .into_iter()
        .find(|t| t.title() == "Losing It")
        .unwrap();
    assert_eq!(losing_it.times_played, 2);
}

#[tokio::test]
async fn test_remix_credit_links_remixer() {
    let store = Arc::new(InMemoryStore::new());
    let setlist = session(&store)
        .import_set(Some("10:00 Cola (Chris Lake Remix) - CamelPhat"), &[])
        .await
        .unwrap();

    assert_eq!(setlist.len(), 1);
    let entry = &setlist.tracks[0];
    assert_eq!(entry.remix_info.as_deref(), Some("Chris Lake Remix"));

    let track = store.get_track(entry.track_id.unwrap()).await.unwrap();
    assert_eq!(track.remix_type.as_deref(), Some("Remix"));
    let remixer = store.get_artist(track.remix_artist_id.unwrap()).await.unwrap();
    assert_eq!(remixer.name, "Chris Lake");
}

#[tokio::test]
async fn test_pipeline_logs_summary() {
    let (logs, _guard) = capture_logs();
    let store = Arc::new(InMemoryStore::new());

    session(&store)
        .import_set(Some(SET_DESCRIPTION), &set_comments())
        .await
        .unwrap();

    logs.assert_contains("Built mention set");
    logs.assert_contains("Set imported");
    let summary = logs.at_level(Level::INFO, "Set imported");
    assert_eq!(summary.len(), 1);
    assert!(summary[0]
        .fields
        .iter()
        .any(|(name, value)| name == "tracks" && value == "3"));
    logs.assert_no_match("unresolved");
}
