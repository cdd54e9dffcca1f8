//! Pipeline over a file-backed SQLite store

mod helpers;

use helpers::{set_comments, SET_DESCRIPTION};
use rork_trackid::db::SqliteStore;
use rork_trackid::models::{MatchType, Resolution};
use rork_trackid::services::catalog_cleanup::plan_cleanup;
use rork_trackid::{CanonicalStore, ImportSession, TrackIdConfig};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_open_creates_missing_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("catalog.db");

    let store = SqliteStore::open(&path).await.unwrap();
    store.ping().await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_catalog_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.db");

    {
        let store = Arc::new(SqliteStore::open(&path).await.unwrap());
        let session = ImportSession::new(store.clone(), TrackIdConfig::default());
        let setlist = session
            .import_set(Some(SET_DESCRIPTION), &set_comments())
            .await
            .unwrap();
        assert!(setlist.tracks.iter().all(|t| t.resolution == Resolution::Created));
        store.pool().close().await;
    }

    let store = Arc::new(SqliteStore::open(&path).await.unwrap());
    let session = ImportSession::new(store.clone(), TrackIdConfig::default());
    let setlist = session
        .import_set(Some("0:30 fisher - LOSING IT\n13:00 Camelphat - Cola"), &[])
        .await
        .unwrap();

    assert!(setlist.tracks.iter().all(|t| matches!(
        t.resolution,
        Resolution::Matched { match_type: MatchType::Exact, .. }
    )));
    assert_eq!(setlist.titles(), vec!["Losing It", "Cola"]);
    assert_eq!(store.all_artists().await.unwrap().len(), 3);
    assert_eq!(store.all_tracks().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_fuzzy_spelling_becomes_alias() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("catalog.db")).await.unwrap());
    let session = ImportSession::new(store.clone(), TrackIdConfig::default());

    session
        .import_set(Some("1:00 Chris Lake - Turn Off The Lights"), &[])
        .await
        .unwrap();
    let first = session
        .import_set(Some("1:00 Chris Lakee - Turn Off The Lights"), &[])
        .await
        .unwrap();
    assert!(matches!(first.tracks[0].resolution, Resolution::Matched { .. }));
    assert_eq!(first.tracks[0].artist, "Chris Lake");

    // The accepted misspelling is now an alias hit, not another fuzzy scan
    let hit = session
        .resolver()
        .artist_matcher()
        .find("Chris Lakee")
        .await
        .unwrap();
    assert_eq!(hit.match_type, MatchType::Alias);
    assert_eq!(store.all_artists().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_clean_import_needs_no_cleanup() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("catalog.db")).await.unwrap());
    let session = ImportSession::new(store.clone(), TrackIdConfig::default());
    session
        .import_set(Some(SET_DESCRIPTION), &set_comments())
        .await
        .unwrap();

    let plan = plan_cleanup(
        &store.all_artists().await.unwrap(),
        &store.all_tracks().await.unwrap(),
    );
    assert_eq!(plan.duplicate_artist_count(), 0);
    assert_eq!(plan.duplicate_track_count(), 0);
    assert!(plan.normalization_drift.is_empty());
    assert!(plan.count_fixes.is_empty());
}

#[tokio::test]
async fn test_cleanup_sees_stored_column_drift() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("catalog.db")).await.unwrap());
    let session = ImportSession::new(store.clone(), TrackIdConfig::default());
    session.import_set(Some(SET_DESCRIPTION), &[]).await.unwrap();

    sqlx::query("UPDATE tracks SET title_normalized = 'stale value' WHERE title = 'Losing It'")
        .execute(store.pool())
        .await
        .unwrap();
    sqlx::query("UPDATE artists SET tracks_count = 5 WHERE name = 'Meduza'")
        .execute(store.pool())
        .await
        .unwrap();

    let tracks = store.all_tracks().await.unwrap();
    let losing_it = tracks.iter().find(|t| t.title() == "Losing It").unwrap();
    assert_eq!(losing_it.title_normalized(), "stale value");

    let plan = plan_cleanup(&store.all_artists().await.unwrap(), &tracks);

    assert_eq!(plan.normalization_drift.len(), 1);
    assert_eq!(plan.normalization_drift[0].track_id, losing_it.id);
    assert_eq!(plan.normalization_drift[0].stored, "stale value");
    assert_eq!(plan.normalization_drift[0].expected, "losing it");

    assert_eq!(plan.count_fixes.len(), 1);
    assert_eq!(plan.count_fixes[0].name, "Meduza");
    assert_eq!(plan.count_fixes[0].stored, 5);
    assert_eq!(plan.count_fixes[0].actual, 1);
}
