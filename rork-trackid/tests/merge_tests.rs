//! Secondary source merge tests

mod helpers;

use helpers::{set_comments, SET_DESCRIPTION};
use rork_trackid::models::Resolution;
use rork_trackid::{CommentRecord, ImportSession, InMemoryStore, MergeResult, Setlist, TrackIdConfig};
use std::sync::Arc;

async fn imported() -> (Arc<InMemoryStore>, ImportSession, Setlist) {
    let store = Arc::new(InMemoryStore::new());
    let session = ImportSession::new(store.clone(), TrackIdConfig::default());
    let setlist = session
        .import_set(Some(SET_DESCRIPTION), &set_comments())
        .await
        .unwrap();
    (store, session, setlist)
}

#[tokio::test]
async fn test_same_track_five_seconds_later_is_matched() {
    let (store, session, mut setlist) = imported().await;

    let result = session
        .merge_source(&mut setlist, Some("12:50 CamelPhat - Cola"), &[])
        .await
        .unwrap();

    assert_eq!(result, MergeResult { matched: 1, new_from_secondary: 0, conflicts_created: 0 });
    assert_eq!(setlist.len(), 3);
    assert_eq!(store.track_count().await, 3);
}

#[tokio::test]
async fn test_different_track_at_same_position_is_conflict() {
    let (_store, session, mut setlist) = imported().await;

    let result = session
        .merge_source(&mut setlist, Some("12:50 Mau P - Drugs From Amsterdam"), &[])
        .await
        .unwrap();

    assert_eq!(result.conflicts_created, 1);
    assert_eq!(result.matched, 0);
    // Both kept until arbitrated elsewhere
    assert_eq!(setlist.len(), 4);
    let conflict = &setlist.conflicts[0];
    assert_eq!(conflict.existing.title, "Cola");
    assert_eq!(conflict.incoming.title, "Drugs From Amsterdam");
    assert_eq!(conflict.timestamp_seconds, 770);
}

#[tokio::test]
async fn test_merge_never_overwrites_existing_entries() {
    let (_store, session, mut setlist) = imported().await;
    let before = setlist.tracks.clone();

    session
        .merge_source(
            &mut setlist,
            None,
            &[
                CommentRecord::new("0:10 Fisher - Losing It (Extended Mix)", 200, "fisherfan"),
                CommentRecord::new("4:40 Someone Else - Other Song", 5, "x"),
            ],
        )
        .await
        .unwrap();

    for original in &before {
        assert!(setlist.tracks.contains(original));
    }
}

#[tokio::test]
async fn test_merge_keeps_setlist_ordered_and_counts_add_up() {
    let (_store, session, mut setlist) = imported().await;
    let incoming = "0:02 Fisher - Losing It\n\
                    4:40 Someone Else - Other Song\n\
                    20:00 Chris Lake - Turn Off The Lights";

    let result = session.merge_source(&mut setlist, Some(incoming), &[]).await.unwrap();

    assert_eq!(result.total(), 3);
    assert_eq!(result.summary(), "1 matched, 1 new, 1 conflict");
    let timestamps: Vec<u32> = setlist.tracks.iter().map(|t| t.timestamp_seconds).collect();
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));

    let appended = setlist.tracks.last().unwrap();
    assert_eq!(appended.title, "Turn Off The Lights");
    assert_eq!(appended.resolution, Resolution::Created);
}
