//! Failure-injecting canonical store
//!
//! Wraps an [`InMemoryStore`] and fails chosen operations, so tests can check
//! that one store hiccup only degrades the mention it hit.

use async_trait::async_trait;
use rork_trackid::models::NewTrack;
use rork_trackid::services::normalize;
use rork_trackid::{
    CanonicalArtist, CanonicalStore, CanonicalTrack, InMemoryStore, StoreError, StoreResult, Upserted,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Store wrapper with injectable failures
pub struct FlakyStore {
    inner: Arc<InMemoryStore>,
    ping_down: AtomicBool,
    /// operation name → remaining failures (`usize::MAX` = always)
    failing: Mutex<HashMap<&'static str, usize>>,
    /// normalized titles whose track operations time out
    poisoned_titles: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            ping_down: AtomicBool::new(false),
            failing: Mutex::new(HashMap::new()),
            poisoned_titles: Mutex::new(HashSet::new()),
        }
    }

    pub fn inner(&self) -> &Arc<InMemoryStore> {
        &self.inner
    }

    /// Make `ping` fail (store unreachable at batch start)
    pub fn take_down(&self) {
        self.ping_down.store(true, Ordering::SeqCst);
    }

    pub fn fail_always(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation, usize::MAX);
    }

    pub fn fail_times(&self, operation: &'static str, times: usize) {
        self.failing.lock().unwrap().insert(operation, times);
    }

    /// Track lookups and creates for this title time out
    pub fn poison_title(&self, title: &str) {
        self.poisoned_titles.lock().unwrap().insert(normalize(title));
    }

    fn check(&self, operation: &'static str) -> StoreResult<()> {
        let mut failing = self.failing.lock().unwrap();
        match failing.get_mut(operation) {
            Some(remaining) if *remaining > 0 => {
                if *remaining != usize::MAX {
                    *remaining -= 1;
                }
                Err(StoreError::Unavailable(format!("injected failure in {}", operation)))
            }
            _ => Ok(()),
        }
    }

    fn check_title(&self, operation: &'static str, title: &str) -> StoreResult<()> {
        if self.poisoned_titles.lock().unwrap().contains(&normalize(title)) {
            return Err(StoreError::Timeout {
                operation: operation.to_string(),
                waited_ms: 5000,
            });
        }
        self.check(operation)
    }
}

#[async_trait]
impl CanonicalStore for FlakyStore {
    async fn ping(&self) -> StoreResult<()> {
        if self.ping_down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.ping().await
    }

    async fn find_artist_exact(&self, name: &str) -> StoreResult<Option<CanonicalArtist>> {
        self.check("find_artist_exact")?;
        self.inner.find_artist_exact(name).await
    }

    async fn find_artist_alias(&self, normalized: &str) -> StoreResult<Option<CanonicalArtist>> {
        self.check("find_artist_alias")?;
        self.inner.find_artist_alias(normalized).await
    }

    async fn scan_artists(&self, limit: usize) -> StoreResult<Vec<CanonicalArtist>> {
        self.check("scan_artists")?;
        self.inner.scan_artists(limit).await
    }

    async fn create_artist(&self, name: &str, slug: &str) -> StoreResult<Upserted<CanonicalArtist>> {
        self.check("create_artist")?;
        self.inner.create_artist(name, slug).await
    }

    async fn upsert_artist_alias(&self, artist_id: Uuid, alias: &str, normalized: &str) -> StoreResult<()> {
        self.check("upsert_artist_alias")?;
        self.inner.upsert_artist_alias(artist_id, alias, normalized).await
    }

    async fn increment_artist_tracks(&self, artist_id: Uuid) -> StoreResult<()> {
        self.check("increment_artist_tracks")?;
        self.inner.increment_artist_tracks(artist_id).await
    }

    async fn find_tracks_exact(&self, title: &str, artist_id: Option<Uuid>) -> StoreResult<Vec<CanonicalTrack>> {
        self.check_title("find_tracks_exact", title)?;
        self.inner.find_tracks_exact(title, artist_id).await
    }

    async fn find_tracks_by_alias(
        &self,
        normalized_title: &str,
        artist_id: Option<Uuid>,
    ) -> StoreResult<Vec<CanonicalTrack>> {
        self.check_title("find_tracks_by_alias", normalized_title)?;
        self.inner.find_tracks_by_alias(normalized_title, artist_id).await
    }

    async fn scan_tracks(&self, limit: usize, artist_id: Option<Uuid>) -> StoreResult<Vec<CanonicalTrack>> {
        self.check("scan_tracks")?;
        self.inner.scan_tracks(limit, artist_id).await
    }

    async fn create_track(&self, track: NewTrack) -> StoreResult<Upserted<CanonicalTrack>> {
        self.check_title("create_track", &track.title)?;
        self.inner.create_track(track).await
    }

    async fn upsert_track_alias(&self, track_id: Uuid, alias: &str, normalized: &str) -> StoreResult<()> {
        self.check("upsert_track_alias")?;
        self.inner.upsert_track_alias(track_id, alias, normalized).await
    }

    async fn increment_track_usage(&self, track_id: Uuid) -> StoreResult<()> {
        self.check("increment_track_usage")?;
        self.inner.increment_track_usage(track_id).await
    }
}
