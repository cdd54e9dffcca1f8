//! Import session
//!
//! Caller-owned state for running the pipeline. The store is injected, so a
//! session can run against SQLite in production and an in-memory or
//! failure-injecting store in tests.
//!
//! **Failure policy:** the only batch-level error is an unreachable store at
//! batch start ([`IdError::StoreUnavailable`]). After that, each mention is
//! resolved independently and a store failure leaves just that mention
//! unresolved.

use crate::config::TrackIdConfig;
use crate::error::{IdError, IdResult};
use crate::models::{CommentRecord, MergeResult, ResolvedTrack, Setlist, TrackMention};
use crate::services::{EntityResolver, MentionSetBuilder, SourceMerger};
use crate::store::CanonicalStore;
use std::sync::Arc;
use tracing::{info, warn};

/// One pipeline session over a canonical store
pub struct ImportSession {
    store: Arc<dyn CanonicalStore>,
    builder: MentionSetBuilder,
    resolver: EntityResolver,
    merger: SourceMerger,
}

impl ImportSession {
    pub fn new(store: Arc<dyn CanonicalStore>, config: TrackIdConfig) -> Self {
        let builder = MentionSetBuilder::new(config.parser, config.scoring, &config.merge);
        let resolver = EntityResolver::new(Arc::clone(&store), config.matching);
        let merger = SourceMerger::new(&config.merge);

        Self {
            store,
            builder,
            resolver,
            merger,
        }
    }

    pub fn resolver(&self) -> &EntityResolver {
        &self.resolver
    }

    /// Parse and deduplicate mentions without touching the store
    pub fn extract_mentions(
        &self,
        description: Option<&str>,
        comments: &[CommentRecord],
    ) -> Vec<TrackMention> {
        self.builder.build(description, comments)
    }

    /// First import of a set: extract, resolve, return the setlist
    pub async fn import_set(
        &self,
        description: Option<&str>,
        comments: &[CommentRecord],
    ) -> IdResult<Setlist> {
        self.ensure_store_reachable().await?;

        let tracks = self.resolve_all(description, comments).await;
        let setlist = Setlist::new(tracks);

        info!(
            tracks = setlist.len(),
            unresolved = setlist.tracks.iter().filter(|t| !t.resolution.is_resolved()).count(),
            "Set imported"
        );

        Ok(setlist)
    }

    /// Fold a second source for the same set into `setlist`
    pub async fn merge_source(
        &self,
        setlist: &mut Setlist,
        description: Option<&str>,
        comments: &[CommentRecord],
    ) -> IdResult<MergeResult> {
        self.ensure_store_reachable().await?;

        let incoming = self.resolve_all(description, comments).await;
        Ok(self.merger.merge(setlist, incoming))
    }

    async fn ensure_store_reachable(&self) -> IdResult<()> {
        self.store.ping().await.map_err(|e| {
            warn!(error = %e, "Canonical store unreachable, batch not attempted");
            IdError::StoreUnavailable(e.to_string())
        })
    }

    async fn resolve_all(
        &self,
        description: Option<&str>,
        comments: &[CommentRecord],
    ) -> Vec<ResolvedTrack> {
        let mentions = self.builder.build(description, comments);

        let mut resolved = Vec::with_capacity(mentions.len());
        for mention in &mentions {
            resolved.push(self.resolver.resolve_mention(mention).await);
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Resolution;
    use crate::store::InMemoryStore;

    const DESCRIPTION: &str = "0:00 Fisher - Losing It\n4:32 Meduza - Bad Memories";

    fn session(store: Arc<InMemoryStore>) -> ImportSession {
        ImportSession::new(store, TrackIdConfig::default())
    }

    #[tokio::test]
    async fn test_import_set_resolves_every_mention() {
        let store = Arc::new(InMemoryStore::new());
        let session = session(Arc::clone(&store));
        let comments = vec![
            CommentRecord::new("0:05 anyone know the ID?", 2, "viewer"),
            CommentRecord::new("12:45 CamelPhat - Cola", 14, "viewer"),
        ];

        let setlist = session.import_set(Some(DESCRIPTION), &comments).await.unwrap();

        assert_eq!(setlist.titles(), vec!["Losing It", "Bad Memories", "Cola"]);
        assert!(setlist
            .tracks
            .iter()
            .all(|t| t.resolution == Resolution::Created && t.track_id.is_some()));
        assert_eq!(store.track_count().await, 3);
        assert_eq!(store.artist_count().await, 3);
    }

    #[tokio::test]
    async fn test_second_import_matches_existing_entities() {
        let store = Arc::new(InMemoryStore::new());
        let session = session(Arc::clone(&store));

        session.import_set(Some(DESCRIPTION), &[]).await.unwrap();
        let again = session.import_set(Some(DESCRIPTION), &[]).await.unwrap();

        assert!(again
            .tracks
            .iter()
            .all(|t| matches!(t.resolution, Resolution::Matched { .. })));
        assert_eq!(store.track_count().await, 2);
    }

    #[tokio::test]
    async fn test_extract_mentions_is_store_free() {
        let store = Arc::new(InMemoryStore::new());
        let session = session(Arc::clone(&store));

        let mentions = session.extract_mentions(Some(DESCRIPTION), &[]);
        assert_eq!(mentions.len(), 2);
        assert_eq!(store.track_count().await, 0);
    }

    #[tokio::test]
    async fn test_merge_source_counts() {
        let store = Arc::new(InMemoryStore::new());
        let session = session(Arc::clone(&store));
        let comments = vec![CommentRecord::new("12:45 CamelPhat - Cola", 14, "viewer")];
        let mut setlist = session.import_set(Some(DESCRIPTION), &comments).await.unwrap();

        let result = session
            .merge_source(
                &mut setlist,
                None,
                &[
                    CommentRecord::new("12:50 CamelPhat - Cola", 3, "other"),
                    CommentRecord::new("20:00 Chris Lake - Turn Off The Lights", 0, "other"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(result.matched, 1);
        assert_eq!(result.new_from_secondary, 1);
        assert_eq!(result.conflicts_created, 0);
        assert_eq!(setlist.len(), 4);
    }
}
