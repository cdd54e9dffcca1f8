//! SQLite canonical store
//!
//! Creates are `INSERT ... ON CONFLICT DO NOTHING` followed by a read-back on
//! the unique key, so two resolvers racing on one new name both get the row
//! that won. Writes go through [`retry_on_lock`].

use crate::db::schema::{create_schema, open_database};
use crate::models::{CanonicalArtist, CanonicalTrack, NewTrack};
use crate::services::text_normalizer::normalize;
use crate::store::{CanonicalStore, StoreError, StoreResult, Upserted};
use crate::utils::retry_on_lock;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeSet;
use std::path::Path;
use uuid::Uuid;

/// Default maximum time to keep retrying a locked write
pub const DEFAULT_MAX_LOCK_WAIT_MS: u64 = 5000;

const ARTIST_COLUMNS: &str = r#"
    a.guid, a.name, a.slug, a.tracks_count, a.sets_count, a.created_at,
    (SELECT GROUP_CONCAT(x.alias_normalized, '|') FROM artist_aliases x WHERE x.artist_id = a.guid) AS aliases
"#;

const TRACK_COLUMNS: &str = r#"
    t.guid, t.title, t.title_normalized, t.artist_id, t.artist_name, t.artist_name_normalized,
    t.remix_artist_id, t.remix_type,
    t.is_unreleased, t.times_played, t.created_at
"#;

/// Tracks linked to the artist, or to no artist, when an artist is given
const ARTIST_SCOPE: &str = "(?1 IS NULL OR t.artist_id IS NULL OR t.artist_id = ?1)";

/// sqlx-backed canonical store
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl SqliteStore {
    /// Open a database file, creating file and tables as needed
    pub async fn open(db_path: &Path) -> StoreResult<Self> {
        let pool = open_database(db_path).await?;
        Ok(Self {
            pool,
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
        })
    }

    /// Wrap an existing pool, creating tables as needed
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        create_schema(&pool).await?;
        Ok(Self {
            pool,
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
        })
    }

    pub fn with_max_lock_wait_ms(mut self, max_lock_wait_ms: u64) -> Self {
        self.max_lock_wait_ms = max_lock_wait_ms;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Every artist, oldest first (maintenance snapshots)
    pub async fn all_artists(&self) -> StoreResult<Vec<CanonicalArtist>> {
        let sql = format!("SELECT {} FROM artists a ORDER BY a.created_at, a.name", ARTIST_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(artist_from_row).collect()
    }

    /// Every track, oldest first (maintenance snapshots)
    pub async fn all_tracks(&self) -> StoreResult<Vec<CanonicalTrack>> {
        let sql = format!("SELECT {} FROM tracks t ORDER BY t.created_at, t.title", TRACK_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(track_from_row).collect()
    }

    async fn artist_by_slug(&self, slug: &str) -> StoreResult<Option<CanonicalArtist>> {
        let sql = format!("SELECT {} FROM artists a WHERE a.slug = ?", ARTIST_COLUMNS);
        let row = sqlx::query(&sql).bind(slug).fetch_optional(&self.pool).await?;
        row.as_ref().map(artist_from_row).transpose()
    }

    async fn track_by_identity(
        &self,
        title_normalized: &str,
        artist_name_normalized: &str,
    ) -> StoreResult<Option<CanonicalTrack>> {
        let sql = format!(
            "SELECT {} FROM tracks t WHERE t.title_normalized = ? AND t.artist_name_normalized = ?",
            TRACK_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(title_normalized)
            .bind(artist_name_normalized)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(track_from_row).transpose()
    }
}

fn timestamp_now() -> String {
    rork_common::time::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_guid(value: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| StoreError::Corrupt(format!("Bad guid '{}': {}", value, e)))
}

fn parse_optional_guid(value: Option<String>) -> StoreResult<Option<Uuid>> {
    value.as_deref().map(parse_guid).transpose()
}

fn parse_created_at(value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("Bad timestamp '{}': {}", value, e)))
}

fn parse_count(value: i64, column: &str) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} out of range: {}", column, value)))
}

fn artist_from_row(row: &SqliteRow) -> StoreResult<CanonicalArtist> {
    let guid: String = row.try_get("guid")?;
    let name: String = row.try_get("name")?;
    let created_at: String = row.try_get("created_at")?;
    let alias_list: Option<String> = row.try_get("aliases")?;

    let mut aliases: BTreeSet<String> = alias_list
        .as_deref()
        .unwrap_or_default()
        .split('|')
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();
    aliases.insert(normalize(&name));

    Ok(CanonicalArtist {
        id: parse_guid(&guid)?,
        slug: row.try_get("slug")?,
        aliases,
        tracks_count: parse_count(row.try_get("tracks_count")?, "tracks_count")?,
        sets_count: parse_count(row.try_get("sets_count")?, "sets_count")?,
        created_at: parse_created_at(&created_at)?,
        name,
    })
}

fn track_from_row(row: &SqliteRow) -> StoreResult<CanonicalTrack> {
    let guid: String = row.try_get("guid")?;
    let created_at: String = row.try_get("created_at")?;

    let new = NewTrack {
        title: row.try_get("title")?,
        artist_id: parse_optional_guid(row.try_get("artist_id")?)?,
        artist_name: row.try_get("artist_name")?,
        remix_artist_id: parse_optional_guid(row.try_get("remix_artist_id")?)?,
        remix_type: row.try_get("remix_type")?,
        is_unreleased: row.try_get("is_unreleased")?,
    };

    let mut track = CanonicalTrack::from_stored(
        parse_guid(&guid)?,
        new,
        row.try_get("title_normalized")?,
        row.try_get("artist_name_normalized")?,
        parse_created_at(&created_at)?,
    );
    track.times_played = parse_count(row.try_get("times_played")?, "times_played")?;
    Ok(track)
}

#[async_trait]
impl CanonicalStore for SqliteStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn find_artist_exact(&self, name: &str) -> StoreResult<Option<CanonicalArtist>> {
        let sql = format!(
            "SELECT {} FROM artists a WHERE a.name_lower = ? ORDER BY a.created_at LIMIT 1",
            ARTIST_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(name.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(artist_from_row).transpose()
    }

    async fn find_artist_alias(&self, normalized: &str) -> StoreResult<Option<CanonicalArtist>> {
        let sql = format!(
            "SELECT {} FROM artists a JOIN artist_aliases al ON al.artist_id = a.guid WHERE al.alias_normalized = ?",
            ARTIST_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(normalized)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(artist_from_row).transpose()
    }

    async fn scan_artists(&self, limit: usize) -> StoreResult<Vec<CanonicalArtist>> {
        let sql = format!(
            "SELECT {} FROM artists a ORDER BY (a.tracks_count + a.sets_count) DESC, a.name LIMIT ?",
            ARTIST_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(artist_from_row).collect()
    }

    async fn create_artist(&self, name: &str, slug: &str) -> StoreResult<Upserted<CanonicalArtist>> {
        let pool = &self.pool;
        let guid = Uuid::new_v4().to_string();
        let guid = guid.as_str();
        let name_lower = name.to_lowercase();
        let name_lower = name_lower.as_str();
        let normalized = normalize(name);
        let normalized = normalized.as_str();
        let created_at = timestamp_now();
        let created_at = created_at.as_str();

        let inserted = retry_on_lock("create_artist", self.max_lock_wait_ms, || async move {
            let mut tx = pool.begin().await?;

            let inserted = sqlx::query(
                r#"
                INSERT INTO artists (guid, name, name_lower, slug, tracks_count, sets_count, created_at)
                VALUES (?, ?, ?, ?, 0, 0, ?)
                ON CONFLICT(slug) DO NOTHING
                "#,
            )
            .bind(guid)
            .bind(name)
            .bind(name_lower)
            .bind(slug)
            .bind(created_at)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted == 1 && !normalized.is_empty() {
                sqlx::query(
                    r#"
                    INSERT INTO artist_aliases (artist_id, alias, alias_normalized, created_at)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT(alias_normalized) DO NOTHING
                    "#,
                )
                .bind(guid)
                .bind(name)
                .bind(normalized)
                .bind(created_at)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            Ok::<bool, StoreError>(inserted == 1)
        })
        .await?;

        let artist = self.artist_by_slug(slug).await?.ok_or_else(|| {
            StoreError::Corrupt(format!("Artist with slug '{}' missing after insert", slug))
        })?;
        Ok(Upserted { entity: artist, inserted })
    }

    async fn upsert_artist_alias(
        &self,
        artist_id: Uuid,
        alias: &str,
        normalized: &str,
    ) -> StoreResult<()> {
        if normalized.is_empty() {
            return Ok(());
        }

        let pool = &self.pool;
        let artist_id = artist_id.to_string();
        let artist_id = artist_id.as_str();
        let created_at = timestamp_now();
        let created_at = created_at.as_str();

        retry_on_lock("upsert_artist_alias", self.max_lock_wait_ms, || async move {
            sqlx::query(
                r#"
                INSERT INTO artist_aliases (artist_id, alias, alias_normalized, created_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(alias_normalized) DO NOTHING
                "#,
            )
            .bind(artist_id)
            .bind(alias)
            .bind(normalized)
            .bind(created_at)
            .execute(pool)
            .await?;
            Ok::<(), StoreError>(())
        })
        .await
    }

    async fn increment_artist_tracks(&self, artist_id: Uuid) -> StoreResult<()> {
        let pool = &self.pool;
        let artist_id = artist_id.to_string();
        let artist_id = artist_id.as_str();

        retry_on_lock("increment_artist_tracks", self.max_lock_wait_ms, || async move {
            sqlx::query("UPDATE artists SET tracks_count = tracks_count + 1 WHERE guid = ?")
                .bind(artist_id)
                .execute(pool)
                .await?;
            Ok::<(), StoreError>(())
        })
        .await
    }

    async fn find_tracks_exact(
        &self,
        title: &str,
        artist_id: Option<Uuid>,
    ) -> StoreResult<Vec<CanonicalTrack>> {
        let sql = format!(
            "SELECT {} FROM tracks t WHERE {} AND t.title_lower = ?2 ORDER BY t.times_played DESC, t.title",
            TRACK_COLUMNS, ARTIST_SCOPE
        );
        let rows = sqlx::query(&sql)
            .bind(artist_id.map(|id| id.to_string()))
            .bind(title.trim().to_lowercase())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(track_from_row).collect()
    }

    async fn find_tracks_by_alias(
        &self,
        normalized_title: &str,
        artist_id: Option<Uuid>,
    ) -> StoreResult<Vec<CanonicalTrack>> {
        let sql = format!(
            "SELECT {} FROM tracks t JOIN track_aliases ta ON ta.track_id = t.guid \
             WHERE {} AND ta.title_alias_normalized = ?2 ORDER BY t.times_played DESC, t.title",
            TRACK_COLUMNS, ARTIST_SCOPE
        );
        let rows = sqlx::query(&sql)
            .bind(artist_id.map(|id| id.to_string()))
            .bind(normalized_title)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(track_from_row).collect()
    }

    async fn scan_tracks(
        &self,
        limit: usize,
        artist_id: Option<Uuid>,
    ) -> StoreResult<Vec<CanonicalTrack>> {
        let sql = format!(
            "SELECT {} FROM tracks t WHERE {} ORDER BY t.times_played DESC, t.title LIMIT ?2",
            TRACK_COLUMNS, ARTIST_SCOPE
        );
        let rows = sqlx::query(&sql)
            .bind(artist_id.map(|id| id.to_string()))
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(track_from_row).collect()
    }

    async fn create_track(&self, track: NewTrack) -> StoreResult<Upserted<CanonicalTrack>> {
        let pool = &self.pool;
        let guid = Uuid::new_v4().to_string();
        let guid = guid.as_str();
        let title = track.title.as_str();
        let title_lower = track.title.to_lowercase();
        let title_lower = title_lower.as_str();
        let title_normalized = track.title_normalized();
        let title_normalized = title_normalized.as_str();
        let artist_name_normalized = track.artist_name_normalized();
        let artist_name_normalized = artist_name_normalized.as_str();
        let artist_id = track.artist_id.map(|id| id.to_string());
        let artist_id = artist_id.as_deref();
        let remix_artist_id = track.remix_artist_id.map(|id| id.to_string());
        let remix_artist_id = remix_artist_id.as_deref();
        let remix_type = track.remix_type.as_deref();
        let artist_name = track.artist_name.as_str();
        let is_unreleased = track.is_unreleased;
        let created_at = timestamp_now();
        let created_at = created_at.as_str();

        let inserted = retry_on_lock("create_track", self.max_lock_wait_ms, || async move {
            let rows = sqlx::query(
                r#"
                INSERT INTO tracks (
                    guid, title, title_lower, title_normalized, artist_id, artist_name,
                    artist_name_normalized, remix_artist_id, remix_type, is_unreleased,
                    times_played, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
                ON CONFLICT(title_normalized, artist_name_normalized) DO NOTHING
                "#,
            )
            .bind(guid)
            .bind(title)
            .bind(title_lower)
            .bind(title_normalized)
            .bind(artist_id)
            .bind(artist_name)
            .bind(artist_name_normalized)
            .bind(remix_artist_id)
            .bind(remix_type)
            .bind(is_unreleased)
            .bind(created_at)
            .execute(pool)
            .await?
            .rows_affected();
            Ok::<bool, StoreError>(rows == 1)
        })
        .await?;

        let track = self
            .track_by_identity(title_normalized, artist_name_normalized)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("Track '{}' missing after insert", title)))?;
        Ok(Upserted { entity: track, inserted })
    }

    async fn upsert_track_alias(
        &self,
        track_id: Uuid,
        alias: &str,
        normalized: &str,
    ) -> StoreResult<()> {
        if normalized.is_empty() {
            return Ok(());
        }

        let pool = &self.pool;
        let track_id = track_id.to_string();
        let track_id = track_id.as_str();
        let created_at = timestamp_now();
        let created_at = created_at.as_str();

        retry_on_lock("upsert_track_alias", self.max_lock_wait_ms, || async move {
            sqlx::query(
                r#"
                INSERT INTO track_aliases (track_id, title_alias, title_alias_normalized, created_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(track_id, title_alias_normalized) DO NOTHING
                "#,
            )
            .bind(track_id)
            .bind(alias)
            .bind(normalized)
            .bind(created_at)
            .execute(pool)
            .await?;
            Ok::<(), StoreError>(())
        })
        .await
    }

    async fn increment_track_usage(&self, track_id: Uuid) -> StoreResult<()> {
        let pool = &self.pool;
        let track_id = track_id.to_string();
        let track_id = track_id.as_str();

        retry_on_lock("increment_track_usage", self.max_lock_wait_ms, || async move {
            sqlx::query("UPDATE tracks SET times_played = times_played + 1 WHERE guid = ?")
                .bind(track_id)
                .execute(pool)
                .await?;
            Ok::<(), StoreError>(())
        })
        .await
    }
}
