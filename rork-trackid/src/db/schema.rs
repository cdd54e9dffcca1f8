//! Database initialization
//!
//! Creates the catalog tables if they do not exist. Unique constraints carry
//! the store's idempotency guarantees:
//! - `artists.slug`
//! - `artist_aliases.alias_normalized` (global)
//! - `tracks(title_normalized, artist_name_normalized)`
//! - `track_aliases(track_id, title_alias_normalized)`
//!
//! Lower-cased lookup columns are filled from Rust; SQLite's `lower()` only
//! folds ASCII.

use crate::store::{StoreError, StoreResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

const MAX_CONNECTIONS: u32 = 10;

/// How long a connection waits on a locked database before erroring
const BUSY_TIMEOUT_MS: u64 = 5000;

/// Open (creating if needed) a catalog database file and its tables
pub async fn open_database(db_path: &Path) -> StoreResult<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            StoreError::Unavailable(format!("Cannot create {}: {}", parent.display(), e))
        })?;
    }

    // Per-connection settings: every pooled connection waits on locks and uses WAL
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new catalog database: {}", db_path.display());
    } else {
        info!("Opened existing catalog database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all catalog tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_artists_table(pool).await?;
    create_artist_aliases_table(pool).await?;
    create_tracks_table(pool).await?;
    create_track_aliases_table(pool).await?;
    Ok(())
}

async fn create_artists_table(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artists (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_lower TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            tracks_count INTEGER NOT NULL DEFAULT 0,
            sets_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_artists_name_lower ON artists(name_lower)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_artist_aliases_table(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artist_aliases (
            artist_id TEXT NOT NULL REFERENCES artists(guid) ON DELETE CASCADE,
            alias TEXT NOT NULL,
            alias_normalized TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_artist_aliases_artist ON artist_aliases(artist_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_tracks_table(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            title_lower TEXT NOT NULL,
            title_normalized TEXT NOT NULL,
            artist_id TEXT REFERENCES artists(guid) ON DELETE SET NULL,
            artist_name TEXT NOT NULL,
            artist_name_normalized TEXT NOT NULL,
            remix_artist_id TEXT REFERENCES artists(guid) ON DELETE SET NULL,
            remix_type TEXT,
            is_unreleased INTEGER NOT NULL DEFAULT 0,
            times_played INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            UNIQUE(title_normalized, artist_name_normalized)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tracks_title_lower ON tracks(title_lower)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_track_aliases_table(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS track_aliases (
            track_id TEXT NOT NULL REFERENCES tracks(guid) ON DELETE CASCADE,
            title_alias TEXT NOT NULL,
            title_alias_normalized TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(track_id, title_alias_normalized)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_track_aliases_normalized ON track_aliases(title_alias_normalized)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
