//! SQLite persistence for the canonical catalog
//!
//! - [`schema`]: connection setup and table creation
//! - [`sqlite_store`]: [`SqliteStore`], the sqlx-backed [`crate::store::CanonicalStore`]

pub mod schema;
pub mod sqlite_store;

pub use schema::{create_schema, open_database};
pub use sqlite_store::SqliteStore;
