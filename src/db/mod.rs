//! Database module: models, schema and queries for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and request payloads
//! - `schema.rs`: SQL DDL and catalog seed (SQLite-first)
//! - `sqlite.rs`: the `Storage` handle and schema bootstrap
//! - one file of `impl Storage` queries per table group

pub mod auth;
pub mod catalog;
pub mod feature_flags;
pub mod models;
pub mod notifications;
pub mod schema;
pub mod sqlite;
pub mod subscriptions;
pub mod users;

pub use notifications::NewNotification;
pub use schema::{SQLITE_INIT, SQLITE_SEED};
pub use sqlite::{SqlitePool, Storage};

/// Open the database at `database_url` and initialize schema and seed.
pub async fn connect(database_url: &str) -> Result<Storage, crate::error::SubtrackError> {
    Storage::connect(database_url).await
}
