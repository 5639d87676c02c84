use crate::db::schema::{SQLITE_INIT, SQLITE_SEED};
use crate::error::SubtrackError;
use crate::types::feature::{DARK_MODE, KNOWN_FLAGS, NOTIFICATIONS};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;

pub type SqlitePool = Pool<Sqlite>;

/// Handle over the SQLite pool. Query methods live next to the tables they
/// touch (`catalog.rs`, `users.rs`, `subscriptions.rs`, ...).
#[derive(Clone)]
pub struct Storage {
    pub(super) pool: SqlitePool,
}

impl Storage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database and bring the schema up.
    pub async fn connect(database_url: &str) -> Result<Self, SubtrackError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        info!(database_url, "storage ready");
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema and catalog seed by executing the bundled SQL.
    pub async fn init_schema(&self) -> Result<(), SubtrackError> {
        // sqlx::query runs one statement at a time
        for block in [SQLITE_INIT, SQLITE_SEED] {
            for stmt in block.split(';') {
                let s = stmt.trim();
                if s.is_empty() {
                    continue;
                }
                sqlx::query(s).execute(&self.pool).await?;
            }
        }
        self.seed_global_flags().await
    }

    async fn seed_global_flags(&self) -> Result<(), SubtrackError> {
        for name in KNOWN_FLAGS {
            let enabled = name == DARK_MODE || name == NOTIFICATIONS;
            sqlx::query(
                "INSERT OR IGNORE INTO feature_flags (id, name, is_enabled) VALUES (?, ?, ?)",
            )
            .bind(format!("flag-{name}"))
            .bind(name)
            .bind(enabled)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}
