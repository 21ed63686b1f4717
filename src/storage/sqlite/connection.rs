//! SQLite connection and schema management.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use super::helpers::map_sqlx_error;
use super::schema::DROP_ORDER;
use crate::models::Entity;
use crate::storage::{StorageError, StorageResult};

/// A change registered with [`crate::storage::Storage::new`] or
/// [`crate::storage::Storage::delete`] and not yet flushed.
#[derive(Debug, Clone)]
pub(super) enum Pending {
    Upsert(Entity),
    Delete(Entity),
}

/// SQLite-backed object storage.
///
/// Holds a single-connection pool for its whole lifetime. Changes are staged
/// in memory and written in one transaction by `save`.
pub struct SqliteStorage {
    pub(super) pool: SqlitePool,
    pub(super) pending: BTreeMap<String, Pending>,
    reset_on_open: bool,
}

impl SqliteStorage {
    /// Open (creating if needed) a database file.
    pub async fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        Self::connect(options).await
    }

    /// Create an in-memory database (useful for testing).
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Connection {
                message: e.to_string(),
            })?
            .foreign_keys(true);
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> StorageResult<Self> {
        // One long-lived connection: an in-memory database only exists for
        // the connection that created it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self {
            pool,
            pending: BTreeMap::new(),
            reset_on_open: false,
        })
    }

    /// Drop every table before the schema is first established. Used by
    /// test environments that need a clean database per run.
    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset_on_open = reset;
        self
    }

    /// Direct access to the pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create any missing tables.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("data/sql/sqlite")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Migration {
                message: e.to_string(),
            })
    }

    async fn drop_all(&self) -> StorageResult<()> {
        for table in DROP_ORDER {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }
        Ok(())
    }

    /// Establish the schema, dropping everything first when a reset was
    /// requested. The reset only happens once per instance.
    pub(super) async fn establish_schema(&mut self) -> StorageResult<()> {
        if self.reset_on_open {
            info!("Dropping all tables before establishing the schema");
            self.drop_all().await?;
            self.reset_on_open = false;
        }
        self.migrate().await
    }
}
