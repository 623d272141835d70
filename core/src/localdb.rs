// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

mod collections;
mod entries;
mod sqlite_collection;

use std::path::Path;
use std::time::Duration;

use davsync_entity::EntityKind;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

pub use crate::localdb::collections::CollectionRecord;
pub use crate::localdb::entries::CollectionStats;
pub use crate::localdb::sqlite_collection::SqliteCollection;

use crate::error::LocalStorageError;
use crate::localdb::collections::Collections;

/// The local store: one SQLite database holding every synchronized collection.
#[derive(Debug, Clone)]
pub struct LocalDb {
    pool: SqlitePool,
    collections: Collections,
}

impl LocalDb {
    /// Opens a sqlite database connection.
    /// If `filename` is `None`, it opens an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn open(filename: Option<&Path>) -> Result<Self, LocalStorageError> {
        let pool = if let Some(filename) = filename {
            tracing::info!(path = %filename.display(), "connecting to SQLite database");
            let path = filename
                .to_str()
                .ok_or_else(|| LocalStorageError::InvalidPath(filename.display().to_string()))?;
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5));
            SqlitePoolOptions::new().connect_with(options).await?
        } else {
            tracing::info!("connecting to in-memory SQLite database");
            // every connection would open its own empty database
            let options = SqliteConnectOptions::new().in_memory(true);
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("src/localdb/migrations") // relative path from the crate root
            .run(&pool)
            .await?;

        let collections = Collections::new(pool.clone());
        Ok(Self { pool, collections })
    }

    /// Opens the collection stored under `url`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStorageError::WrongKind`] if the collection exists with
    /// another kind.
    pub async fn collection(
        &self,
        url: &str,
        kind: EntityKind,
    ) -> Result<SqliteCollection, LocalStorageError> {
        let record = self.collections.get_or_insert(url, kind).await?;
        tracing::debug!(url, %kind, id = record.id, "opened collection");
        Ok(SqliteCollection::new(self.pool.clone(), &record, kind))
    }

    /// Every collection known locally, ordered by url.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn collections(&self) -> Result<Vec<CollectionRecord>, LocalStorageError> {
        Ok(self.collections.list().await?)
    }

    /// Closes every connection.
    pub async fn close(self) {
        tracing::debug!("closing database connection");
        self.pool.close().await;
    }
}
