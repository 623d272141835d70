// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use davsync_entity::EntityKind;
use jiff::Timestamp;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::LocalStorageError;

#[derive(Debug, Clone)]
pub struct Collections {
    pool: SqlitePool,
}

impl Collections {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the collection stored under `url`, creating it if needed.
    pub async fn get_or_insert(
        &self,
        url: &str,
        kind: EntityKind,
    ) -> Result<CollectionRecord, LocalStorageError> {
        const SQL: &str = "
INSERT INTO collections (url, kind)
VALUES (?, ?)
ON CONFLICT(url) DO NOTHING;
";

        sqlx::query(SQL)
            .bind(url)
            .bind(kind.as_ref())
            .execute(&self.pool)
            .await?;

        let record = self
            .get_by_url(url)
            .await?
            .ok_or_else(|| LocalStorageError::Corrupt(format!("collection {url} vanished")))?;

        let stored = record.kind()?;
        if stored != kind {
            return Err(LocalStorageError::WrongKind {
                expected: kind,
                actual: stored,
            });
        }
        Ok(record)
    }

    pub async fn get(&self, id: i64) -> Result<Option<CollectionRecord>, sqlx::Error> {
        const SQL: &str = "
SELECT id, url, kind, display_name, ctag, last_synced
FROM collections
WHERE id = ?;
";

        sqlx::query_as(SQL).bind(id).fetch_optional(&self.pool).await
    }

    pub async fn get_by_url(&self, url: &str) -> Result<Option<CollectionRecord>, sqlx::Error> {
        const SQL: &str = "
SELECT id, url, kind, display_name, ctag, last_synced
FROM collections
WHERE url = ?;
";

        sqlx::query_as(SQL).bind(url).fetch_optional(&self.pool).await
    }

    pub async fn list(&self) -> Result<Vec<CollectionRecord>, sqlx::Error> {
        const SQL: &str = "
SELECT id, url, kind, display_name, ctag, last_synced
FROM collections
ORDER BY url;
";

        sqlx::query_as(SQL).fetch_all(&self.pool).await
    }

    pub async fn set_display_name(&self, id: i64, name: Option<&str>) -> Result<(), sqlx::Error> {
        const SQL: &str = "UPDATE collections SET display_name = ? WHERE id = ?;";

        sqlx::query(SQL)
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Stores the collection tag together with the time of the pass.
pub async fn set_ctag(
    conn: &mut SqliteConnection,
    id: i64,
    ctag: Option<&str>,
) -> Result<(), sqlx::Error> {
    const SQL: &str = "UPDATE collections SET ctag = ?, last_synced = ? WHERE id = ?;";

    sqlx::query(SQL)
        .bind(ctag)
        .bind(Timestamp::now().to_string())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// A collection as stored locally.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRecord {
    /// Row id.
    pub id: i64,
    /// Server path of the collection.
    pub url: String,
    kind: String,
    /// Display name fetched from the server.
    pub display_name: Option<String>,
    /// Collection tag stored by the last clean pass.
    pub ctag: Option<String>,
    last_synced: Option<String>,
}

impl CollectionRecord {
    /// The kind of entities held by the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored kind is unknown.
    pub fn kind(&self) -> Result<EntityKind, LocalStorageError> {
        self.kind
            .parse()
            .map_err(|_| LocalStorageError::Corrupt(format!("unknown kind: {}", self.kind)))
    }

    /// When the collection tag was last stored.
    pub fn last_synced(&self) -> Option<Timestamp> {
        self.last_synced.as_deref().and_then(|s| s.parse().ok())
    }
}
