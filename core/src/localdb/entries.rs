// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use davsync_entity::{EntityKind, decode};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::LocalStorageError;
use crate::local::{LocalEntry, LocalId};
use crate::resource::Resource;

const COLUMNS: &str = "id, name, etag, dirty, deleted, data";

/// Which entries a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Live,
    Dirty,
    Deleted,
}

impl Filter {
    const fn condition(self) -> &'static str {
        match self {
            Self::Live => "deleted = 0",
            Self::Dirty => "deleted = 0 AND dirty = 1",
            Self::Deleted => "deleted = 1",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entries {
    pool: SqlitePool,
    collection_id: i64,
}

impl Entries {
    pub fn new(pool: SqlitePool, collection_id: i64) -> Self {
        Self {
            pool,
            collection_id,
        }
    }

    pub async fn list(&self, filter: Filter) -> Result<Vec<EntryRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM entries WHERE collection_id = ? AND {} ORDER BY id;",
            filter.condition()
        );

        sqlx::query_as(&sql)
            .bind(self.collection_id)
            .fetch_all(&self.pool)
            .await
    }

    /// Gets a live entry.
    pub async fn get(&self, id: LocalId) -> Result<Option<EntryRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM entries WHERE id = ? AND collection_id = ? AND deleted = 0;"
        );

        sqlx::query_as(&sql)
            .bind(id)
            .bind(self.collection_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Inserts a dirty entry that was never uploaded.
    pub async fn insert_new(&self, resource: &Resource) -> Result<LocalId, sqlx::Error> {
        const SQL: &str = "
INSERT INTO entries (collection_id, name, uid, etag, dirty, deleted, data)
VALUES (?, ?, ?, NULL, 1, 0, ?)
RETURNING id;
";

        sqlx::query_scalar(SQL)
            .bind(self.collection_id)
            .bind(&resource.name)
            .bind(resource.uid())
            .bind(resource.encode())
            .fetch_one(&self.pool)
            .await
    }

    /// Replaces the payload of a live entry and flags it dirty.
    pub async fn edit(&self, id: LocalId, resource: &Resource) -> Result<bool, sqlx::Error> {
        const SQL: &str = "
UPDATE entries
SET uid = ?, data = ?, dirty = 1
WHERE id = ? AND collection_id = ? AND deleted = 0;
";

        let result = sqlx::query(SQL)
            .bind(resource.uid())
            .bind(resource.encode())
            .bind(id)
            .bind(self.collection_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Turns a live entry into a tombstone.
    pub async fn mark_deleted(&self, id: LocalId) -> Result<bool, sqlx::Error> {
        const SQL: &str = "
UPDATE entries
SET deleted = 1
WHERE id = ? AND collection_id = ? AND deleted = 0;
";

        let result = sqlx::query(SQL)
            .bind(id)
            .bind(self.collection_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn stats(&self) -> Result<CollectionStats, sqlx::Error> {
        const SQL: &str = "
SELECT
    COALESCE(SUM(CASE WHEN deleted = 0 THEN 1 ELSE 0 END), 0) AS live,
    COALESCE(SUM(CASE WHEN deleted = 0 AND dirty = 1 THEN 1 ELSE 0 END), 0) AS dirty,
    COALESCE(SUM(CASE WHEN deleted = 1 THEN 1 ELSE 0 END), 0) AS deleted
FROM entries
WHERE collection_id = ?;
";

        sqlx::query_as(SQL)
            .bind(self.collection_id)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn remove(&self, id: LocalId) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        delete(&mut conn, self.collection_id, id).await
    }
}

/// Inserts an entry, replacing any entry of the same name.
pub async fn upsert(
    conn: &mut SqliteConnection,
    collection_id: i64,
    resource: &Resource,
    dirty: bool,
) -> Result<(), sqlx::Error> {
    const SQL: &str = "
INSERT INTO entries (collection_id, name, uid, etag, dirty, deleted, data)
VALUES (?, ?, ?, ?, ?, 0, ?)
ON CONFLICT(collection_id, name) DO UPDATE SET
    uid = excluded.uid,
    etag = excluded.etag,
    dirty = excluded.dirty,
    deleted = 0,
    data = excluded.data;
";

    sqlx::query(SQL)
        .bind(collection_id)
        .bind(&resource.name)
        .bind(resource.uid())
        .bind(resource.etag.as_deref())
        .bind(dirty)
        .bind(resource.encode())
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Overwrites an entry by id. Returns `false` if it no longer exists.
pub async fn overwrite(
    conn: &mut SqliteConnection,
    collection_id: i64,
    id: LocalId,
    resource: &Resource,
    dirty: bool,
) -> Result<bool, sqlx::Error> {
    const SQL: &str = "
UPDATE entries
SET uid = ?, etag = ?, dirty = ?, deleted = 0, data = ?
WHERE id = ? AND collection_id = ?;
";

    let result = sqlx::query(SQL)
        .bind(resource.uid())
        .bind(resource.etag.as_deref())
        .bind(dirty)
        .bind(resource.encode())
        .bind(id)
        .bind(collection_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(
    conn: &mut SqliteConnection,
    collection_id: i64,
    id: LocalId,
) -> Result<(), sqlx::Error> {
    const SQL: &str = "DELETE FROM entries WHERE id = ? AND collection_id = ?;";

    sqlx::query(SQL)
        .bind(id)
        .bind(collection_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Deletes clean entries and tombstones whose name is not in `keep`.
/// Returns the number of deleted entries.
pub async fn delete_all_except(
    conn: &mut SqliteConnection,
    collection_id: i64,
    keep: &HashSet<String>,
) -> Result<usize, sqlx::Error> {
    const SQL: &str = "SELECT id, name, dirty, deleted FROM entries WHERE collection_id = ?;";

    let rows: Vec<(i64, String, bool, bool)> = sqlx::query_as(SQL)
        .bind(collection_id)
        .fetch_all(&mut *conn)
        .await?;

    let mut count = 0;
    for (id, name, dirty, deleted) in rows {
        if keep.contains(&name) || (dirty && !deleted) {
            continue;
        }
        delete(conn, collection_id, id).await?;
        count += 1;
    }
    Ok(count)
}

pub async fn mark_synced(
    conn: &mut SqliteConnection,
    collection_id: i64,
    id: LocalId,
    etag: Option<&str>,
) -> Result<(), sqlx::Error> {
    const SQL: &str = "UPDATE entries SET dirty = 0, etag = ? WHERE id = ? AND collection_id = ?;";

    sqlx::query(SQL)
        .bind(etag)
        .bind(id)
        .bind(collection_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Drops the pending change of an entry. The tag is cleared so the next
/// pass fetches the server version.
pub async fn discard(
    conn: &mut SqliteConnection,
    collection_id: i64,
    id: LocalId,
) -> Result<(), sqlx::Error> {
    const SQL: &str = "
UPDATE entries
SET dirty = 0, deleted = 0, etag = NULL
WHERE id = ? AND collection_id = ?;
";

    sqlx::query(SQL)
        .bind(id)
        .bind(collection_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntryRecord {
    pub id: i64,
    pub name: String,
    pub etag: Option<String>,
    pub dirty: bool,
    pub deleted: bool,
    pub data: String,
}

impl EntryRecord {
    pub fn into_entry(self, kind: EntityKind) -> Result<LocalEntry, LocalStorageError> {
        let entity = decode(&self.data, kind)
            .map_err(|e| LocalStorageError::Corrupt(format!("entry {}: {e}", self.id)))?;

        Ok(LocalEntry {
            local_id: self.id,
            resource: Resource::new(self.name, self.etag, entity),
            dirty: self.dirty,
            deleted: self.deleted,
        })
    }
}

/// Entry counts of one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct CollectionStats {
    /// Entries that are not tombstones.
    pub live: i64,
    /// Live entries awaiting upload.
    pub dirty: i64,
    /// Tombstones awaiting remote deletion.
    pub deleted: i64,
}
