// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use davsync_entity::{Entity, EntityKind};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::LocalStorageError;
use crate::local::{LocalChange, LocalCollection, LocalEntry, LocalId};
use crate::localdb::collections::{self, CollectionRecord, Collections};
use crate::localdb::entries::{self, CollectionStats, Entries, Filter};
use crate::resource::Resource;

/// A collection persisted in the local SQLite database.
///
/// Besides the [`LocalCollection`] contract used by the sync engine, it
/// offers the editing API for the device side: [`SqliteCollection::create`],
/// [`SqliteCollection::update`] and [`SqliteCollection::remove`] apply
/// immediately and flag the entry for upload.
#[derive(Debug)]
pub struct SqliteCollection {
    id: i64,
    url: String,
    kind: EntityKind,
    pool: SqlitePool,
    collections: Collections,
    entries: Entries,
    staged: Vec<LocalChange>,
}

impl SqliteCollection {
    pub(crate) fn new(pool: SqlitePool, record: &CollectionRecord, kind: EntityKind) -> Self {
        Self {
            id: record.id,
            url: record.url.clone(),
            kind,
            collections: Collections::new(pool.clone()),
            entries: Entries::new(pool.clone(), record.id),
            pool,
            staged: Vec::new(),
        }
    }

    /// Server path of the collection.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Adds a new entity. It gets a fresh UID and member name and is uploaded
    /// on the next pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity kind does not match the collection or
    /// the database fails.
    pub async fn create(&self, entity: Entity) -> Result<LocalEntry, LocalStorageError> {
        self.check_kind(&entity)?;
        let resource = Resource::initialize(entity);
        let local_id = self.entries.insert_new(&resource).await?;
        tracing::debug!(local_id, name = %resource.name, "created entry");
        Ok(LocalEntry {
            local_id,
            resource,
            dirty: true,
            deleted: false,
        })
    }

    /// Replaces the content of a live entry. The UID and member name are kept.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStorageError::NotFound`] if there is no live entry with
    /// this id.
    pub async fn update(
        &self,
        local_id: LocalId,
        mut entity: Entity,
    ) -> Result<LocalEntry, LocalStorageError> {
        self.check_kind(&entity)?;
        let current = self
            .get(local_id)
            .await?
            .ok_or(LocalStorageError::NotFound(local_id))?;

        entity.set_uid(current.resource.uid());
        let resource = Resource::new(current.resource.name, current.resource.etag, entity);
        if !self.entries.edit(local_id, &resource).await? {
            return Err(LocalStorageError::NotFound(local_id));
        }

        tracing::debug!(local_id, "updated entry");
        Ok(LocalEntry {
            local_id,
            resource,
            dirty: true,
            deleted: false,
        })
    }

    /// Deletes an entry. Entries that were uploaded before become tombstones
    /// until the deletion reaches the server; others are removed right away.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStorageError::NotFound`] if there is no live entry with
    /// this id.
    pub async fn remove(&self, local_id: LocalId) -> Result<(), LocalStorageError> {
        let current = self
            .get(local_id)
            .await?
            .ok_or(LocalStorageError::NotFound(local_id))?;

        if current.resource.etag.is_none() {
            self.entries.remove(local_id).await?;
            tracing::debug!(local_id, "purged never uploaded entry");
        } else if self.entries.mark_deleted(local_id).await? {
            tracing::debug!(local_id, "marked entry deleted");
        } else {
            return Err(LocalStorageError::NotFound(local_id));
        }
        Ok(())
    }

    /// Gets a live entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails or the stored payload is corrupt.
    pub async fn get(&self, local_id: LocalId) -> Result<Option<LocalEntry>, LocalStorageError> {
        self.entries
            .get(local_id)
            .await?
            .map(|r| r.into_entry(self.kind))
            .transpose()
    }

    /// Entry counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn stats(&self) -> Result<CollectionStats, LocalStorageError> {
        Ok(self.entries.stats().await?)
    }

    /// The stored collection row, including display name and last sync time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn record(&self) -> Result<CollectionRecord, LocalStorageError> {
        self.collections
            .get(self.id)
            .await?
            .ok_or_else(|| LocalStorageError::Corrupt(format!("collection {} vanished", self.url)))
    }

    /// Stores the display name reported by the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn set_display_name(&self, name: Option<&str>) -> Result<(), LocalStorageError> {
        Ok(self.collections.set_display_name(self.id, name).await?)
    }

    fn check_kind(&self, entity: &Entity) -> Result<(), LocalStorageError> {
        if entity.kind() == self.kind {
            Ok(())
        } else {
            Err(LocalStorageError::WrongKind {
                expected: self.kind,
                actual: entity.kind(),
            })
        }
    }

    async fn list(&self, filter: Filter) -> Result<Vec<LocalEntry>, LocalStorageError> {
        self.entries
            .list(filter)
            .await?
            .into_iter()
            .map(|r| r.into_entry(self.kind))
            .collect()
    }

    async fn apply(
        &self,
        conn: &mut SqliteConnection,
        change: &LocalChange,
    ) -> Result<(), sqlx::Error> {
        match change {
            LocalChange::Insert { resource, dirty } => {
                entries::upsert(conn, self.id, resource, *dirty).await?;
            }
            LocalChange::Update {
                local_id,
                resource,
                dirty,
            } => {
                if !entries::overwrite(conn, self.id, *local_id, resource, *dirty).await? {
                    tracing::debug!(local_id, "entry vanished, inserting instead");
                    entries::upsert(conn, self.id, resource, *dirty).await?;
                }
            }
            LocalChange::Delete(local_id) => entries::delete(conn, self.id, *local_id).await?,
            LocalChange::DeleteAllExcept(keep) => {
                let count = entries::delete_all_except(conn, self.id, keep).await?;
                tracing::debug!(count, "removed entries missing on the server");
            }
            LocalChange::MarkSynced { local_id, etag } => {
                entries::mark_synced(conn, self.id, *local_id, etag.as_deref()).await?;
            }
            LocalChange::Discard(local_id) => entries::discard(conn, self.id, *local_id).await?,
            LocalChange::SetCTag(ctag) => {
                collections::set_ctag(conn, self.id, ctag.as_deref()).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LocalCollection for SqliteCollection {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    async fn list_all(&self) -> Result<Vec<LocalEntry>, LocalStorageError> {
        self.list(Filter::Live).await
    }

    async fn list_dirty(&self) -> Result<Vec<LocalEntry>, LocalStorageError> {
        self.list(Filter::Dirty).await
    }

    async fn list_deleted(&self) -> Result<Vec<LocalEntry>, LocalStorageError> {
        self.list(Filter::Deleted).await
    }

    async fn get_ctag(&self) -> Result<Option<String>, LocalStorageError> {
        Ok(self.record().await?.ctag)
    }

    fn stage(&mut self, change: LocalChange) {
        self.staged.push(change);
    }

    #[tracing::instrument(skip_all, fields(collection = %self.url, count = self.staged.len()))]
    async fn commit(&mut self) -> Result<(), LocalStorageError> {
        let changes = std::mem::take(&mut self.staged);
        if changes.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for change in &changes {
            self.apply(&mut *tx, change).await?;
        }
        tx.commit().await?;

        tracing::debug!("committed staged changes");
        Ok(())
    }
}
