// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use async_trait::async_trait;
use davsync_entity::EntityKind;

use crate::error::LocalStorageError;
use crate::resource::Resource;

/// Identifier of an entry in a local store.
pub type LocalId = i64;

/// A resource as held by the local store, with its change flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    /// Store specific identifier, stable for the lifetime of the entry.
    pub local_id: LocalId,

    /// The resource itself.
    pub resource: Resource,

    /// Modified locally since the last successful sync.
    pub dirty: bool,

    /// Deleted locally but not yet deleted on the server (a tombstone).
    pub deleted: bool,
}

/// A mutation queued on a [`LocalCollection`] until the next commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalChange {
    /// Add an entry. An existing entry with the same name is replaced.
    Insert {
        /// The new resource.
        resource: Resource,
        /// Whether the entry still has to be uploaded.
        dirty: bool,
    },

    /// Overwrite an entry, reviving it if it was a tombstone.
    Update {
        /// The entry to overwrite.
        local_id: LocalId,
        /// The new resource.
        resource: Resource,
        /// Whether the entry still has to be uploaded.
        dirty: bool,
    },

    /// Remove an entry for good.
    Delete(LocalId),

    /// Remove every clean entry and every tombstone whose name is not listed.
    /// Dirty live entries survive.
    DeleteAllExcept(HashSet<String>),

    /// Record a successful upload: clear the dirty flag and store the new tag.
    MarkSynced {
        /// The uploaded entry.
        local_id: LocalId,
        /// Tag returned by the server, if any.
        etag: Option<String>,
    },

    /// Drop the pending local change so the entry is fetched again.
    Discard(LocalId),

    /// Store the collection tag observed at the start of the pass.
    SetCTag(Option<String>),
}

/// The device side of a collection.
///
/// Reads see committed state only. Mutations are staged with
/// [`LocalCollection::stage`] (or one of the helpers built on it) and become
/// visible together on [`LocalCollection::commit`]: either all of them or
/// none.
#[async_trait]
pub trait LocalCollection: Send + Sync {
    /// The kind of entities held by this collection.
    fn kind(&self) -> EntityKind;

    /// Every entry that is not a tombstone.
    async fn list_all(&self) -> Result<Vec<LocalEntry>, LocalStorageError>;

    /// Live entries modified since the last sync.
    async fn list_dirty(&self) -> Result<Vec<LocalEntry>, LocalStorageError>;

    /// Tombstones awaiting remote deletion.
    async fn list_deleted(&self) -> Result<Vec<LocalEntry>, LocalStorageError>;

    /// The collection tag stored by the last clean pass.
    async fn get_ctag(&self) -> Result<Option<String>, LocalStorageError>;

    /// Queues a mutation.
    fn stage(&mut self, change: LocalChange);

    /// Applies every queued mutation atomically.
    ///
    /// On failure nothing becomes visible and the queue is dropped.
    async fn commit(&mut self) -> Result<(), LocalStorageError>;

    /// Queues a new clean entry received from the server.
    fn stage_insert(&mut self, resource: Resource) {
        self.stage(LocalChange::Insert {
            resource,
            dirty: false,
        });
    }

    /// Queues an overwrite of an entry with a version from the server.
    fn stage_update(&mut self, local_id: LocalId, resource: Resource) {
        self.stage(LocalChange::Update {
            local_id,
            resource,
            dirty: false,
        });
    }

    /// Queues removal of an entry.
    fn stage_delete(&mut self, local_id: LocalId) {
        self.stage(LocalChange::Delete(local_id));
    }

    /// Queues removal of clean entries and tombstones not in `names`.
    fn delete_all_except(&mut self, names: HashSet<String>) {
        self.stage(LocalChange::DeleteAllExcept(names));
    }

    /// Queues the bookkeeping after a successful upload.
    fn stage_mark_synced(&mut self, local_id: LocalId, etag: Option<String>) {
        self.stage(LocalChange::MarkSynced { local_id, etag });
    }

    /// Queues dropping the local change of an entry after a conflict.
    fn stage_discard(&mut self, local_id: LocalId) {
        self.stage(LocalChange::Discard(local_id));
    }

    /// Queues storing the collection tag.
    fn set_ctag(&mut self, ctag: Option<String>) {
        self.stage(LocalChange::SetCTag(ctag));
    }
}
