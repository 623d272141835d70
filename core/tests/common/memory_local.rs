// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory local collection.

use std::collections::BTreeMap;

use async_trait::async_trait;
use davsync_core::{
    LocalChange, LocalCollection, LocalEntry, LocalId, LocalStorageError, Resource,
};
use davsync_entity::{Entity, EntityKind};

/// Local collection kept in a map. Commits apply to a copy that replaces the
/// map only if every change succeeded.
#[derive(Debug)]
pub struct MemoryLocal {
    kind: EntityKind,
    entries: BTreeMap<LocalId, LocalEntry>,
    ctag: Option<String>,
    next_id: LocalId,
    staged: Vec<LocalChange>,

    /// Entry mutations applied by commits, collection tag writes excluded.
    pub mutations: usize,
    /// Fail the next commit with a storage error.
    pub fail_next_commit: bool,
}

#[allow(dead_code)]
impl MemoryLocal {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
            ctag: None,
            next_id: 1,
            staged: Vec::new(),
            mutations: 0,
            fail_next_commit: false,
        }
    }

    /// Creates an entry the way a device edit would.
    pub fn create(&mut self, entity: Entity) -> LocalEntry {
        let entry = LocalEntry {
            local_id: self.next_id,
            resource: Resource::initialize(entity),
            dirty: true,
            deleted: false,
        };
        self.next_id += 1;
        self.entries.insert(entry.local_id, entry.clone());
        entry
    }

    /// Replaces the entity of a live entry and flags it dirty.
    pub fn edit(&mut self, name: &str, mut entity: Entity) {
        let entry = self
            .entries
            .values_mut()
            .find(|e| e.resource.name == name && !e.deleted)
            .expect("entry to edit should exist");
        entity.set_uid(entry.resource.uid());
        entry.resource.entity = entity;
        entry.dirty = true;
    }

    /// Deletes an entry, leaving a tombstone if it was uploaded before.
    pub fn remove(&mut self, name: &str) {
        let (id, etag) = self
            .entries
            .values()
            .find(|e| e.resource.name == name && !e.deleted)
            .map(|e| (e.local_id, e.resource.etag.clone()))
            .expect("entry to remove should exist");
        if etag.is_some() {
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.deleted = true;
            }
        } else {
            self.entries.remove(&id);
        }
    }

    /// Looks up any entry, tombstones included.
    pub fn find(&self, name: &str) -> Option<&LocalEntry> {
        self.entries.values().find(|e| e.resource.name == name)
    }

    /// Names of live entries, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .values()
            .filter(|e| !e.deleted)
            .map(|e| e.resource.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn ctag(&self) -> Option<&str> {
        self.ctag.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn filtered(&self, pred: impl Fn(&LocalEntry) -> bool) -> Vec<LocalEntry> {
        self.entries.values().filter(|e| pred(e)).cloned().collect()
    }

    fn apply(
        &mut self,
        entries: &mut BTreeMap<LocalId, LocalEntry>,
        ctag: &mut Option<String>,
        change: LocalChange,
    ) -> Result<(), LocalStorageError> {
        match change {
            LocalChange::Insert { resource, dirty } => {
                let existing = entries
                    .values()
                    .find(|e| e.resource.name == resource.name)
                    .map(|e| e.local_id);
                let local_id = existing.unwrap_or_else(|| {
                    let id = self.next_id;
                    self.next_id += 1;
                    id
                });
                entries.insert(
                    local_id,
                    LocalEntry {
                        local_id,
                        resource,
                        dirty,
                        deleted: false,
                    },
                );
            }
            LocalChange::Update {
                local_id,
                resource,
                dirty,
            } => {
                let entry = entries
                    .get_mut(&local_id)
                    .ok_or(LocalStorageError::NotFound(local_id))?;
                entry.resource = resource;
                entry.dirty = dirty;
                entry.deleted = false;
            }
            LocalChange::Delete(local_id) => {
                entries.remove(&local_id);
            }
            LocalChange::DeleteAllExcept(keep) => {
                entries.retain(|_, e| keep.contains(&e.resource.name) || (e.dirty && !e.deleted));
            }
            LocalChange::MarkSynced { local_id, etag } => {
                let entry = entries
                    .get_mut(&local_id)
                    .ok_or(LocalStorageError::NotFound(local_id))?;
                entry.dirty = false;
                entry.resource.etag = etag;
            }
            LocalChange::Discard(local_id) => {
                let entry = entries
                    .get_mut(&local_id)
                    .ok_or(LocalStorageError::NotFound(local_id))?;
                entry.dirty = false;
                entry.deleted = false;
                entry.resource.etag = None;
            }
            LocalChange::SetCTag(value) => {
                *ctag = value;
                return Ok(());
            }
        }
        self.mutations += 1;
        Ok(())
    }
}

#[async_trait]
impl LocalCollection for MemoryLocal {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    async fn list_all(&self) -> Result<Vec<LocalEntry>, LocalStorageError> {
        Ok(self.filtered(|e| !e.deleted))
    }

    async fn list_dirty(&self) -> Result<Vec<LocalEntry>, LocalStorageError> {
        Ok(self.filtered(|e| e.dirty && !e.deleted))
    }

    async fn list_deleted(&self) -> Result<Vec<LocalEntry>, LocalStorageError> {
        Ok(self.filtered(|e| e.deleted))
    }

    async fn get_ctag(&self) -> Result<Option<String>, LocalStorageError> {
        Ok(self.ctag.clone())
    }

    fn stage(&mut self, change: LocalChange) {
        self.staged.push(change);
    }

    async fn commit(&mut self) -> Result<(), LocalStorageError> {
        let changes = std::mem::take(&mut self.staged);
        if self.fail_next_commit {
            self.fail_next_commit = false;
            return Err(LocalStorageError::Corrupt("injected failure".to_string()));
        }

        let mutations = self.mutations;
        let next_id = self.next_id;
        let mut entries = self.entries.clone();
        let mut ctag = self.ctag.clone();
        for change in changes {
            if let Err(err) = self.apply(&mut entries, &mut ctag, change) {
                self.mutations = mutations;
                self.next_id = next_id;
                return Err(err);
            }
        }

        self.entries = entries;
        self.ctag = ctag;
        Ok(())
    }
}
