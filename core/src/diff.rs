// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Comparison of a remote listing against local state.

use std::collections::{HashMap, HashSet};

use crate::local::{LocalEntry, LocalId};
use crate::remote::RemoteMember;

/// What a full pass has to do to reconcile both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Remote members without a local entry.
    pub inserts: Vec<String>,

    /// Remote members whose tag differs from the local one, mapped to the
    /// local entry they overwrite. Covers dirty entries and tombstones too,
    /// since the server version wins.
    pub updates: HashMap<String, LocalId>,

    /// Clean local entries whose member is gone from the server.
    pub remote_deletions: Vec<LocalId>,

    /// Tombstones whose member is already gone from the server.
    pub purged_tombstones: Vec<LocalId>,

    /// Dirty local entries whose member is gone from the server. They are
    /// uploaded as new members.
    pub recreate: HashSet<String>,

    /// Every name the server listed.
    pub remote_names: HashSet<String>,
}

impl ChangeSet {
    /// Compares the remote listing with live local entries and tombstones.
    pub fn compute(
        remote: &[RemoteMember],
        live: &[LocalEntry],
        tombstones: &[LocalEntry],
    ) -> Self {
        let local: HashMap<&str, &LocalEntry> = live
            .iter()
            .chain(tombstones)
            .map(|e| (e.resource.name.as_str(), e))
            .collect();

        let mut changes = Self::default();
        for member in remote {
            changes.remote_names.insert(member.name.clone());
            match local.get(member.name.as_str()) {
                None => changes.inserts.push(member.name.clone()),
                Some(entry) if is_stale(entry, member) => {
                    changes.updates.insert(member.name.clone(), entry.local_id);
                }
                Some(_) => {}
            }
        }

        for entry in live {
            if changes.remote_names.contains(&entry.resource.name) {
                continue;
            }
            if entry.dirty {
                changes.recreate.insert(entry.resource.name.clone());
            } else {
                changes.remote_deletions.push(entry.local_id);
            }
        }

        changes.purged_tombstones = tombstones
            .iter()
            .filter(|e| !changes.remote_names.contains(&e.resource.name))
            .map(|e| e.local_id)
            .collect();

        changes
    }

    /// Names whose bodies must be fetched, inserts first.
    pub fn to_fetch(&self) -> Vec<String> {
        let mut updates: Vec<&String> = self.updates.keys().collect();
        updates.sort();
        self.inserts
            .iter()
            .chain(updates)
            .cloned()
            .collect()
    }

    /// The local entry a fetched member overwrites, if any.
    pub fn target(&self, name: &str) -> Option<LocalId> {
        self.updates.get(name).copied()
    }

    /// Whether local entries have to be removed.
    pub fn has_removals(&self) -> bool {
        !self.remote_deletions.is_empty() || !self.purged_tombstones.is_empty()
    }
}

/// A missing remote tag counts as changed.
fn is_stale(entry: &LocalEntry, member: &RemoteMember) -> bool {
    member.etag.is_none() || entry.resource.etag != member.etag
}
