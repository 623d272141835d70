// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory remote collection.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use davsync_core::{
    MultiGetResponse, RemoteCollection, RemoteItem, RemoteMember, SyncError,
};

/// Server state behind a [`MemoryRemote`].
#[derive(Debug, Default)]
pub struct RemoteState {
    /// Member name to (etag, body).
    pub members: BTreeMap<String, (String, String)>,
    /// Bumped on every change, the collection tag is derived from it.
    pub version: u64,
    pub supports_ctag: bool,

    /// Writes to these names fail with a precondition error.
    pub conflict_on: HashSet<String>,
    /// Writes to these names are refused.
    pub reject_on: HashSet<String>,
    /// Multiget silently omits these names.
    pub drop_from_multiget: HashSet<String>,
    /// Listing fails with a transport error.
    pub fail_listing: bool,

    pub list_calls: usize,
    pub multi_get_calls: usize,
    /// Every upload as (name, expected etag).
    pub puts: Vec<(String, Option<String>)>,
    /// Every deletion as (name, expected etag).
    pub deletes: Vec<(String, Option<String>)>,
}

impl RemoteState {
    fn bump(&mut self) -> String {
        self.version += 1;
        format!("\"{}\"", self.version)
    }
}

/// Remote collection kept in memory. Tags are quoted version numbers.
#[derive(Debug)]
pub struct MemoryRemote {
    state: Mutex<RemoteState>,
}

#[allow(dead_code)]
impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RemoteState {
                supports_ctag: true,
                ..Default::default()
            }),
        }
    }

    /// A server that does not report a collection tag.
    pub fn without_ctag() -> Self {
        Self {
            state: Mutex::new(RemoteState::default()),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().expect("remote state lock poisoned")
    }

    /// Stores a member as another client would and returns its new tag.
    pub fn insert(&self, name: &str, body: impl Into<String>) -> String {
        let mut state = self.state();
        let etag = state.bump();
        state
            .members
            .insert(name.to_string(), (etag.clone(), body.into()));
        etag
    }

    /// Removes a member as another client would.
    pub fn remove(&self, name: &str) {
        let mut state = self.state();
        state.members.remove(name);
        state.bump();
    }

    pub fn body(&self, name: &str) -> Option<String> {
        self.state().members.get(name).map(|(_, body)| body.clone())
    }

    pub fn etag(&self, name: &str) -> Option<String> {
        self.state().members.get(name).map(|(etag, _)| etag.clone())
    }

    pub fn names(&self) -> Vec<String> {
        self.state().members.keys().cloned().collect()
    }

    fn check_write(state: &RemoteState, name: &str) -> Result<(), SyncError> {
        if state.conflict_on.contains(name) {
            return Err(SyncError::Conflict(name.to_string()));
        }
        if state.reject_on.contains(name) {
            return Err(SyncError::Rejected {
                status: 403,
                message: "read only".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteCollection for MemoryRemote {
    async fn fetch_ctag(&self) -> Result<Option<String>, SyncError> {
        let state = self.state();
        Ok(state
            .supports_ctag
            .then(|| format!("ctag-{}", state.version)))
    }

    async fn list_members(&self) -> Result<Vec<RemoteMember>, SyncError> {
        let mut state = self.state();
        state.list_calls += 1;
        if state.fail_listing {
            return Err(SyncError::Transport("connection reset".to_string()));
        }
        Ok(state
            .members
            .iter()
            .map(|(name, (etag, _))| RemoteMember {
                name: name.clone(),
                etag: Some(etag.clone()),
            })
            .collect())
    }

    async fn multi_get(&self, names: &[String]) -> Result<MultiGetResponse, SyncError> {
        let mut state = self.state();
        state.multi_get_calls += 1;

        let mut response = MultiGetResponse::default();
        for name in names {
            if state.drop_from_multiget.contains(name) {
                response.missing.push(name.clone());
                continue;
            }
            match state.members.get(name) {
                Some((etag, body)) => response.found.push(RemoteItem {
                    name: name.clone(),
                    etag: Some(etag.clone()),
                    data: body.clone(),
                }),
                None => response.missing.push(name.clone()),
            }
        }
        Ok(response)
    }

    async fn put(
        &self,
        name: &str,
        body: String,
        expected_etag: Option<&str>,
    ) -> Result<Option<String>, SyncError> {
        let mut state = self.state();
        state
            .puts
            .push((name.to_string(), expected_etag.map(str::to_string)));
        Self::check_write(&state, name)?;

        let current = state.members.get(name).map(|(etag, _)| etag.as_str());
        match (expected_etag, current) {
            (None, None) => {}
            (Some(expected), Some(current)) if expected == current => {}
            _ => return Err(SyncError::Conflict(name.to_string())),
        }

        let etag = state.bump();
        state
            .members
            .insert(name.to_string(), (etag.clone(), body));
        Ok(Some(etag))
    }

    async fn delete(&self, name: &str, expected_etag: Option<&str>) -> Result<(), SyncError> {
        let mut state = self.state();
        state
            .deletes
            .push((name.to_string(), expected_etag.map(str::to_string)));
        Self::check_write(&state, name)?;

        let current = state.members.get(name).map(|(etag, _)| etag.as_str());
        match (expected_etag, current) {
            (_, None) => return Ok(()),
            (Some(expected), Some(current)) if expected != current => {
                return Err(SyncError::Conflict(name.to_string()));
            }
            _ => {}
        }

        state.members.remove(name);
        state.bump();
        Ok(())
    }
}
