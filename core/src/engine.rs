// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Reconciliation of one local collection with one remote collection.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use davsync_entity::{EntityError, decode};

use crate::diff::ChangeSet;
use crate::error::SyncError;
use crate::local::{LocalChange, LocalCollection, LocalEntry};
use crate::remote::RemoteCollection;
use crate::resource::Resource;

/// Default number of members fetched per multiget request.
pub const DEFAULT_MULTIGET_BATCH_SIZE: usize = 30;

/// Tuning knobs for a sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct SyncConfig {
    /// Number of members fetched per multiget request.
    #[serde(default = "default_multiget_batch_size")]
    pub multiget_batch_size: usize,
}

const fn default_multiget_batch_size() -> usize {
    DEFAULT_MULTIGET_BATCH_SIZE
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            multiget_batch_size: DEFAULT_MULTIGET_BATCH_SIZE,
        }
    }
}

/// Steps of a sync pass, in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum SyncPhase {
    /// Nothing happened yet.
    #[default]
    Start,
    /// Comparing the stored collection tag with the server's.
    FastPathCheck,
    /// Listing members and comparing tags one by one.
    FullDiff,
    /// Downloading changed members.
    Fetch,
    /// Writing downloaded changes to the local store.
    ApplyLocal,
    /// Uploading local changes.
    PushLocal,
    /// Recording the collection tag.
    Finalize,
    /// The pass completed.
    Done,
    /// The pass stopped early.
    Aborted,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::FastPathCheck => "fast-path-check",
            Self::FullDiff => "full-diff",
            Self::Fetch => "fetch",
            Self::ApplyLocal => "apply-local",
            Self::PushLocal => "push-local",
            Self::Finalize => "finalize",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Overall outcome of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Every item was reconciled.
    Success,
    /// The pass completed but some items were skipped or rejected.
    Partial,
    /// The pass was aborted.
    Failure,
}

impl SyncStatus {
    /// Classifies the outcome of [`SyncEngine::sync`].
    pub fn of(result: &Result<SyncReport, SyncError>) -> Self {
        match result {
            Ok(report) => report.status(),
            Err(_) => Self::Failure,
        }
    }
}

/// An error confined to a single member.
#[derive(Debug)]
pub struct ItemError {
    /// Member name.
    pub name: String,
    /// What went wrong.
    pub error: SyncError,
}

/// Summary of a completed pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// The collection tag matched, so nothing was listed or fetched.
    pub fast_path: bool,
    /// Member bodies downloaded and decoded.
    pub fetched: usize,
    /// Local entries created from the server.
    pub inserted: usize,
    /// Local entries overwritten from the server.
    pub updated: usize,
    /// Local entries removed because their member is gone.
    pub deleted: usize,
    /// Uploads and remote deletions that succeeded.
    pub pushed: usize,
    /// Local changes discarded because the server version had moved on.
    pub conflicts: usize,
    /// Members that could not be fetched or decoded.
    pub skipped: usize,
    /// Per-item failures.
    pub errors: Vec<ItemError>,
    /// Phase the pass ended in.
    pub phase: SyncPhase,
    /// Wall time of the pass.
    pub elapsed: Duration,
}

impl SyncReport {
    /// Classifies the pass. A report only exists for passes that ran to the
    /// end, so this is never [`SyncStatus::Failure`].
    pub fn status(&self) -> SyncStatus {
        if self.errors.is_empty() && self.skipped == 0 {
            SyncStatus::Success
        } else {
            SyncStatus::Partial
        }
    }

    /// Whether the pass changed anything on either side.
    pub fn is_noop(&self) -> bool {
        self.inserted == 0
            && self.updated == 0
            && self.deleted == 0
            && self.pushed == 0
            && self.conflicts == 0
    }

    /// Whether the collection tag observed at the start may be stored.
    fn is_clean(&self) -> bool {
        self.skipped == 0 && self.conflicts == 0
    }
}

/// Cooperative cancellation flag, checked between phases and between
/// uploads.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Creates a handle that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every pass sharing this handle.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A fetched member ready to be written locally.
struct Fetched {
    resource: Resource,
    dirty: bool,
}

/// Drives sync passes between one local and one remote collection.
///
/// A pass never leaves partial local state behind: downloaded changes are
/// committed in one transaction, and every upload is committed locally before
/// the next request goes out.
#[derive(Debug)]
pub struct SyncEngine<L, R> {
    local: L,
    remote: R,
    config: SyncConfig,
    cancel: CancelHandle,
    phase: SyncPhase,
}

impl<L: LocalCollection, R: RemoteCollection> SyncEngine<L, R> {
    /// Pairs a local collection with its remote counterpart.
    pub fn new(local: L, remote: R, config: SyncConfig) -> Self {
        Self {
            local,
            remote,
            config,
            cancel: CancelHandle::new(),
            phase: SyncPhase::Start,
        }
    }

    /// Uses an existing cancellation handle, e.g. one shared by all
    /// collections of an account.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle to cancel a running pass.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Phase the latest pass is in or ended in.
    pub const fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// The local collection.
    pub const fn local(&self) -> &L {
        &self.local
    }

    /// The local collection, for edits between passes.
    pub const fn local_mut(&mut self) -> &mut L {
        &mut self.local
    }

    /// The remote collection.
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Splits the engine into its collections.
    pub fn into_parts(self) -> (L, R) {
        (self.local, self.remote)
    }

    /// Runs one pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass was aborted by a transport failure, a
    /// local storage failure or cancellation. Everything committed before the
    /// abort stays committed, and the next pass resumes from there.
    #[tracing::instrument(skip_all, fields(kind = %self.local.kind()))]
    pub async fn sync(&mut self) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let mut report = SyncReport::default();
        match self.run(&mut report).await {
            Ok(()) => {
                self.phase = SyncPhase::Done;
                report.phase = SyncPhase::Done;
                report.elapsed = started.elapsed();
                tracing::info!(
                    fast_path = report.fast_path,
                    fetched = report.fetched,
                    pushed = report.pushed,
                    conflicts = report.conflicts,
                    errors = report.errors.len(),
                    "sync pass finished"
                );
                Ok(report)
            }
            Err(err) => {
                tracing::warn!(phase = %self.phase, error = %err, "sync pass aborted");
                self.phase = SyncPhase::Aborted;
                Err(err)
            }
        }
    }

    async fn run(&mut self, report: &mut SyncReport) -> Result<(), SyncError> {
        self.enter(SyncPhase::Start)?;

        self.enter(SyncPhase::FastPathCheck)?;
        let stored_ctag = self.local.get_ctag().await?;
        let server_ctag = self.remote.fetch_ctag().await?;

        let mut recreate = HashSet::new();
        if server_ctag.is_some() && server_ctag == stored_ctag {
            tracing::debug!("collection tag unchanged, skipping diff");
            report.fast_path = true;
        } else {
            self.enter(SyncPhase::FullDiff)?;
            let members = self.remote.list_members().await?;
            let live = self.local.list_all().await?;
            let tombstones = self.local.list_deleted().await?;
            let changes = ChangeSet::compute(&members, &live, &tombstones);
            tracing::debug!(
                inserts = changes.inserts.len(),
                updates = changes.updates.len(),
                remote_deletions = changes.remote_deletions.len(),
                purged = changes.purged_tombstones.len(),
                recreate = changes.recreate.len(),
                "computed change set"
            );

            self.enter(SyncPhase::Fetch)?;
            let fetched = self.fetch(&changes, report).await?;

            self.enter(SyncPhase::ApplyLocal)?;
            self.apply(&changes, fetched, report).await?;
            recreate = changes.recreate;
        }

        self.enter(SyncPhase::PushLocal)?;
        self.push_deletions(report).await?;
        self.push_uploads(&recreate, report).await?;

        self.enter(SyncPhase::Finalize)?;
        if report.is_clean() {
            self.local.set_ctag(server_ctag);
        } else {
            // skipped or discarded members must be looked at again
            tracing::debug!("forgetting collection tag, next pass diffs in full");
            self.local.set_ctag(None);
        }
        self.local.commit().await?;
        Ok(())
    }

    fn enter(&mut self, phase: SyncPhase) -> Result<(), SyncError> {
        self.checkpoint()?;
        tracing::trace!(%phase, "entering phase");
        self.phase = phase;
        Ok(())
    }

    fn checkpoint(&self) -> Result<(), SyncError> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }

    async fn fetch(
        &self,
        changes: &ChangeSet,
        report: &mut SyncReport,
    ) -> Result<Vec<Fetched>, SyncError> {
        let names = changes.to_fetch();
        let requested: HashSet<&str> = names.iter().map(String::as_str).collect();
        let kind = self.local.kind();

        let mut fetched = Vec::with_capacity(names.len());
        for batch in names.chunks(self.config.multiget_batch_size.max(1)) {
            let response = self.remote.multi_get(batch).await?;

            for name in response.missing {
                tracing::warn!(%name, "member vanished before it could be fetched");
                report.skipped += 1;
            }

            for item in response.found {
                if !requested.contains(item.name.as_str()) {
                    tracing::debug!(name = %item.name, "ignoring unrequested member");
                    continue;
                }

                match decode(&item.data, kind) {
                    Ok(entity) => fetched.push(Fetched {
                        resource: Resource::new(item.name, item.etag, entity),
                        dirty: false,
                    }),
                    Err(EntityError::MissingIdentity(entity)) => {
                        let mut entity = *entity;
                        let uid = uuid::Uuid::new_v4().to_string();
                        tracing::warn!(name = %item.name, %uid, "member has no UID, assigning one");
                        entity.set_uid(uid);
                        fetched.push(Fetched {
                            resource: Resource::new(item.name, item.etag, entity),
                            dirty: true,
                        });
                    }
                    Err(err) => {
                        tracing::warn!(name = %item.name, error = %err, "skipping undecodable member");
                        report.skipped += 1;
                        report.errors.push(ItemError {
                            name: item.name,
                            error: err.into(),
                        });
                    }
                }
            }
        }

        report.fetched = fetched.len();
        Ok(fetched)
    }

    async fn apply(
        &mut self,
        changes: &ChangeSet,
        fetched: Vec<Fetched>,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let mut staged = false;
        for Fetched { resource, dirty } in fetched {
            staged = true;
            match changes.target(&resource.name) {
                Some(local_id) => {
                    report.updated += 1;
                    self.local.stage(LocalChange::Update {
                        local_id,
                        resource,
                        dirty,
                    });
                }
                None => {
                    report.inserted += 1;
                    self.local.stage(LocalChange::Insert { resource, dirty });
                }
            }
        }

        if changes.has_removals() {
            staged = true;
            report.deleted += changes.remote_deletions.len() + changes.purged_tombstones.len();
            self.local.delete_all_except(changes.remote_names.clone());
        }

        if staged {
            self.local.commit().await?;
        }
        Ok(())
    }

    async fn push_deletions(&mut self, report: &mut SyncReport) -> Result<(), SyncError> {
        for entry in self.local.list_deleted().await? {
            self.checkpoint()?;

            let Some(etag) = entry.resource.etag.as_deref() else {
                // never uploaded, nothing to delete remotely
                self.local.stage_delete(entry.local_id);
                self.local.commit().await?;
                continue;
            };

            match self.remote.delete(&entry.resource.name, Some(etag)).await {
                Ok(()) => {
                    tracing::debug!(name = %entry.resource.name, "deleted remotely");
                    self.local.stage_delete(entry.local_id);
                    self.local.commit().await?;
                    report.pushed += 1;
                }
                Err(err) => self.push_failed(entry, err, report).await?,
            }
        }
        Ok(())
    }

    async fn push_uploads(
        &mut self,
        recreate: &HashSet<String>,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        for entry in self.local.list_dirty().await? {
            self.checkpoint()?;

            let name = &entry.resource.name;
            let expected = if recreate.contains(name) {
                None
            } else {
                entry.resource.etag.as_deref()
            };

            let body = entry.resource.encode();
            match self.remote.put(name, body, expected).await {
                Ok(etag) => {
                    tracing::debug!(%name, created = expected.is_none(), "uploaded");
                    self.local.stage_mark_synced(entry.local_id, etag);
                    self.local.commit().await?;
                    report.pushed += 1;
                }
                Err(err) => self.push_failed(entry, err, report).await?,
            }
        }
        Ok(())
    }

    /// Conflicts drop the local change, rejections are recorded, everything
    /// else aborts the pass.
    async fn push_failed(
        &mut self,
        entry: LocalEntry,
        err: SyncError,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        match err {
            SyncError::Conflict(_) => {
                tracing::info!(name = %entry.resource.name, "remote changed, discarding local change");
                self.local.stage_discard(entry.local_id);
                self.local.commit().await?;
                report.conflicts += 1;
                Ok(())
            }
            err if err.aborts_pass() => Err(err),
            err => {
                tracing::warn!(name = %entry.resource.name, error = %err, "server rejected change");
                report.errors.push(ItemError {
                    name: entry.resource.name,
                    error: err,
                });
                Ok(())
            }
        }
    }
}
