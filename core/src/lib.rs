// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Two-way synchronization of `CalDAV`/`CardDAV` collections with a local
//! store.
//!
//! A [`SyncEngine`] pairs a [`LocalCollection`] with a [`RemoteCollection`]
//! and reconciles them in passes. The server wins every conflict; local
//! changes are only uploaded against the version they were based on.

#![warn(
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro
)]

mod config;
mod diff;
mod engine;
mod error;
mod local;
mod localdb;
mod remote;
mod resource;

pub use crate::config::{
    APP_NAME, CollectionConfig, Config, DB_FILE_NAME, expand_path, get_config_dir,
};
pub use crate::diff::ChangeSet;
pub use crate::engine::{
    CancelHandle, DEFAULT_MULTIGET_BATCH_SIZE, ItemError, SyncConfig, SyncEngine, SyncPhase,
    SyncReport, SyncStatus,
};
pub use crate::error::{LocalStorageError, SyncError};
pub use crate::local::{LocalChange, LocalCollection, LocalEntry, LocalId};
pub use crate::localdb::{CollectionRecord, CollectionStats, LocalDb, SqliteCollection};
pub use crate::remote::{
    DavCollection, MultiGetResponse, RemoteCollection, RemoteItem, RemoteMember,
};
pub use crate::resource::{Resource, member_name};
