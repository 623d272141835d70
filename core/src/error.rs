// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use davsync_dav::DavError;
use davsync_entity::{EntityError, EntityKind};

/// Errors raised by the local store.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LocalStorageError {
    /// The database rejected a statement or the connection failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying the schema migrations failed.
    #[error("failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be interpreted.
    #[error("corrupt local data: {0}")]
    Corrupt(String),

    /// No live entry with this id.
    #[error("entry {0} not found")]
    NotFound(i64),

    /// An entity or collection of a different kind was expected.
    #[error("expected {expected} but got {actual}")]
    WrongKind {
        /// The kind of the collection.
        expected: EntityKind,
        /// The kind that was passed or stored.
        actual: EntityKind,
    },

    /// The path to the database is not valid UTF-8.
    #[error("invalid database path: {0}")]
    InvalidPath(String),
}

/// Errors raised during a sync pass.
///
/// [`SyncError::Transport`] and [`SyncError::LocalStorage`] abort the pass.
/// [`SyncError::Rejected`] and [`SyncError::Entity`] only affect the item they
/// occurred on. [`SyncError::Conflict`] is resolved by discarding the local
/// change and never surfaces from [`crate::SyncEngine::sync`].
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Network failure, timeout, server error or unparseable response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server refused the request for reasons other than a precondition.
    #[error("rejected by server ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// A conditional write failed because the remote version changed.
    #[error("remote version of {0} changed")]
    Conflict(String),

    /// A fetched body could not be decoded.
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// The local store failed.
    #[error(transparent)]
    LocalStorage(#[from] LocalStorageError),

    /// The pass was cancelled by the caller.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Whether the whole pass must stop when this error occurs.
    pub const fn aborts_pass(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::LocalStorage(_) | Self::Cancelled
        )
    }
}

impl From<DavError> for SyncError {
    fn from(err: DavError) -> Self {
        match err {
            DavError::Rejected { status, message } => Self::Rejected { status, message },
            DavError::Conflict(href) => Self::Conflict(href.to_string()),
            DavError::NotFound(href) => Self::Rejected {
                status: 404,
                message: format!("{href} not found"),
            },
            other => Self::Transport(other.to_string()),
        }
    }
}
