// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::entity::Entity;

/// Errors raised while decoding an entity.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// The payload is not valid content-line syntax, or it has no top-level
    /// component of the expected kind.
    #[error("malformed entity: {0}")]
    Malformed(String),

    /// The payload decoded fine but carries no UID.
    ///
    /// The decoded entity is handed back so the caller can assign a UID and
    /// continue.
    #[error("entity has no UID")]
    MissingIdentity(Box<Entity>),
}
