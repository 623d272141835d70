// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use davsync_entity::{Entity, EntityKind, encode};

/// One synchronized item: a typed entity plus the sync metadata the server
/// attaches to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Member name within the collection, e.g. `abc.ics`. Stable for the
    /// lifetime of the item.
    pub name: String,

    /// Opaque version tag last seen from the server. `None` means the item
    /// has never been uploaded.
    pub etag: Option<String>,

    /// The decoded payload.
    pub entity: Entity,
}

impl Resource {
    /// Wraps an entity received from the server.
    pub fn new(name: impl Into<String>, etag: Option<String>, entity: Entity) -> Self {
        Self {
            name: name.into(),
            etag,
            entity,
        }
    }

    /// Prepares a brand-new local item: assigns a fresh UID and derives the
    /// member name from it.
    pub fn initialize(mut entity: Entity) -> Self {
        let uid = uuid::Uuid::new_v4().to_string();
        let name = member_name(&uid, entity.kind());
        entity.set_uid(uid);
        Self {
            name,
            etag: None,
            entity,
        }
    }

    /// The UID of the wrapped entity.
    pub fn uid(&self) -> &str {
        self.entity.uid()
    }

    /// The kind of the wrapped entity.
    pub const fn kind(&self) -> EntityKind {
        self.entity.kind()
    }

    /// Encodes the entity for upload.
    pub fn encode(&self) -> String {
        encode(&self.entity)
    }
}

/// Member name derived from a UID: the UID followed by the kind's extension.
pub fn member_name(uid: &str, kind: EntityKind) -> String {
    format!("{uid}{}", kind.extension())
}
