// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use davsync_dav::{CollectionKind, DavClient, ETag, Href};
use davsync_entity::EntityKind;

use crate::error::SyncError;

/// A member of the remote collection with its current version tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMember {
    /// Member name, the last path segment of its href.
    pub name: String,
    /// Current tag, `None` if the server did not report one.
    pub etag: Option<String>,
}

/// A member body returned by [`RemoteCollection::multi_get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    /// Member name.
    pub name: String,
    /// Tag of the returned body.
    pub etag: Option<String>,
    /// Raw iCalendar or vCard payload.
    pub data: String,
}

/// Result of a batch fetch. Members the server could not return are listed in
/// `missing` rather than failing the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiGetResponse {
    /// Members returned with a body.
    pub found: Vec<RemoteItem>,
    /// Requested names without a body.
    pub missing: Vec<String>,
}

/// The server side of a collection.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// The aggregate collection tag, `None` if the server does not offer one.
    async fn fetch_ctag(&self) -> Result<Option<String>, SyncError>;

    /// Every member with its current tag.
    async fn list_members(&self) -> Result<Vec<RemoteMember>, SyncError>;

    /// Fetches the bodies of several members in one request.
    async fn multi_get(&self, names: &[String]) -> Result<MultiGetResponse, SyncError>;

    /// Uploads a body.
    ///
    /// With `expected_etag` set, only that exact version is replaced. Without
    /// it, the upload only succeeds if no member of that name exists. Fails
    /// with [`SyncError::Conflict`] if the precondition does not hold.
    /// Returns the new tag if the server reports one.
    async fn put(
        &self,
        name: &str,
        body: String,
        expected_etag: Option<&str>,
    ) -> Result<Option<String>, SyncError>;

    /// Deletes a member, conditional on `expected_etag` when given.
    async fn delete(&self, name: &str, expected_etag: Option<&str>) -> Result<(), SyncError>;
}

/// A `CalDAV` calendar or `CardDAV` address book on a server.
#[derive(Debug, Clone)]
pub struct DavCollection {
    client: DavClient,
    href: Href,
    kind: EntityKind,
}

impl DavCollection {
    /// Binds a collection path of the server behind `client`.
    pub fn new(client: DavClient, href: impl Into<Href>, kind: EntityKind) -> Self {
        Self {
            client,
            href: href.into(),
            kind,
        }
    }

    /// The collection path.
    pub fn href(&self) -> &Href {
        &self.href
    }

    /// Display name configured on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached.
    pub async fn display_name(&self) -> Result<Option<String>, SyncError> {
        let info = self.client.collection_info(&self.href).await?;
        Ok(info.display_name)
    }

    const fn collection_kind(&self) -> CollectionKind {
        if self.kind.is_calendar() {
            CollectionKind::Calendar
        } else {
            CollectionKind::AddressBook
        }
    }
}

#[async_trait]
impl RemoteCollection for DavCollection {
    async fn fetch_ctag(&self) -> Result<Option<String>, SyncError> {
        let info = self.client.collection_info(&self.href).await?;
        Ok(info.ctag)
    }

    async fn list_members(&self) -> Result<Vec<RemoteMember>, SyncError> {
        let members = self.client.list_members(&self.href).await?;
        Ok(members
            .into_iter()
            .map(|m| RemoteMember {
                name: m.href.file_name(),
                etag: m.etag.map(ETag::into_inner),
            })
            .collect())
    }

    async fn multi_get(&self, names: &[String]) -> Result<MultiGetResponse, SyncError> {
        let hrefs: Vec<Href> = names.iter().map(|n| self.href.join(n)).collect();
        let result = self
            .client
            .multiget(&self.href, self.collection_kind(), &hrefs)
            .await?;

        Ok(MultiGetResponse {
            found: result
                .found
                .into_iter()
                .map(|r| RemoteItem {
                    name: r.href.file_name(),
                    etag: r.etag.map(ETag::into_inner),
                    data: r.data,
                })
                .collect(),
            missing: result
                .missing
                .iter()
                .map(Href::file_name)
                .collect(),
        })
    }

    async fn put(
        &self,
        name: &str,
        body: String,
        expected_etag: Option<&str>,
    ) -> Result<Option<String>, SyncError> {
        let expected = expected_etag.map(ETag::from);
        let etag = self
            .client
            .put(
                &self.href.join(name),
                body,
                self.kind.mime_type(),
                expected.as_ref(),
            )
            .await?;
        Ok(etag.map(ETag::into_inner))
    }

    async fn delete(&self, name: &str, expected_etag: Option<&str>) -> Result<(), SyncError> {
        let expected = expected_etag.map(ETag::from);
        self.client
            .delete(&self.href.join(name), expected.as_ref())
            .await?;
        Ok(())
    }
}
