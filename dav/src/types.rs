// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;

/// Resource href (server path).
///
/// A `Href` is the path to a resource or collection on the server, such as
/// `/dav/calendars/user/tasks/abc.ics`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Href(String);

impl Href {
    /// Creates a new `Href` from a string.
    #[must_use]
    pub const fn new(href: String) -> Self {
        Self(href)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The decoded path without scheme, authority or trailing slash.
    ///
    /// Servers may answer with absolute URLs (`https://host/dav/a.ics`) or
    /// with percent-encoded paths; both reduce to `/dav/a.ics` here.
    #[must_use]
    pub fn path(&self) -> Cow<'_, str> {
        let raw = match self.0.split_once("://") {
            Some((_, rest)) => rest.find('/').map_or("/", |i| &rest[i..]),
            None => self.0.as_str(),
        };
        let raw = raw.split(['?', '#']).next().unwrap_or(raw);
        let raw = match raw.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
    }

    /// Last decoded path segment, ignoring a trailing slash.
    #[must_use]
    pub fn file_name(&self) -> String {
        let path = self.path();
        path.rsplit('/').next().unwrap_or_default().to_string()
    }

    /// Appends a member name to a collection href.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        Self(format!("{}/{}", self.0.trim_end_matches('/'), name))
    }

    /// Whether both hrefs point at the same resource, see [`Href::path`].
    #[must_use]
    pub fn same_path(&self, other: &Self) -> bool {
        self.path() == other.path()
    }
}

impl Deref for Href {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Href {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Href {
    fn from(href: String) -> Self {
        Self(href)
    }
}

impl From<&str> for Href {
    fn from(href: &str) -> Self {
        Self(href.to_string())
    }
}

/// Entity tag for change detection.
///
/// Opaque to the client; compared byte for byte, quotes included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ETag(String);

impl ETag {
    /// Creates a new `ETag` from a string.
    #[must_use]
    pub const fn new(etag: String) -> Self {
        Self(etag)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the tag and returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for ETag {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ETag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ETag {
    fn from(etag: String) -> Self {
        Self(etag)
    }
}

impl From<&str> for ETag {
    fn from(etag: &str) -> Self {
        Self(etag.to_string())
    }
}

/// Flavour of a collection, which decides the multiget report and payload
/// property to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// `CalDAV` calendar collection.
    Calendar,
    /// `CardDAV` address book collection.
    AddressBook,
}

/// Collection metadata returned by a depth 0 `PROPFIND`.
#[derive(Debug, Clone, Default)]
pub struct CollectionInfo {
    /// The href of the collection.
    pub href: Option<Href>,
    /// Display name.
    pub display_name: Option<String>,
    /// Aggregate collection tag, absent if the server does not support it.
    pub ctag: Option<String>,
    /// Whether the resource type contains `calendar`.
    pub is_calendar: bool,
    /// Whether the resource type contains `addressbook`.
    pub is_address_book: bool,
}

/// A member resource of a collection as reported by a depth 1 `PROPFIND`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// The href of the member.
    pub href: Href,
    /// Current entity tag, missing on servers that do not report one.
    pub etag: Option<ETag>,
}

/// A resource body fetched from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    /// The href of the resource.
    pub href: Href,
    /// Entity tag of the returned body.
    pub etag: Option<ETag>,
    /// iCalendar or vCard payload.
    pub data: String,
}

/// Result of a multiget report.
#[derive(Debug, Clone, Default)]
pub struct MultiGetResult {
    /// Resources returned with their payload.
    pub found: Vec<FetchedResource>,
    /// Requested hrefs the server reported missing or returned without data.
    pub missing: Vec<Href>,
}
