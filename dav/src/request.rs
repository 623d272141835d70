// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Request body builders.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::DavError;
use crate::types::{CollectionKind, Href};
use crate::xml::{finish, ns, write_empty, writer};

/// PROPFIND request builder.
#[derive(Debug, Default)]
pub struct PropFindRequest {
    props: Vec<Prop>,
}

/// Properties to request in PROPFIND.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prop {
    /// Display name.
    DisplayName,
    /// Resource type.
    ResourceType,
    /// `ETag`.
    GetETag,
    /// Collection tag.
    GetCTag,
}

impl Prop {
    const fn qualified_name(self) -> &'static str {
        match self {
            Self::DisplayName => "D:displayname",
            Self::ResourceType => "D:resourcetype",
            Self::GetETag => "D:getetag",
            Self::GetCTag => "CS:getctag",
        }
    }
}

impl PropFindRequest {
    /// Creates a new PROPFIND request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property to the request.
    pub fn add_property(&mut self, prop: Prop) -> &mut Self {
        self.props.push(prop);
        self
    }

    /// Builds the XML body for the PROPFIND request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut writer = writer();

        let mut propfind = BytesStart::new("D:propfind");
        propfind.push_attribute(("xmlns:D", ns::DAV));
        if self.props.contains(&Prop::GetCTag) {
            propfind.push_attribute(("xmlns:CS", ns::CALSERVER));
        }
        writer.write_event(Event::Start(propfind))?;

        writer.write_event(Event::Start(BytesStart::new("D:prop")))?;
        for prop in &self.props {
            write_empty(&mut writer, prop.qualified_name())?;
        }
        writer.write_event(Event::End(BytesEnd::new("D:prop")))?;

        writer.write_event(Event::End(BytesEnd::new("D:propfind")))?;
        finish(writer)
    }
}

/// `calendar-multiget` (RFC 4791) or `addressbook-multiget` (RFC 6352) report.
#[derive(Debug)]
pub struct MultiGetRequest {
    kind: CollectionKind,
    hrefs: Vec<Href>,
}

impl MultiGetRequest {
    /// Creates an empty report for the given collection kind.
    #[must_use]
    pub const fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            hrefs: Vec::new(),
        }
    }

    /// Adds an href to the request.
    pub fn add_href(&mut self, href: Href) -> &mut Self {
        self.hrefs.push(href);
        self
    }

    /// Builds the XML body.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let (root, namespace, data) = match self.kind {
            CollectionKind::Calendar => ("C:calendar-multiget", ns::CALDAV, "C:calendar-data"),
            CollectionKind::AddressBook => {
                ("C:addressbook-multiget", ns::CARDDAV, "C:address-data")
            }
        };

        let mut writer = writer();

        let mut multiget = BytesStart::new(root);
        multiget.push_attribute(("xmlns:D", ns::DAV));
        multiget.push_attribute(("xmlns:C", namespace));
        writer.write_event(Event::Start(multiget))?;

        writer.write_event(Event::Start(BytesStart::new("D:prop")))?;
        write_empty(&mut writer, "D:getetag")?;
        write_empty(&mut writer, data)?;
        writer.write_event(Event::End(BytesEnd::new("D:prop")))?;

        for href in &self.hrefs {
            writer.write_event(Event::Start(BytesStart::new("D:href")))?;
            writer.write_event(Event::Text(BytesText::new(href.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new("D:href")))?;
        }

        writer.write_event(Event::End(BytesEnd::new(root)))?;
        finish(writer)
    }
}
