// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! XML helpers shared by request builders and response parsers.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::error::DavError;

/// XML namespaces.
pub mod ns {
    /// `WebDAV` namespace.
    pub const DAV: &str = "DAV:";

    /// `CalDAV` namespace.
    pub const CALDAV: &str = "urn:ietf:params:xml:ns:caldav";

    /// `CardDAV` namespace.
    pub const CARDDAV: &str = "urn:ietf:params:xml:ns:carddav";

    /// Calendar server extensions, home of `getctag`.
    pub const CALSERVER: &str = "http://calendarserver.org/ns/";
}

pub(crate) type XmlWriter = Writer<Cursor<Vec<u8>>>;

pub(crate) fn writer() -> XmlWriter {
    Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2)
}

/// Writes `<name/>` as an open/close pair, which some servers insist on.
pub(crate) fn write_empty(writer: &mut XmlWriter, name: &str) -> Result<(), DavError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub(crate) fn finish(writer: XmlWriter) -> Result<String, DavError> {
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))
}

/// Resolves the body of a `&...;` reference: predefined entities and
/// character references. Unknown entities are kept as written.
pub(crate) fn resolve_reference(name: &str) -> String {
    if let Some(value) = resolve_predefined_entity(name) {
        return value.to_string();
    }

    let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse().ok()
    } else {
        None
    };

    match code.and_then(char::from_u32) {
        Some(c) => c.to_string(),
        None => format!("&{name};"),
    }
}
