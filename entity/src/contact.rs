// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::component::Component;
use crate::line::ContentLine;
use crate::property::{Property, push_raw, push_text, unknown_lines};

const KNOWN: &[&str] = &[
    "VERSION", "UID", "FN", "N", "NICKNAME", "ORG", "TITLE", "EMAIL", "TEL", "NOTE", "URL", "BDAY",
];

/// A contact (`VCARD`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// vCard version, `3.0` unless the server sent something else.
    pub version: String,
    /// Globally unique identifier.
    pub uid: String,
    /// Formatted name (`FN`), required by vCard.
    pub formatted_name: String,
    /// Structured name (`N`), kept as written.
    pub name: Option<Property>,
    /// Nickname.
    pub nickname: Option<String>,
    /// Organization, kept as written.
    pub organization: Option<Property>,
    /// Job title.
    pub title: Option<String>,
    /// Email addresses with their `TYPE` parameters.
    pub emails: Vec<Property>,
    /// Phone numbers with their `TYPE` parameters.
    pub phones: Vec<Property>,
    /// Free-form note.
    pub note: Option<String>,
    /// Associated URL.
    pub url: Option<String>,
    /// Birthday.
    pub birthday: Option<Property>,
    /// Properties without a typed field, kept verbatim.
    pub extra: Vec<ContentLine>,
}

impl Default for Contact {
    fn default() -> Self {
        Self {
            version: "3.0".to_string(),
            uid: String::new(),
            formatted_name: String::new(),
            name: None,
            nickname: None,
            organization: None,
            title: None,
            emails: Vec::new(),
            phones: Vec::new(),
            note: None,
            url: None,
            birthday: None,
            extra: Vec::new(),
        }
    }
}

impl Contact {
    pub(crate) fn from_component(card: &Component) -> Self {
        Self {
            version: card
                .property("VERSION")
                .map_or_else(|| "3.0".to_string(), |p| p.value.trim().to_string()),
            uid: card.text("UID").unwrap_or_default(),
            formatted_name: card.text("FN").unwrap_or_default(),
            name: card.raw("N"),
            nickname: card.text("NICKNAME"),
            organization: card.raw("ORG"),
            title: card.text("TITLE"),
            emails: card.properties_named("EMAIL").map(Property::from_line).collect(),
            phones: card.properties_named("TEL").map(Property::from_line).collect(),
            note: card.text("NOTE"),
            url: card.property("URL").map(|p| p.value.clone()),
            birthday: card.raw("BDAY"),
            extra: unknown_lines(&card.properties, KNOWN),
        }
    }

    pub(crate) fn to_component(&self) -> Component {
        let mut props = vec![ContentLine::new("VERSION", self.version.clone())];
        if !self.uid.is_empty() {
            push_text(&mut props, "UID", Some(&self.uid));
        }
        push_text(&mut props, "FN", Some(&self.formatted_name));
        push_raw(&mut props, "N", self.name.as_ref());
        push_text(&mut props, "NICKNAME", self.nickname.as_ref());
        push_raw(&mut props, "ORG", self.organization.as_ref());
        push_text(&mut props, "TITLE", self.title.as_ref());
        props.extend(self.emails.iter().map(|p| p.to_line("EMAIL")));
        props.extend(self.phones.iter().map(|p| p.to_line("TEL")));
        push_text(&mut props, "NOTE", self.note.as_ref());
        if let Some(url) = &self.url {
            props.push(ContentLine::new("URL", url.clone()));
        }
        push_raw(&mut props, "BDAY", self.birthday.as_ref());
        props.extend(self.extra.iter().cloned());

        Component {
            name: "VCARD".to_string(),
            properties: props,
            children: Vec::new(),
        }
    }
}
