// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::component::Component;
use crate::line::ContentLine;
use crate::property::{Classification, Property, push_raw, push_text, unknown_lines};

const KNOWN: &[&str] = &[
    "UID",
    "DTSTAMP",
    "CREATED",
    "LAST-MODIFIED",
    "SUMMARY",
    "LOCATION",
    "DESCRIPTION",
    "URL",
    "CLASS",
    "STATUS",
    "DTSTART",
    "DTEND",
    "DURATION",
    "RRULE",
    "SEQUENCE",
];

/// The status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum EventStatus {
    /// Indicates event is tentative.
    Tentative,
    /// Indicates event is definite.
    Confirmed,
    /// Indicates event was cancelled.
    Cancelled,
}

/// A calendar event (`VEVENT`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// Globally unique identifier.
    pub uid: String,
    /// Time the object was created by the organizer's client.
    pub dtstamp: Option<Property>,
    /// Creation time.
    pub created: Option<Property>,
    /// Last modification time.
    pub last_modified: Option<Property>,
    /// Short summary.
    pub summary: Option<String>,
    /// Location.
    pub location: Option<String>,
    /// Longer description.
    pub description: Option<String>,
    /// Associated URL.
    pub url: Option<String>,
    /// Access classification.
    pub classification: Option<Classification>,
    /// Status.
    pub status: Option<EventStatus>,
    /// Start.
    pub dtstart: Option<Property>,
    /// End.
    pub dtend: Option<Property>,
    /// Duration, alternative to `dtend`.
    pub duration: Option<Property>,
    /// Recurrence rule, kept as written.
    pub rrule: Option<Property>,
    /// Revision sequence number.
    pub sequence: Option<u32>,
    /// Properties without a typed field, kept verbatim.
    pub extra: Vec<ContentLine>,
    /// Nested components such as `VALARM`.
    pub components: Vec<Component>,
    /// Other components of the enclosing calendar object, such as `VTIMEZONE`
    /// or recurrence overrides.
    pub companions: Vec<Component>,
}

impl Event {
    pub(crate) fn from_component(event: &Component, companions: Vec<Component>) -> Self {
        let mut extra = unknown_lines(&event.properties, KNOWN);

        let status = event.property("STATUS").and_then(|p| {
            p.value.parse().ok().or_else(|| {
                extra.push(p.clone());
                None
            })
        });
        let classification = event.property("CLASS").and_then(|p| {
            p.value.parse().ok().or_else(|| {
                extra.push(p.clone());
                None
            })
        });
        let sequence = event.property("SEQUENCE").and_then(|p| {
            p.value.trim().parse().ok().or_else(|| {
                extra.push(p.clone());
                None
            })
        });

        Self {
            uid: event.text("UID").unwrap_or_default(),
            dtstamp: event.raw("DTSTAMP"),
            created: event.raw("CREATED"),
            last_modified: event.raw("LAST-MODIFIED"),
            summary: event.text("SUMMARY"),
            location: event.text("LOCATION"),
            description: event.text("DESCRIPTION"),
            url: event.property("URL").map(|p| p.value.clone()),
            classification,
            status,
            dtstart: event.raw("DTSTART"),
            dtend: event.raw("DTEND"),
            duration: event.raw("DURATION"),
            rrule: event.raw("RRULE"),
            sequence,
            extra,
            components: event.children.clone(),
            companions,
        }
    }

    pub(crate) fn to_component(&self) -> Component {
        let mut props = Vec::new();
        if !self.uid.is_empty() {
            push_text(&mut props, "UID", Some(&self.uid));
        }
        push_raw(&mut props, "DTSTAMP", self.dtstamp.as_ref());
        push_raw(&mut props, "CREATED", self.created.as_ref());
        push_raw(&mut props, "LAST-MODIFIED", self.last_modified.as_ref());
        push_text(&mut props, "SUMMARY", self.summary.as_ref());
        push_text(&mut props, "LOCATION", self.location.as_ref());
        push_text(&mut props, "DESCRIPTION", self.description.as_ref());
        if let Some(url) = &self.url {
            props.push(ContentLine::new("URL", url.clone()));
        }
        if let Some(class) = self.classification {
            props.push(ContentLine::new("CLASS", class.to_string()));
        }
        if let Some(status) = self.status {
            props.push(ContentLine::new("STATUS", status.to_string()));
        }
        push_raw(&mut props, "DTSTART", self.dtstart.as_ref());
        push_raw(&mut props, "DTEND", self.dtend.as_ref());
        push_raw(&mut props, "DURATION", self.duration.as_ref());
        push_raw(&mut props, "RRULE", self.rrule.as_ref());
        if let Some(sequence) = self.sequence {
            props.push(ContentLine::new("SEQUENCE", sequence.to_string()));
        }
        props.extend(self.extra.iter().cloned());

        Component {
            name: "VEVENT".to_string(),
            properties: props,
            children: self.components.clone(),
        }
    }
}
