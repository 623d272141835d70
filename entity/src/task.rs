// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::component::Component;
use crate::line::ContentLine;
use crate::property::{Classification, Property, push_raw, push_text, unknown_lines};

const KNOWN: &[&str] = &[
    "UID",
    "CREATED",
    "LAST-MODIFIED",
    "SUMMARY",
    "LOCATION",
    "DESCRIPTION",
    "URL",
    "PRIORITY",
    "CLASS",
    "STATUS",
    "DTSTART",
    "DUE",
    "DURATION",
    "COMPLETED",
    "PERCENT-COMPLETE",
];

/// The status of a to-do item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "SCREAMING-KEBAB-CASE", ascii_case_insensitive)]
pub enum TodoStatus {
    /// The to-do needs action.
    NeedsAction,
    /// The to-do has been completed.
    Completed,
    /// The to-do is in process.
    InProcess,
    /// The to-do has been cancelled.
    Cancelled,
}

/// A to-do item (`VTODO`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    /// Globally unique identifier.
    pub uid: String,
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
    /// Priority from 1 (highest) to 9, 0 means undefined.
    pub priority: u8,
    /// Access classification.
    pub classification: Option<Classification>,
    /// Status.
    pub status: Option<TodoStatus>,
    /// Start.
    pub dtstart: Option<Property>,
    /// Due date.
    pub due: Option<Property>,
    /// Duration, alternative to `due`.
    pub duration: Option<Property>,
    /// Completion time.
    pub completed: Option<Property>,
    /// Percent complete, 0 to 100.
    pub percent_complete: Option<u8>,
    /// Properties without a typed field, kept verbatim.
    pub extra: Vec<ContentLine>,
    /// Nested components such as `VALARM`.
    pub components: Vec<Component>,
    /// Other components of the enclosing calendar object, such as `VTIMEZONE`.
    pub companions: Vec<Component>,
}

impl Task {
    pub(crate) fn from_component(todo: &Component, companions: Vec<Component>) -> Self {
        let mut extra = unknown_lines(&todo.properties, KNOWN);

        let status = todo.property("STATUS").and_then(|p| match p.value.parse() {
            Ok(status) => Some(status),
            Err(_) => {
                extra.push(p.clone());
                None
            }
        });
        let classification = todo.property("CLASS").and_then(|p| match p.value.parse() {
            Ok(class) => Some(class),
            Err(_) => {
                extra.push(p.clone());
                None
            }
        });

        Self {
            uid: todo.text("UID").unwrap_or_default(),
            created: todo.raw("CREATED"),
            last_modified: todo.raw("LAST-MODIFIED"),
            summary: todo.text("SUMMARY"),
            location: todo.text("LOCATION"),
            description: todo.text("DESCRIPTION"),
            url: todo.property("URL").map(|p| p.value.clone()),
            priority: todo
                .property("PRIORITY")
                .and_then(|p| p.value.trim().parse().ok())
                .filter(|p| *p <= 9)
                .unwrap_or(0),
            classification,
            status,
            dtstart: todo.raw("DTSTART"),
            due: todo.raw("DUE"),
            duration: todo.raw("DURATION"),
            completed: todo.raw("COMPLETED"),
            percent_complete: todo
                .property("PERCENT-COMPLETE")
                .and_then(|p| p.value.trim().parse().ok())
                .map(|p: u8| p.min(100)),
            extra,
            components: todo.children.clone(),
            companions,
        }
    }

    pub(crate) fn to_component(&self) -> Component {
        let mut props = Vec::new();
        if !self.uid.is_empty() {
            push_text(&mut props, "UID", Some(&self.uid));
        }
        push_raw(&mut props, "CREATED", self.created.as_ref());
        push_raw(&mut props, "LAST-MODIFIED", self.last_modified.as_ref());
        push_text(&mut props, "SUMMARY", self.summary.as_ref());
        push_text(&mut props, "LOCATION", self.location.as_ref());
        push_text(&mut props, "DESCRIPTION", self.description.as_ref());
        if let Some(url) = &self.url {
            props.push(ContentLine::new("URL", url.clone()));
        }
        if self.priority != 0 {
            props.push(ContentLine::new("PRIORITY", self.priority.to_string()));
        }
        if let Some(class) = self.classification {
            props.push(ContentLine::new("CLASS", class.to_string()));
        }
        if let Some(status) = self.status {
            props.push(ContentLine::new("STATUS", status.to_string()));
        }
        push_raw(&mut props, "DUE", self.due.as_ref());
        push_raw(&mut props, "DURATION", self.duration.as_ref());
        push_raw(&mut props, "DTSTART", self.dtstart.as_ref());
        push_raw(&mut props, "COMPLETED", self.completed.as_ref());
        if let Some(percent) = self.percent_complete {
            props.push(ContentLine::new("PERCENT-COMPLETE", percent.to_string()));
        }
        props.extend(self.extra.iter().cloned());

        Component {
            name: "VTODO".to_string(),
            properties: props,
            children: self.components.clone(),
        }
    }
}
