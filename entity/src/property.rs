// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::line::{ContentLine, Parameter, escape_text};

/// A property value carried verbatim, together with its parameters.
///
/// Used for date-times, durations and structured values, which only need to
/// survive a round trip and are never interpreted by the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Parameters such as `TZID` or `VALUE=DATE`.
    pub params: Vec<Parameter>,
    /// Raw value.
    pub value: String,
}

impl Property {
    /// Creates a property without parameters.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            params: Vec::new(),
            value: value.into(),
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(Parameter::new(name, value));
        self
    }

    pub(crate) fn from_line(line: &ContentLine) -> Self {
        Self {
            params: line.params.clone(),
            value: line.value.clone(),
        }
    }

    pub(crate) fn to_line(&self, name: &str) -> ContentLine {
        ContentLine {
            name: name.to_string(),
            params: self.params.clone(),
            value: self.value.clone(),
        }
    }
}

/// Access classification (`CLASS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Classification {
    /// Visible to everyone.
    Public,
    /// Only the owner can see it.
    Private,
    /// Only time information is visible.
    Confidential,
}

pub(crate) fn push_text(props: &mut Vec<ContentLine>, name: &str, value: Option<&String>) {
    if let Some(value) = value {
        props.push(ContentLine::new(name, escape_text(value)));
    }
}

pub(crate) fn push_raw(props: &mut Vec<ContentLine>, name: &str, value: Option<&Property>) {
    if let Some(value) = value {
        props.push(value.to_line(name));
    }
}

/// Returns the lines whose names are not listed in `known`.
pub(crate) fn unknown_lines(properties: &[ContentLine], known: &[&str]) -> Vec<ContentLine> {
    properties
        .iter()
        .filter(|p| !known.contains(&p.name.as_str()))
        .cloned()
        .collect()
}
