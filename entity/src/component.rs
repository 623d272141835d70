// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::EntityError;
use crate::line::{ContentLine, parse_lines, unescape_text};
use crate::property::Property;

/// A `BEGIN:X` ... `END:X` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Upper-cased component name, e.g. `VTODO`.
    pub name: String,
    /// Properties in their original order.
    pub properties: Vec<ContentLine>,
    /// Nested components, e.g. `VALARM` inside `VEVENT`.
    pub children: Vec<Component>,
}

impl Component {
    /// Creates an empty component.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns the first property with the given name.
    pub fn property(&self, name: &str) -> Option<&ContentLine> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Returns every property with the given name.
    pub fn properties_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ContentLine> {
        self.properties.iter().filter(move |p| p.name == name)
    }

    /// Returns the first child component with the given name.
    pub fn child(&self, name: &str) -> Option<&Component> {
        self.children.iter().find(|c| c.name == name)
    }

    pub(crate) fn text(&self, name: &str) -> Option<String> {
        self.property(name).map(|p| unescape_text(&p.value))
    }

    pub(crate) fn raw(&self, name: &str) -> Option<Property> {
        self.property(name).map(Property::from_line)
    }
}

/// Parses `src` into its top-level components.
///
/// # Errors
///
/// Returns [`EntityError::Malformed`] on syntax errors, properties outside
/// of any component, or mismatched `BEGIN`/`END` pairs.
pub fn parse_components(src: &str) -> Result<Vec<Component>, EntityError> {
    let mut roots = Vec::new();
    let mut stack: Vec<Component> = Vec::new();

    for line in parse_lines(src)? {
        match line.name.as_str() {
            "BEGIN" => stack.push(Component::new(line.value.trim())),
            "END" => {
                let name = line.value.trim().to_ascii_uppercase();
                let Some(component) = stack.pop() else {
                    return Err(EntityError::Malformed(format!("END:{name} without BEGIN")));
                };
                if component.name != name {
                    return Err(EntityError::Malformed(format!(
                        "END:{name} does not close BEGIN:{}",
                        component.name
                    )));
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(component),
                    None => roots.push(component),
                }
            }
            _ => match stack.last_mut() {
                Some(current) => current.properties.push(line),
                None => {
                    return Err(EntityError::Malformed(format!(
                        "property {} outside of any component",
                        line.name
                    )));
                }
            },
        }
    }

    if let Some(open) = stack.last() {
        return Err(EntityError::Malformed(format!(
            "BEGIN:{} is never closed",
            open.name
        )));
    }

    Ok(roots)
}
