// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::PRODID;
use crate::component::{Component, parse_components};
use crate::contact::Contact;
use crate::error::EntityError;
use crate::event::Event;
use crate::formatter::Formatter;
use crate::kind::EntityKind;
use crate::line::ContentLine;
use crate::task::Task;

/// A typed entity stored in a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// A calendar event.
    Event(Event),
    /// A to-do item.
    Task(Task),
    /// A contact.
    Contact(Contact),
}

impl Entity {
    /// The kind of this entity.
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Event(_) => EntityKind::Event,
            Self::Task(_) => EntityKind::Task,
            Self::Contact(_) => EntityKind::Contact,
        }
    }

    /// The UID, empty if none was assigned yet.
    pub fn uid(&self) -> &str {
        match self {
            Self::Event(e) => &e.uid,
            Self::Task(t) => &t.uid,
            Self::Contact(c) => &c.uid,
        }
    }

    /// Replaces the UID.
    pub fn set_uid(&mut self, uid: impl Into<String>) {
        let uid = uid.into();
        match self {
            Self::Event(e) => e.uid = uid,
            Self::Task(t) => t.uid = uid,
            Self::Contact(c) => c.uid = uid,
        }
    }
}

impl From<Event> for Entity {
    fn from(value: Event) -> Self {
        Self::Event(value)
    }
}

impl From<Task> for Entity {
    fn from(value: Task) -> Self {
        Self::Task(value)
    }
}

impl From<Contact> for Entity {
    fn from(value: Contact) -> Self {
        Self::Contact(value)
    }
}

/// Decodes an iCalendar or vCard payload into an entity of the given kind.
///
/// # Errors
///
/// - [`EntityError::Malformed`] if the payload cannot be parsed or holds no
///   top-level component of the expected kind.
/// - [`EntityError::MissingIdentity`] if the component has no UID. The
///   decoded entity is carried in the error.
#[tracing::instrument(skip(src), fields(len = src.len()))]
pub fn decode(src: &str, kind: EntityKind) -> Result<Entity, EntityError> {
    let roots = parse_components(src)?;
    let entity = match kind {
        EntityKind::Contact => {
            let card = roots
                .iter()
                .find(|c| c.name == "VCARD")
                .ok_or_else(|| EntityError::Malformed("no VCARD component".to_string()))?;
            Entity::Contact(Contact::from_component(card))
        }
        EntityKind::Event | EntityKind::Task => {
            let calendar = roots
                .into_iter()
                .find(|c| c.name == "VCALENDAR")
                .ok_or_else(|| EntityError::Malformed("no VCALENDAR component".to_string()))?;
            let (main, companions) = split_calendar(calendar, kind.component_name())?;
            match kind {
                EntityKind::Event => Entity::Event(Event::from_component(&main, companions)),
                _ => Entity::Task(Task::from_component(&main, companions)),
            }
        }
    };

    if entity.uid().trim().is_empty() {
        return Err(EntityError::MissingIdentity(Box::new(entity)));
    }
    Ok(entity)
}

/// Picks the master component out of a calendar object.
///
/// Recurrence overrides share the UID of the master and carry a
/// `RECURRENCE-ID`, so the first component without one wins.
fn split_calendar(
    calendar: Component,
    name: &str,
) -> Result<(Component, Vec<Component>), EntityError> {
    let index = calendar
        .children
        .iter()
        .position(|c| c.name == name && c.property("RECURRENCE-ID").is_none())
        .or_else(|| calendar.children.iter().position(|c| c.name == name))
        .ok_or_else(|| EntityError::Malformed(format!("no {name} component")))?;

    let mut companions = calendar.children;
    let main = companions.remove(index);
    Ok((main, companions))
}

/// Encodes an entity to its wire form.
///
/// The output is a pure function of the field values, so two entities that
/// compare equal encode to identical bytes.
pub fn encode(entity: &Entity) -> String {
    let mut f = Formatter::new();
    match entity {
        Entity::Contact(contact) => f.component(&contact.to_component()),
        Entity::Event(event) => write_calendar(&mut f, &event.companions, &event.to_component()),
        Entity::Task(task) => write_calendar(&mut f, &task.companions, &task.to_component()),
    }
    f.finish()
}

fn write_calendar(f: &mut Formatter, companions: &[Component], main: &Component) {
    f.begin("VCALENDAR");
    f.line(&ContentLine::new("VERSION", "2.0"));
    f.line(&ContentLine::new("PRODID", PRODID));
    for companion in companions {
        f.component(companion);
    }
    f.component(main);
    f.end("VCALENDAR");
}
