// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

/// The closed set of entity kinds a collection can hold.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EntityKind {
    /// Calendar events, `VEVENT` in iCalendar.
    Event,
    /// To-do items, `VTODO` in iCalendar.
    Task,
    /// Contacts, `VCARD`.
    Contact,
}

impl EntityKind {
    /// Name of the component that carries the entity.
    pub const fn component_name(self) -> &'static str {
        match self {
            Self::Event => "VEVENT",
            Self::Task => "VTODO",
            Self::Contact => "VCARD",
        }
    }

    /// File extension appended to the UID to derive a member name.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Event | Self::Task => ".ics",
            Self::Contact => ".vcf",
        }
    }

    /// Media type used for uploads.
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Event | Self::Task => "text/calendar; charset=utf-8",
            Self::Contact => "text/vcard; charset=utf-8",
        }
    }

    /// Whether the entity lives in a `CalDAV` (as opposed to `CardDAV`) collection.
    pub const fn is_calendar(self) -> bool {
        matches!(self, Self::Event | Self::Task)
    }
}
