// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Codec for the entities exchanged with `CalDAV`/`CardDAV` servers.
//!
//! Tasks (`VTODO`) and events (`VEVENT`) are carried in iCalendar (RFC 5545),
//! contacts in vCard 3.0 (RFC 2426). Both formats share the content-line
//! grammar, so one lexer and one formatter serve all three kinds.
//!
//! Properties the typed models do not know about are kept verbatim, which
//! makes `decode` followed by `encode` safe to push back to a server.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

mod component;
mod contact;
mod entity;
mod error;
mod event;
mod formatter;
mod kind;
mod lexer;
mod line;
mod property;
mod task;

pub use crate::component::{Component, parse_components};
pub use crate::contact::Contact;
pub use crate::entity::{Entity, decode, encode};
pub use crate::error::EntityError;
pub use crate::event::{Event, EventStatus};
pub use crate::formatter::Formatter;
pub use crate::kind::EntityKind;
pub use crate::line::{ContentLine, Parameter, escape_text, parse_lines, unescape_text};
pub use crate::property::{Classification, Property};
pub use crate::task::{Task, TodoStatus};

/// Product identifier written into every generated iCalendar object.
pub const PRODID: &str = "-//davsync//davsync-entity//EN";
