// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Content-line formatter.
//!
//! Lines end with CRLF and are folded at 75 octets, never inside a UTF-8
//! sequence. Continuation lines start with a single space.

use std::fmt::Write;

use crate::component::Component;
use crate::line::ContentLine;

const MAX_LINE_OCTETS: usize = 75;

/// Accumulates formatted content lines.
#[derive(Debug, Default)]
pub struct Formatter {
    buf: String,
}

impl Formatter {
    /// Creates an empty formatter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `BEGIN:<name>`.
    pub fn begin(&mut self, name: &str) {
        self.line(&ContentLine::new("BEGIN", name));
    }

    /// Writes `END:<name>`.
    pub fn end(&mut self, name: &str) {
        self.line(&ContentLine::new("END", name));
    }

    /// Writes one content line.
    pub fn line(&mut self, line: &ContentLine) {
        let mut raw = String::with_capacity(line.name.len() + line.value.len() + 1);
        raw.push_str(&line.name);
        for param in &line.params {
            let _ = write!(raw, ";{}=", param.name);
            for (i, value) in param.values.iter().enumerate() {
                if i > 0 {
                    raw.push(',');
                }
                // DQUOTE cannot appear in a parameter value
                let value = value.replace('"', "");
                if value.contains([':', ';', ',']) {
                    let _ = write!(raw, "\"{value}\"");
                } else {
                    raw.push_str(&value);
                }
            }
        }
        raw.push(':');
        raw.push_str(&line.value);
        fold_into(&raw, &mut self.buf);
    }

    /// Writes a component and all of its children.
    pub fn component(&mut self, component: &Component) {
        self.begin(&component.name);
        for line in &component.properties {
            self.line(line);
        }
        for child in &component.children {
            self.component(child);
        }
        self.end(&component.name);
    }

    /// Returns the formatted text.
    pub fn finish(self) -> String {
        self.buf
    }
}

fn fold_into(line: &str, out: &mut String) {
    let mut budget = MAX_LINE_OCTETS;
    let mut used = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if used + len > budget {
            out.push_str("\r\n ");
            // the leading space counts towards the continuation line
            budget = MAX_LINE_OCTETS - 1;
            used = 0;
        }
        out.push(c);
        used += len;
    }
    out.push_str("\r\n");
}
