// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Lexer for content lines as shared by RFC 5545 and RFC 2426.

use std::fmt::{self, Display};

use logos::Logos;

/// Token emitted by the content-line lexer.
///
/// Folded lines (a line break followed by a space or a tab) are skipped, so a
/// folded value arrives as consecutive tokens that only need concatenation.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Logos)]
#[logos(skip r"\r?\n[ \t]")]
pub enum Token<'a> {
    /// Double Quote (")
    #[token("\"")]
    DQuote,

    /// Colon (:), separates the name and parameters from the value
    #[token(":")]
    Colon,

    /// Semicolon (;), introduces a parameter
    #[token(";")]
    Semicolon,

    /// Equal sign (=), separates a parameter name from its value
    #[token("=")]
    Equal,

    /// End of a content line, CRLF or a bare LF
    #[regex(r"\r?\n")]
    Newline,

    /// Any run of characters without special meaning
    #[regex(r#"[^:;="\r\n]+"#)]
    Text(&'a str),
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DQuote => write!(f, "DQuote"),
            Self::Colon => write!(f, "Colon"),
            Self::Semicolon => write!(f, "Semicolon"),
            Self::Equal => write!(f, "Equal"),
            Self::Newline => write!(f, "Newline"),
            Self::Text(s) => write!(f, "Text({s})"),
        }
    }
}
