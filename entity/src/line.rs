// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Content lines: `NAME *(";" param) ":" value`.

use logos::Logos;

use crate::error::EntityError;
use crate::lexer::Token;

/// A property parameter such as `TZID=Europe/Vienna` or `TYPE=work,pref`.
///
/// Values are stored without surrounding quotes. A list keeps one entry per
/// element, so `CN="Doe, John"` is one value and `TYPE=work,pref` two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Upper-cased parameter name.
    pub name: String,
    /// Parameter values, unquoted.
    pub values: Vec<String>,
}

impl Parameter {
    /// Creates a single-valued parameter, upper-casing the name.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::list(name, [value])
    }

    /// Creates a parameter with a list of values.
    pub fn list<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            name: name.into().to_ascii_uppercase(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// The first value, empty if there is none.
    pub fn value(&self) -> &str {
        self.values.first().map_or("", String::as_str)
    }
}

/// One unfolded content line.
///
/// The value is kept in its escaped wire form; use [`unescape_text`] for
/// properties of type TEXT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Upper-cased property name.
    pub name: String,
    /// Parameters in their original order.
    pub params: Vec<Parameter>,
    /// Raw value.
    pub value: String,
}

impl ContentLine {
    /// Creates a content line without parameters.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
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

    /// Returns the first value of the first parameter with the given name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(Parameter::value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Name,
    ParamName,
    ParamValue { quoted: bool },
    Value,
}

#[derive(Debug, Default)]
struct LineBuilder {
    name: String,
    params: Vec<Parameter>,
    param_name: String,
    param_values: Vec<String>,
    param_value: String,
    value: String,
}

impl LineBuilder {
    /// Appends unquoted parameter text, where commas separate list values.
    fn push_unquoted(&mut self, text: &str) {
        let mut parts = text.split(',');
        if let Some(first) = parts.next() {
            self.param_value.push_str(first);
        }
        for part in parts {
            self.end_value();
            self.param_value.push_str(part);
        }
    }

    fn end_value(&mut self) {
        let value = std::mem::take(&mut self.param_value);
        self.param_values.push(value);
    }

    fn push_param(&mut self) {
        self.end_value();
        let name = std::mem::take(&mut self.param_name);
        let values = std::mem::take(&mut self.param_values);
        self.params.push(Parameter::list(name.trim(), values));
    }

    /// vCard 2.1 style `TEL;CELL:...` is read as `TYPE=CELL`.
    fn push_bare_param(&mut self) {
        let name = std::mem::take(&mut self.param_name);
        self.params.push(Parameter::new("TYPE", name.trim()));
    }

    fn finish(&mut self) -> ContentLine {
        let built = std::mem::take(self);
        ContentLine {
            name: built.name.trim().to_ascii_uppercase(),
            params: built.params,
            value: built.value,
        }
    }
}

/// Splits `src` into unfolded content lines.
///
/// Blank lines are ignored. A line without a colon, an unterminated quoted
/// parameter, or a character the grammar does not allow is reported as
/// [`EntityError::Malformed`].
///
/// # Errors
///
/// Returns [`EntityError::Malformed`] on any syntax error.
pub fn parse_lines(src: &str) -> Result<Vec<ContentLine>, EntityError> {
    let mut lines = Vec::new();
    let mut state = State::Name;
    let mut line = LineBuilder::default();

    let mut lexer = Token::lexer(src);
    while let Some(token) = lexer.next() {
        let Ok(token) = token else {
            return Err(malformed(src, lexer.span().start, "unexpected character"));
        };

        state = match (state, token) {
            (State::Name, Token::Text(s)) => {
                line.name.push_str(s);
                State::Name
            }
            (State::Name, Token::Newline) if line.name.trim().is_empty() => {
                line.name.clear();
                State::Name
            }
            (State::Name, Token::Semicolon) if !line.name.trim().is_empty() => State::ParamName,
            (State::Name, Token::Colon) if !line.name.trim().is_empty() => State::Value,

            (State::ParamName, Token::Text(s)) => {
                line.param_name.push_str(s);
                State::ParamName
            }
            (State::ParamName, Token::Equal) => State::ParamValue { quoted: false },
            (State::ParamName, Token::Semicolon) if !line.param_name.trim().is_empty() => {
                line.push_bare_param();
                State::ParamName
            }
            (State::ParamName, Token::Colon) if !line.param_name.trim().is_empty() => {
                line.push_bare_param();
                State::Value
            }

            (State::ParamValue { quoted: true }, Token::DQuote) => {
                State::ParamValue { quoted: false }
            }
            (State::ParamValue { quoted: true }, Token::Newline) => {
                return Err(malformed(src, lexer.span().start, "unterminated quote"));
            }
            (State::ParamValue { quoted: true }, _) => {
                line.param_value.push_str(lexer.slice());
                State::ParamValue { quoted: true }
            }
            (State::ParamValue { quoted: false }, Token::DQuote) => {
                State::ParamValue { quoted: true }
            }
            (State::ParamValue { quoted: false }, Token::Text(_) | Token::Equal) => {
                line.push_unquoted(lexer.slice());
                State::ParamValue { quoted: false }
            }
            (State::ParamValue { quoted: false }, Token::Semicolon) => {
                line.push_param();
                State::ParamName
            }
            (State::ParamValue { quoted: false }, Token::Colon) => {
                line.push_param();
                State::Value
            }

            (State::Value, Token::Newline) => {
                lines.push(line.finish());
                State::Name
            }
            (State::Value, _) => {
                line.value.push_str(lexer.slice());
                State::Value
            }

            (_, token) => {
                return Err(malformed(
                    src,
                    lexer.span().start,
                    &format!("unexpected {token}"),
                ));
            }
        };
    }

    match state {
        State::Value => lines.push(line.finish()),
        State::Name if line.name.trim().is_empty() => {}
        _ => return Err(EntityError::Malformed("unexpected end of input".to_string())),
    }

    Ok(lines)
}

fn malformed(src: &str, offset: usize, what: &str) -> EntityError {
    let line_no = src.get(..offset).map_or(0, |s| s.matches('\n').count()) + 1;
    EntityError::Malformed(format!("{what} on line {line_no}"))
}

/// Escapes a TEXT value for the wire.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

/// Reverses [`escape_text`]. Unknown escapes keep the escaped character.
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(c) => out.push(c),
            None => out.push('\\'),
        }
    }
    out
}
