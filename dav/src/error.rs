// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::types::Href;

/// `CalDAV`/`CardDAV` client errors.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DavError {
    /// The server could not be reached, timed out, or failed with a 5xx
    /// status. Retrying later may succeed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server refused the request with a 4xx status.
    #[error("request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// A conditional request failed (HTTP 412).
    #[error("precondition failed for {0}")]
    Conflict(Href),

    /// Resource not found.
    #[error("resource not found: {0}")]
    NotFound(Href),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// The server answered with something we cannot interpret.
    #[error("invalid server response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for DavError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<quick_xml::Error> for DavError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<std::io::Error> for DavError {
    fn from(e: std::io::Error) -> Self {
        Self::Xml(format!("IO error: {e}"))
    }
}
