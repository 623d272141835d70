// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use reqwest::RequestBuilder;

use crate::error::DavError;

/// How requests authenticate against the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthMethod {
    /// Anonymous access.
    #[default]
    None,
    /// HTTP Basic.
    Basic {
        /// Account name.
        username: String,
        /// Account password or app password.
        password: String,
    },
    /// `Authorization: Bearer`, e.g. an OAuth access token.
    Bearer {
        /// The token.
        token: String,
    },
}

impl AuthMethod {
    /// Adds the credentials to a request.
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Self::None => req,
            Self::Basic { username, password } => req.basic_auth(username, Some(password)),
            Self::Bearer { token } => req.bearer_auth(token),
        }
    }
}

/// Server configuration shared by every collection of one account.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DavConfig {
    /// Base URL of the server, e.g. `https://dav.example.com`. Collection
    /// paths are appended to it.
    pub base_url: String,

    /// Credentials, anonymous when absent.
    #[serde(default)]
    pub auth: AuthMethod,

    /// Per-request timeout in seconds. Expiry surfaces as a transport error.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sent as `User-Agent`.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Proxy for every request, e.g. `socks5h://127.0.0.1:9050`.
    #[serde(default)]
    pub proxy: Option<String>,
}

const fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("davsync/", env!("CARGO_PKG_VERSION")).to_string()
}

impl DavConfig {
    /// Configuration for `base_url` with defaults for everything else.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// The request timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks values the HTTP client would otherwise reject late.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::Config`] if the base URL is not an absolute
    /// `http(s)` URL or the timeout is zero.
    pub fn validate(&self) -> Result<(), DavError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| DavError::Config(format!("invalid base URL {}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DavError::Config(format!(
                "unsupported scheme {} in base URL",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(DavError::Config("timeout must be at least 1 second".into()));
        }
        Ok(())
    }
}

impl Default for DavConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth: AuthMethod::default(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            proxy: None,
        }
    }
}
