// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP client wrapper with authentication and `ETag` handling.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};

use crate::config::DavConfig;
use crate::error::DavError;
use crate::types::{ETag, Href};

/// HTTP client scoped to one account.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    config: DavConfig,
}

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the client cannot
    /// be built.
    pub fn new(config: DavConfig) -> Result<Self, DavError> {
        config.validate()?;
        let mut builder = Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent);

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| DavError::Config(format!("invalid proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| DavError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Builds a request with authentication headers.
    pub fn build_request(&self, method: Method, url: &str) -> RequestBuilder {
        self.config.auth.apply(self.client.request(method, url))
    }

    /// Builds a request with an extension method such as `PROPFIND` or `REPORT`.
    ///
    /// # Errors
    ///
    /// Returns an error if `method` is not a valid HTTP token.
    pub fn build_extension_request(
        &self,
        method: &str,
        url: &str,
    ) -> Result<RequestBuilder, DavError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| DavError::Config(format!("invalid method {method}: {e}")))?;
        Ok(self.build_request(method, url))
    }

    /// Executes a request and maps HTTP error statuses.
    ///
    /// - 2xx is returned as is.
    /// - 404 becomes [`DavError::NotFound`].
    /// - 412 becomes [`DavError::Conflict`].
    /// - Other 4xx become [`DavError::Rejected`].
    /// - 5xx become [`DavError::Transport`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or returns an error status code.
    pub async fn execute(&self, req: RequestBuilder) -> Result<Response, DavError> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let href = Href::new(resp.url().path().to_string());
        match status {
            StatusCode::NOT_FOUND => Err(DavError::NotFound(href)),
            StatusCode::PRECONDITION_FAILED => Err(DavError::Conflict(href)),
            status if status.is_server_error() => {
                Err(DavError::Transport(format!("{status} for {href}")))
            }
            status => {
                let text = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read response".to_string());
                tracing::debug!(%status, %href, body = %text, "request rejected");
                Err(DavError::Rejected {
                    status: status.as_u16(),
                    message: text,
                })
            }
        }
    }

    /// Adds If-Match header for conditional updates.
    pub fn if_match(req: RequestBuilder, etag: &ETag) -> RequestBuilder {
        req.header("If-Match", etag.as_str())
    }

    /// Adds `If-None-Match: *`, so the request only creates and never overwrites.
    pub fn if_none_match_any(req: RequestBuilder) -> RequestBuilder {
        req.header("If-None-Match", "*")
    }

    /// Extracts `ETag` from response headers.
    ///
    /// Servers may omit it, e.g. when they rewrite the uploaded body.
    pub fn extract_etag(resp: &Response) -> Option<ETag> {
        resp.headers()
            .get("ETag")
            .and_then(|v| v.to_str().ok())
            .map(|s| ETag::new(s.to_string()))
    }
}
