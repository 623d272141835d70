// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Client for collection level `CalDAV`/`CardDAV` operations.

use std::sync::Arc;

use reqwest::Method;

use crate::config::DavConfig;
use crate::error::DavError;
use crate::http::HttpClient;
use crate::request::{MultiGetRequest, Prop, PropFindRequest};
use crate::response::MultiStatusResponse;
use crate::types::{
    CollectionInfo, CollectionKind, ETag, FetchedResource, Href, Member, MultiGetResult,
};

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// `CalDAV`/`CardDAV` client bound to one account.
///
/// Cloning is cheap; clones share the underlying connection pool.
///
/// # Example
///
/// ```ignore
/// use davsync_dav::{AuthMethod, DavClient, DavConfig, Href};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DavConfig {
///     base_url: "https://dav.example.com".to_string(),
///     auth: AuthMethod::Basic {
///         username: "user".to_string(),
///         password: "pass".to_string(),
///     },
///     ..Default::default()
/// };
///
/// let client = DavClient::new(config)?;
/// let members = client.list_members(&Href::from("/dav/calendars/user/tasks/")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DavClient {
    http: Arc<HttpClient>,
    config: DavConfig,
}

impl DavClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client initialization fails.
    pub fn new(config: DavConfig) -> Result<Self, DavError> {
        let http = HttpClient::new(config.clone())?;
        Ok(Self {
            http: Arc::new(http),
            config,
        })
    }

    /// Reads display name, resource type and `CTag` of a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if PROPFIND fails.
    #[tracing::instrument(skip_all, fields(collection = %collection))]
    pub async fn collection_info(&self, collection: &Href) -> Result<CollectionInfo, DavError> {
        let mut propfind = PropFindRequest::new();
        propfind
            .add_property(Prop::DisplayName)
            .add_property(Prop::ResourceType)
            .add_property(Prop::GetCTag);

        let multistatus = self.propfind(collection, &propfind, "0").await?;
        Ok(multistatus.into_collection_info())
    }

    /// Lists the members of a collection with their `ETag`s.
    ///
    /// # Errors
    ///
    /// Returns an error if PROPFIND fails.
    #[tracing::instrument(skip_all, fields(collection = %collection))]
    pub async fn list_members(&self, collection: &Href) -> Result<Vec<Member>, DavError> {
        let mut propfind = PropFindRequest::new();
        propfind
            .add_property(Prop::ResourceType)
            .add_property(Prop::GetETag);

        let multistatus = self.propfind(collection, &propfind, "1").await?;
        let members = multistatus.into_members(collection);
        tracing::debug!(count = members.len(), "listed members");
        Ok(members)
    }

    /// Fetches several members in one multiget report.
    ///
    /// # Errors
    ///
    /// Returns an error if the REPORT fails as a whole. Individual missing
    /// members are reported in [`MultiGetResult::missing`].
    #[tracing::instrument(skip_all, fields(collection = %collection, count = hrefs.len()))]
    pub async fn multiget(
        &self,
        collection: &Href,
        kind: CollectionKind,
        hrefs: &[Href],
    ) -> Result<MultiGetResult, DavError> {
        if hrefs.is_empty() {
            return Ok(MultiGetResult::default());
        }

        let mut multiget = MultiGetRequest::new(kind);
        for href in hrefs {
            multiget.add_href(href.clone());
        }
        let xml_body = multiget.build()?;

        let url = self.full_url(collection);
        let resp = self
            .http
            .execute(
                self.http
                    .build_extension_request("REPORT", &url)?
                    .header("Content-Type", XML_CONTENT_TYPE)
                    .header("Depth", "1")
                    .body(xml_body),
            )
            .await?;

        let xml = resp.text().await?;
        let mut result = MultiStatusResponse::from_xml(&xml)?.into_multiget();

        // Servers may silently drop members that vanished in the meantime.
        for href in hrefs {
            let answered = result.found.iter().any(|r| r.href.same_path(href))
                || result.missing.iter().any(|m| m.same_path(href));
            if !answered {
                result.missing.push(href.clone());
            }
        }
        Ok(result)
    }

    /// Fetches a single member.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::NotFound`] if the member does not exist.
    pub async fn get(&self, href: &Href) -> Result<FetchedResource, DavError> {
        let url = self.full_url(href);
        let resp = self
            .http
            .execute(self.http.build_request(Method::GET, &url))
            .await?;

        let etag = HttpClient::extract_etag(&resp);
        let data = resp.text().await?;
        Ok(FetchedResource {
            href: href.clone(),
            etag,
            data,
        })
    }

    /// Uploads a member.
    ///
    /// With `expected` set the upload only replaces that exact version
    /// (`If-Match`); without it the upload only creates (`If-None-Match: *`).
    /// Returns the new `ETag` if the server sent one.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::Conflict`] if the precondition failed.
    #[tracing::instrument(skip_all, fields(href = %href))]
    pub async fn put(
        &self,
        href: &Href,
        body: String,
        content_type: &str,
        expected: Option<&ETag>,
    ) -> Result<Option<ETag>, DavError> {
        let url = self.full_url(href);
        let req = self
            .http
            .build_request(Method::PUT, &url)
            .header("Content-Type", content_type)
            .body(body);
        let req = match expected {
            Some(etag) => HttpClient::if_match(req, etag),
            None => HttpClient::if_none_match_any(req),
        };

        let resp = self.http.execute(req).await?;
        Ok(HttpClient::extract_etag(&resp))
    }

    /// Deletes a member.
    ///
    /// A member that is already gone counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::Conflict`] if `expected` no longer matches.
    #[tracing::instrument(skip_all, fields(href = %href))]
    pub async fn delete(&self, href: &Href, expected: Option<&ETag>) -> Result<(), DavError> {
        let url = self.full_url(href);
        let mut req = self.http.build_request(Method::DELETE, &url);
        if let Some(etag) = expected {
            req = HttpClient::if_match(req, etag);
        }

        match self.http.execute(req).await {
            Ok(_) => Ok(()),
            Err(DavError::NotFound(_)) => {
                tracing::debug!("member already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn propfind(
        &self,
        href: &Href,
        request: &PropFindRequest,
        depth: &str,
    ) -> Result<MultiStatusResponse, DavError> {
        let url = self.full_url(href);
        let resp = self
            .http
            .execute(
                self.http
                    .build_extension_request("PROPFIND", &url)?
                    .header("Content-Type", XML_CONTENT_TYPE)
                    .header("Depth", depth)
                    .body(request.build()?),
            )
            .await?;

        let xml = resp.text().await?;
        MultiStatusResponse::from_xml(&xml)
    }

    /// Builds full URL from href. Absolute URLs are used as they are.
    fn full_url(&self, href: &Href) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.config.base_url.trim_end_matches('/'), href)
        }
    }
}
