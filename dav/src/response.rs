// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Multistatus (RFC 4918 §13) response parser.

use quick_xml::events::Event;

use crate::error::DavError;
use crate::types::{CollectionInfo, ETag, FetchedResource, Href, Member, MultiGetResult};
use crate::xml::resolve_reference;

/// `WebDAV` multistatus response.
#[derive(Debug, Clone, Default)]
pub struct MultiStatusResponse {
    /// The response items.
    pub responses: Vec<ResponseItem>,
}

/// Individual response in multistatus.
#[derive(Debug, Clone, Default)]
pub struct ResponseItem {
    /// The href the response is about.
    pub href: Href,
    /// Property groups, each with its own status.
    pub prop_stats: Vec<PropStat>,
    /// Response-level status, used e.g. for missing members in a multiget.
    pub status: Option<u16>,
}

/// Property stat with status and value.
#[derive(Debug, Clone, Default)]
pub struct PropStat {
    /// Properties in this group.
    pub props: Properties,
    /// HTTP status code of the group.
    pub status: u16,
}

/// Properties understood by the parser.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    /// `displayname`.
    pub display_name: Option<String>,
    /// Local names of the elements inside `resourcetype`.
    pub resource_type: Vec<String>,
    /// `getetag`.
    pub get_etag: Option<ETag>,
    /// `getctag`.
    pub get_ctag: Option<String>,
    /// `calendar-data` or `address-data`.
    pub data: Option<String>,
}

impl ResponseItem {
    fn ok_props(&self) -> impl Iterator<Item = &Properties> {
        self.prop_stats
            .iter()
            .filter(|p| (200..300).contains(&p.status))
            .map(|p| &p.props)
    }

    fn is_ok(&self) -> bool {
        self.status.is_none_or(|s| (200..300).contains(&s))
    }
}

impl MultiStatusResponse {
    /// Parses multistatus response from XML.
    ///
    /// Text, CDATA sections and entity references are joined, so payloads
    /// escaped either way come out identical.
    ///
    /// # Errors
    ///
    /// Returns an error if XML parsing fails.
    pub fn from_xml(xml: &str) -> Result<Self, DavError> {
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(false);
        reader.config_mut().check_end_names = true;

        let mut responses = Vec::new();
        let mut response: Option<ResponseItem> = None;
        let mut prop_stat: Option<PropStat> = None;
        let mut path: Vec<String> = Vec::new();
        let mut text = String::new();

        loop {
            match reader.read_event()? {
                Event::Eof => break,

                Event::Start(e) => {
                    let name = local_name(e.name().local_name().into_inner())?;
                    match name.as_str() {
                        "response" => response = Some(ResponseItem::default()),
                        "propstat" => prop_stat = Some(PropStat::default()),
                        _ => {}
                    }
                    if parent_is(&path, "resourcetype")
                        && let Some(ps) = prop_stat.as_mut()
                    {
                        ps.props.resource_type.push(name.clone());
                    }
                    path.push(name);
                    text.clear();
                }

                Event::Empty(e) => {
                    let name = local_name(e.name().local_name().into_inner())?;
                    if parent_is(&path, "resourcetype")
                        && let Some(ps) = prop_stat.as_mut()
                    {
                        ps.props.resource_type.push(name);
                    }
                }

                Event::Text(e) => text.push_str(&e.decode().map_err(quick_xml::Error::from)?),
                Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
                Event::GeneralRef(e) => {
                    text.push_str(&resolve_reference(&String::from_utf8_lossy(&e)));
                }

                Event::End(_) => {
                    let Some(name) = path.pop() else {
                        return Err(DavError::Xml("unbalanced end tag".to_string()));
                    };
                    let value = std::mem::take(&mut text);
                    let parent = path.last().map(String::as_str);
                    match (name.as_str(), parent) {
                        ("href", Some("response")) => {
                            if let Some(r) = response.as_mut() {
                                r.href = Href::new(value.trim().to_string());
                            }
                        }
                        ("status", Some("response")) => {
                            if let Some(r) = response.as_mut() {
                                r.status = parse_status(&value);
                            }
                        }
                        ("status", Some("propstat")) => {
                            if let Some(ps) = prop_stat.as_mut() {
                                ps.status = parse_status(&value).unwrap_or_default();
                            }
                        }
                        (prop, Some("prop")) => {
                            if let Some(ps) = prop_stat.as_mut() {
                                assign_property(&mut ps.props, prop, value);
                            }
                        }
                        ("propstat", _) => {
                            if let (Some(r), Some(ps)) = (response.as_mut(), prop_stat.take()) {
                                r.prop_stats.push(ps);
                            }
                        }
                        ("response", _) => responses.extend(response.take()),
                        _ => {}
                    }
                }

                _ => {}
            }
        }

        Ok(Self { responses })
    }

    /// Interprets the response of a depth 0 `PROPFIND` on a collection.
    #[must_use]
    pub fn into_collection_info(self) -> CollectionInfo {
        let mut info = CollectionInfo::default();
        let Some(response) = self.responses.into_iter().next() else {
            return info;
        };

        for props in response.ok_props() {
            if props.display_name.is_some() {
                info.display_name.clone_from(&props.display_name);
            }
            if props.get_ctag.is_some() {
                info.ctag.clone_from(&props.get_ctag);
            }
            info.is_calendar |= props.resource_type.iter().any(|t| t == "calendar");
            info.is_address_book |= props.resource_type.iter().any(|t| t == "addressbook");
        }
        info.href = Some(response.href);
        info
    }

    /// Interprets the response of a depth 1 `PROPFIND` as collection members.
    ///
    /// The collection itself and nested collections are skipped.
    #[must_use]
    pub fn into_members(self, collection: &Href) -> Vec<Member> {
        self.responses
            .into_iter()
            .filter(|r| r.is_ok() && !r.href.same_path(collection))
            .filter(|r| {
                !r.ok_props()
                    .any(|p| p.resource_type.iter().any(|t| t == "collection"))
            })
            .map(|r| {
                let etag = r.ok_props().find_map(|p| p.get_etag.clone());
                Member { href: r.href, etag }
            })
            .collect()
    }

    /// Interprets the response of a multiget report.
    ///
    /// Responses with an error status or without payload end up in
    /// [`MultiGetResult::missing`].
    #[must_use]
    pub fn into_multiget(self) -> MultiGetResult {
        let mut result = MultiGetResult::default();
        for response in self.responses {
            let found = response.is_ok().then(|| {
                let data = response.ok_props().find_map(|p| p.data.clone())?;
                let etag = response.ok_props().find_map(|p| p.get_etag.clone());
                Some((data, etag))
            });

            match found.flatten() {
                Some((data, etag)) => result.found.push(FetchedResource {
                    href: response.href,
                    etag,
                    data,
                }),
                None => result.missing.push(response.href),
            }
        }
        result
    }
}

fn local_name(raw: &[u8]) -> Result<String, DavError> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))
}

fn parent_is(path: &[String], name: &str) -> bool {
    path.last().is_some_and(|p| p == name)
}

fn assign_property(props: &mut Properties, name: &str, value: String) {
    match name {
        "displayname" => props.display_name = Some(value.trim().to_string()),
        "getetag" => props.get_etag = Some(ETag::new(value.trim().to_string())),
        "getctag" => props.get_ctag = Some(value.trim().to_string()),
        "calendar-data" | "address-data" => {
            let data = value.trim();
            if !data.is_empty() {
                props.data = Some(data.to_string());
            }
        }
        _ => {}
    }
}

/// Extracts the code from a status line such as `HTTP/1.1 404 Not Found`.
fn parse_status(line: &str) -> Option<u16> {
    line.split_whitespace().nth(1)?.parse().ok()
}
