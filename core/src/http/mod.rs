#![deny(missing_docs)]

//! # HTTP
//!
//! Normalized requests and responses, and the machinery that validates them
//! against a document: value casting, path matching, parameter sets and the
//! per-operation orchestrator.
//!
//! Transport libraries are not wrapped here; callers fill [`Request`] and
//! [`Response`] from whatever they use.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Wire value casting.
pub mod cast;
/// Orchestration of request and response validation.
pub mod operation;
/// Parameter and header validator sets.
pub mod parameters;
/// Path template matching.
pub mod paths;

pub use operation::ApiValidator;

/// A normalized HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Full URL or absolute path, query string included.
    pub url: String,
    /// Lowercased method.
    pub method: String,
    /// `Content-Type` of the body.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Decoded body; `None` when the request has none.
    #[serde(default)]
    pub body: Option<Value>,
    /// Header values by name.
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Query values by name, repeated keys kept in order.
    #[serde(default)]
    pub query: IndexMap<String, Vec<String>>,
}

impl Request {
    /// A request for `url`, with the query string parsed out of it.
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        let url = url.into();
        let query = parse_query(&url);
        Self {
            method: method.to_ascii_lowercase(),
            url,
            query,
            ..Self::default()
        }
    }

    /// Sets a body together with its content type.
    pub fn with_body(mut self, content_type: impl Into<String>, body: Value) -> Self {
        self.content_type = Some(content_type.into());
        self.body = Some(body);
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The path component of the URL, still percent-encoded.
    pub fn path(&self) -> String {
        url_path(&self.url)
    }

    /// Header lookup, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A normalized HTTP response, together with the request that caused it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The originating request; supplies the method.
    pub request: Request,
    /// URL the response was served for.
    pub url: String,
    /// Status code.
    pub status_code: u16,
    /// `Content-Type` of the body.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Decoded body.
    #[serde(default)]
    pub body: Option<Value>,
    /// Header values by name.
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

impl Response {
    /// A response to `request`, served at the request's URL.
    pub fn new(request: Request, status_code: u16) -> Self {
        Self {
            url: request.url.clone(),
            request,
            status_code,
            ..Self::default()
        }
    }

    /// Sets a body together with its content type.
    pub fn with_body(mut self, content_type: impl Into<String>, body: Value) -> Self {
        self.content_type = Some(content_type.into());
        self.body = Some(body);
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The path component of the URL, still percent-encoded.
    pub fn path(&self) -> String {
        url_path(&self.url)
    }

    /// Header lookup, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn parse_url(url: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://localhost")
            .ok()
            .and_then(|base| base.join(url).ok()),
        Err(_) => None,
    }
}

fn url_path(url: &str) -> String {
    match parse_url(url) {
        Some(parsed) => parsed.path().to_string(),
        None => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    }
}

fn parse_query(url: &str) -> IndexMap<String, Vec<String>> {
    let mut query: IndexMap<String, Vec<String>> = IndexMap::new();
    if let Some(parsed) = parse_url(url) {
        for (key, value) in parsed.query_pairs() {
            query
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }
    query
}

fn find_header<'a>(headers: &'a IndexMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// The media type of a `Content-Type` value, without parameters, lowercased.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}
