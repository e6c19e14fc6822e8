//! Request normalization.
//!
//! # Responsibilities
//! - Resolve the method against the allowed set
//! - Decode the query string into a key/value map
//! - Copy headers in transport order
//! - Assemble the body for methods that carry one
//!
//! # Design Decisions
//! - Method resolves first: a rejected method never touches query, headers, or body
//! - Duplicate query keys: last occurrence wins
//! - Query pieces without `=` are dropped; values are percent-decoded, keys are not

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use serde::Serialize;
use thiserror::Error;

use crate::http::body::{self, RequestBody};
use crate::http::error::PipelineError;
use crate::net::abort::AbortSignal;
use crate::net::transport::TransportRequest;
use crate::validators::is_non_empty_string;

/// Methods that reach the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

pub const VALID_HTTP_METHODS: [Method; 5] = [
    Method::Get,
    Method::Post,
    Method::Put,
    Method::Patch,
    Method::Delete,
];

pub const METHODS_WITH_BODY: [Method; 4] =
    [Method::Post, Method::Put, Method::Patch, Method::Delete];

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    pub fn has_body(&self) -> bool {
        METHODS_WITH_BODY.contains(self)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The token is not one of the allowed methods.
#[derive(Debug, Error)]
#[error("unsupported method `{0}`")]
pub struct UnsupportedMethod(pub String);

impl FromStr for Method {
    type Err = UnsupportedMethod;

    /// Case-insensitive.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let upper = raw.to_ascii_uppercase();
        VALID_HTTP_METHODS
            .iter()
            .copied()
            .find(|m| m.as_str() == upper)
            .ok_or(UnsupportedMethod(upper))
    }
}

/// Request headers in the order the transport enumerated them.
///
/// Setting a name that already exists replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: &str) {
        match self.0.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.0.push((name.to_string(), value.to_string())),
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub type QueryParams = HashMap<String, String>;

/// Canonical request handed to the router. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRequest {
    pub method: Method,
    pub route: String,
    pub query_params: QueryParams,
    pub headers: Headers,
    /// Empty unless the method carries a body.
    pub body: RequestBody,
}

/// A query value whose percent-encoding does not decode to UTF-8.
#[derive(Debug, Error)]
#[error("query parameter `{key}` is not valid percent-encoded UTF-8")]
pub struct QueryError {
    pub key: String,
}

/// Resolve the raw method token.
pub fn parse_method(raw: &str) -> Result<Method, PipelineError> {
    if !is_non_empty_string(Some(raw)) {
        return Err(PipelineError::invalid_method());
    }
    raw.parse::<Method>()
        .map_err(|_| PipelineError::invalid_method())
}

/// Split `k1=v1&k2=v2` into a map, decoding values.
pub fn parse_query_params(raw: &str) -> Result<QueryParams, QueryError> {
    let mut params = QueryParams::new();
    if !is_non_empty_string(Some(raw)) {
        return Ok(params);
    }

    for piece in raw.split('&') {
        let Some((key, value)) = piece.split_once('=') else {
            continue;
        };
        let decoded = percent_decode_str(value)
            .decode_utf8()
            .map_err(|_| QueryError { key: key.to_string() })?;
        params.insert(key.to_string(), decoded.into_owned());
    }
    Ok(params)
}

pub fn parse_headers<T: TransportRequest + ?Sized>(request: &T) -> Headers {
    let mut headers = Headers::new();
    request.for_each_header(&mut |name, value| headers.set(name, value));
    headers
}

/// Build the [`NormalizedRequest`] for one transport request.
pub async fn normalize<T>(
    request: &mut T,
    abort: &AbortSignal,
) -> Result<NormalizedRequest, PipelineError>
where
    T: TransportRequest + ?Sized,
{
    let method = parse_method(request.method())?;
    let route = request.url().to_string();
    let query_params = parse_query_params(request.query()).map_err(PipelineError::malformed_query)?;
    let headers = parse_headers(request);

    let body = if method.has_body() {
        body::assemble(request, abort)
            .await
            .map_err(PipelineError::malformed_body)?
    } else {
        RequestBody::new()
    };

    Ok(NormalizedRequest {
        method,
        route,
        query_params,
        headers,
        body,
    })
}

/// Render pairs as `key = value;` lines for debug logs.
pub fn format_pairs<K, V, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: fmt::Display,
    V: fmt::Display,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{} = {};", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

impl NormalizedRequest {
    /// Multi-line summary used by the pipeline's debug log.
    pub fn describe(&self) -> String {
        let mut query: Vec<_> = self.query_params.iter().collect();
        query.sort();
        format!(
            "Received incoming request:\nMethod => {};\nRoute => {};\nQuery Params => {}\nHeaders => {}\nBody => {}",
            self.method,
            self.route,
            format_pairs(query),
            format_pairs(self.headers.iter()),
            format_pairs(self.body.iter()),
        )
    }
}
