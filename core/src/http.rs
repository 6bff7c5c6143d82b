//! HTTP transport types shared by the client and the scenarios.
//!
//! # Design
//! `HttpRequest` is plain data built by `ApiClient::build_request` without
//! touching the network, so request shape is testable in isolation.
//! `HttpResponse` is the uniform result of every round trip: whatever the
//! status, the caller gets status, headers, decoded body and duration and
//! decides for itself what counts as success.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// Overall deadline for this call, replacing the client's timeouts.
    pub timeout: Option<Duration>,
}

/// Per-call additions to a request.
///
/// `headers` replace client defaults of the same (case-insensitive) name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The uniform outcome of a completed round trip.
///
/// Header names are lower-cased. The body is decoded as JSON when possible;
/// an empty payload becomes `Value::Null` and anything that is not JSON is
/// kept verbatim as `Value::String`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn new(
        url: impl Into<String>,
        status: u16,
        headers: BTreeMap<String, String>,
        raw_body: &str,
        duration_ms: u64,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            headers,
            body: decode_body(raw_body),
            duration_ms,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the body carries no record: null, `""`, `{}` or `[]`.
    pub fn body_is_empty(&self) -> bool {
        match &self.body {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Build a response from raw body bytes. Bytes that are not UTF-8 are
    /// replaced, never rejected: a status was received.
    pub fn from_bytes(
        url: impl Into<String>,
        status: u16,
        headers: BTreeMap<String, String>,
        raw_body: &[u8],
        duration_ms: u64,
    ) -> Self {
        Self::new(url, status, headers, &String::from_utf8_lossy(raw_body), duration_ms)
    }

    /// Integer `id` of the returned record, if the body is a record with one.
    pub fn record_id(&self) -> Option<i64> {
        self.body.get("id").and_then(Value::as_i64)
    }
}

fn decode_body(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
