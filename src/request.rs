//! Request and response value types
//!
//! A [`RequestDescriptor`] is the gateway's view of an outbound request:
//! method, absolute URL, and headers. Its cache identity is the
//! `(method, url)` pair; headers never participate in the identity and are
//! consulted only for the range-bypass rule.

use bytes::Bytes;
use std::fmt;

/// An outbound request as seen by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// HTTP method, uppercase (GET, POST, ...)
    pub method: String,
    /// Absolute URL including origin
    pub url: String,
    /// Header name/value pairs as received; names matched case-insensitively
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// Create a descriptor with no headers
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            url: url.to_string(),
            headers: Vec::new(),
        }
    }

    /// Convenience constructor for a plain GET
    pub fn get(url: &str) -> Self {
        Self::new("GET", url)
    }

    /// Attach a header (builder style)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Look up a header value, case-insensitive on the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the request carries a byte-range directive.
    ///
    /// Ranged requests are never intercepted: partial fetches are
    /// incompatible with whole-response caching.
    pub fn has_range_header(&self) -> bool {
        self.header("range").is_some()
    }

    /// Storage key for cache lookup: `METHOD url`.
    ///
    /// Headers are deliberately excluded so that the same resource fetched
    /// with different header sets maps to one entry.
    pub fn identity(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A response as stored in (and served from) the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Full response body
    pub body: Bytes,
}

impl StoredResponse {
    /// Create a response with no headers
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Shorthand for a 200 response
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, body)
    }

    /// Whether the status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a response header, case-insensitive on the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
