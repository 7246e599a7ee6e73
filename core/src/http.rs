//! HTTP request and response values exchanged with a [`Transport`].
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The client
//! builds an `HttpRequest` and parses an `HttpResponse` without touching the
//! network; a [`Transport`] sits between the two and performs the round-trip.
//! Keeping the core this way makes request construction and response
//! handling testable with canned values.
//!
//! [`Transport`]: crate::transport::Transport

use bytes::Bytes;
use http::{Method, StatusCode};

/// An HTTP request described as plain data.
///
/// Built by [`Client::build_track_sign_up`](crate::Client::build_track_sign_up).
/// Headers keep insertion order so tests can compare them directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header whose name matches `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// The body is fully read by the transport; dropping the value releases it.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Response with no headers, mostly useful for canned responses in tests.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}
