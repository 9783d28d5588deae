//! HTTP request and response types exchanged with a `Transport`.
//!
//! # Design
//! Requests and responses are plain data. `WaqiApi` builds `HttpRequest`
//! values and parses `HttpResponse` values without touching the network;
//! a `Transport` executes the round trip in between. Every call to the API
//! is a GET, so there is no method field.

/// A GET request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute URL without the query string.
    pub url: String,
    /// Query parameters in the order they are sent. `token` is always first.
    pub query: Vec<(String, String)>,
}

impl HttpRequest {
    /// Look up a query parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
