//! Stateless request builder and response parser for the WAQI API.
//!
//! # Design
//! `WaqiApi` holds the base URL and the token and nothing else. Each
//! endpoint has a `build_*` method producing an `HttpRequest`; every
//! response goes through the same `parse_response`, because the API wraps
//! all results in the same envelope. The caller (normally `WaqiClient`)
//! executes the round trip in between.

use serde_json::Value;

use crate::envelope;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Default API root.
pub const BASE_URL: &str = "https://api.waqi.info/";

#[derive(Debug, Clone)]
pub struct WaqiApi {
    base_url: String,
    token: String,
}

impl WaqiApi {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a GET for `path` (relative to the base URL). The token is sent
    /// first, followed by `params` in order.
    pub fn build_get(&self, path: &str, params: &[(&str, &str)]) -> HttpRequest {
        let mut query = Vec::with_capacity(params.len() + 1);
        query.push(("token".to_string(), self.token.clone()));
        query.extend(
            params
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        );
        HttpRequest {
            url: format!("{}/{}", self.base_url, path.trim_start_matches('/')),
            query,
        }
    }

    /// Station feed. An empty `station` is sent as-is; the API answers it
    /// with an error envelope.
    pub fn build_feed(&self, station: &str) -> HttpRequest {
        self.build_get(&format!("feed/{station}/"), &[])
    }

    pub fn build_search(&self, keyword: &str) -> HttpRequest {
        self.build_get("search/", &[("keyword", keyword)])
    }

    /// Decode the body and classify the envelope.
    ///
    /// A non-2xx status is a transport failure here, the same as for
    /// `HttpSession`, so transports that hand back every status still
    /// surface it as `ConnectionFailed`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        if !response.is_success() {
            return Err(ApiError::ConnectionFailed(
                format!("HTTP status {}", response.status).into(),
            ));
        }
        let body: Value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        envelope::classify(body)
    }
}
