//! The HTTP session seam.
//!
//! # Design
//! `Transport` is the one place that performs I/O. `HttpSession` implements
//! it on top of a pooled `reqwest::Client`, which is safe to share between
//! concurrent calls. Transport errors are translated here: timeouts become
//! `ApiError::Timeout`, everything else (DNS, refused connection, non-2xx
//! status) becomes `ApiError::ConnectionFailed`, with the reqwest error kept
//! as the source.
//!
//! Dropping an in-flight `execute` future aborts the request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes `HttpRequest`s against the network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one GET round trip.
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;

    /// Release the session's resources. Called at most once, and only by the
    /// client that owns the session.
    fn close(&self) {}
}

/// reqwest-backed session.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    /// Build a session whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ConnectionFailed(Box::new(e)))?;
        Ok(Self { client })
    }

    /// Wrap a caller-configured client. Its timeout settings are kept as-is.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpSession {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = self
            .client
            .get(&request.url)
            .query(&request.query)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(translate)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(translate)?;
        Ok(HttpResponse { status, body })
    }
}

/// Errors never carry the request URL; its query holds the token.
fn translate(err: reqwest::Error) -> ApiError {
    let err = err.without_url();
    if err.is_timeout() {
        ApiError::Timeout(Box::new(err))
    } else {
        ApiError::ConnectionFailed(Box::new(err))
    }
}
