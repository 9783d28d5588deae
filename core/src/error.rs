//! Error types for the WAQI API client.
//!
//! # Design
//! The API reports most failures inside an HTTP 200 body, so the variants
//! below mirror the markers found in those bodies (`InvalidToken`,
//! `OverQuota`, the three "unknown" lookups) rather than HTTP statuses.
//! Transport failures carry the underlying error as `source()` without
//! exposing the transport library's types in the variant signature.

use std::error::Error as StdError;

/// Boxed underlying cause of a transport failure.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors returned by `WaqiClient` and the envelope classifier.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or unrecognized envelope. Carries the offending `status`
    /// or `data` value.
    #[error("API error: {0}")]
    Api(String),

    /// The API rejected the token.
    #[error("invalid API token")]
    InvalidToken,

    /// The token reached its request quota.
    #[error("API quota exceeded")]
    OverQuota,

    /// Success envelope with empty `data`.
    #[error("unknown city")]
    UnknownCity,

    /// Success envelope whose `data.msg` is `"Unknown ID"`.
    #[error("unknown station ID")]
    UnknownId,

    /// The API reported `"Unknown station"`.
    #[error("unknown station")]
    UnknownStation,

    /// DNS failure, refused connection, or a non-2xx HTTP status.
    #[error("connection to API failed")]
    ConnectionFailed(#[source] BoxError),

    /// The request exceeded the configured timeout.
    #[error("connection to API timed out")]
    Timeout(#[source] BoxError),

    /// The response body is not a JSON object.
    #[error("response decoding failed: {0}")]
    Decode(String),

    /// The client was closed before the call was made.
    #[error("client session is closed")]
    SessionClosed,
}

impl ApiError {
    /// `true` for the lookup failures: unknown city, station or ID.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApiError::UnknownCity | ApiError::UnknownId | ApiError::UnknownStation
        )
    }

    /// `true` when the failure happened below the API, in the transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::ConnectionFailed(_) | ApiError::Timeout(_))
    }
}
