//! Async client for the World Air Quality Index API (aqicn.org, waqi.info).
//!
//! # Overview
//! Issues GET requests against the station feed and search endpoints and
//! turns the API's response envelopes into a payload or a typed `ApiError`.
//! The API reports most failures inside HTTP 200 bodies, so classification
//! inspects the body rather than the status code.
//!
//! # Design
//! - `envelope` decodes a body into a tagged `Envelope` and classifies it.
//!   Pure, no I/O.
//! - `WaqiApi` builds `HttpRequest` values and parses `HttpResponse` values
//!   (host-does-IO split), so the request/response logic is testable
//!   without a network.
//! - `Transport` is the I/O seam; `HttpSession` implements it with reqwest.
//! - `WaqiClient` ties the two together and owns or borrows one session.
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod api;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod transport;

pub use api::{WaqiApi, BASE_URL};
pub use client::{ScopeFuture, WaqiClient};
pub use config::ClientConfig;
pub use envelope::{classify, Envelope};
pub use error::{ApiError, BoxError};
pub use http::{HttpRequest, HttpResponse};
pub use transport::{HttpSession, Transport};
