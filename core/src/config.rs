//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::BASE_URL;

/// Default per-request timeout, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Settings for a `WaqiClient`.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `WAQI_BASE_URL` | `https://api.waqi.info/` | API root |
/// | `WAQI_TIMEOUT_MS` | `30000` | Per-request timeout of a client-owned session |
///
/// The timeout applies only to sessions the client creates. A session passed
/// in by the caller keeps whatever timeout it was built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Populate config from environment variables, applying defaults where
    /// absent or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("WAQI_BASE_URL").unwrap_or(defaults.base_url),
            timeout_ms: std::env::var("WAQI_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.timeout_ms),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
