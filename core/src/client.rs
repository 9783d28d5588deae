//! Async client for the WAQI API.
//!
//! # Design
//! `WaqiClient` pairs a `WaqiApi` (builds requests, parses envelopes) with
//! one session. Who closes the session depends on where it came from:
//!
//! - sessions the client creates, or receives by value through
//!   `with_owned_session`, are closed by `close()` or on drop;
//! - sessions passed in as `Arc` stay with the caller and are never closed
//!   by the client.
//!
//! Calls take `&self` and the client holds no mutable state besides the
//! session slot, so one client can serve concurrent calls without locking.
//! `close` takes `&mut self`, which rules out closing under an in-flight call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::api::WaqiApi;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::transport::{HttpSession, Transport};

/// Future returned by the body passed to `WaqiClient::scope`.
pub type ScopeFuture<'c, R> = Pin<Box<dyn Future<Output = Result<R, ApiError>> + Send + 'c>>;

enum Session<T> {
    Owned(T),
    Shared(Arc<T>),
}

impl<T> Session<T> {
    fn transport(&self) -> &T {
        match self {
            Session::Owned(transport) => transport,
            Session::Shared(transport) => transport.as_ref(),
        }
    }
}

/// World Air Quality Index API client.
pub struct WaqiClient<T: Transport = HttpSession> {
    api: WaqiApi,
    session: Option<Session<T>>,
}

impl WaqiClient<HttpSession> {
    /// Client against the public API with a client-owned session.
    pub fn new(token: &str) -> Result<Self, ApiError> {
        Self::with_config(token, ClientConfig::default())
    }

    /// Client with a client-owned session using `config.timeout()`.
    pub fn with_config(token: &str, config: ClientConfig) -> Result<Self, ApiError> {
        let session = HttpSession::new(config.timeout())?;
        Ok(Self::with_owned_session(token, session, &config))
    }
}

impl<T: Transport> WaqiClient<T> {
    /// Client over a session the caller keeps. `close` releases the client's
    /// handle but never closes the session.
    pub fn with_session(token: &str, session: Arc<T>, config: &ClientConfig) -> Self {
        Self {
            api: WaqiApi::new(&config.base_url, token),
            session: Some(Session::Shared(session)),
        }
    }

    /// Client that takes ownership of `session` and closes it.
    pub fn with_owned_session(token: &str, session: T, config: &ClientConfig) -> Self {
        Self {
            api: WaqiApi::new(&config.base_url, token),
            session: Some(Session::Owned(session)),
        }
    }

    pub fn owns_session(&self) -> bool {
        matches!(self.session, Some(Session::Owned(_)))
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// GET `path` with the token and `params`, returning the classified payload.
    #[tracing::instrument(skip(self, params), fields(base_url = %self.api.base_url()))]
    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.execute(self.api.build_get(path, params)).await
    }

    /// Latest readings of `station` (a city name, `@<id>`, or `geo:<lat>;<lng>`).
    #[tracing::instrument(skip(self), fields(base_url = %self.api.base_url()))]
    pub async fn feed(&self, station: &str) -> Result<Value, ApiError> {
        self.execute(self.api.build_feed(station)).await
    }

    /// Search stations by name.
    #[tracing::instrument(skip(self), fields(base_url = %self.api.base_url()))]
    pub async fn search(&self, keyword: &str) -> Result<Value, ApiError> {
        self.execute(self.api.build_search(keyword)).await
    }

    async fn execute(&self, request: HttpRequest) -> Result<Value, ApiError> {
        let session = self.session.as_ref().ok_or(ApiError::SessionClosed)?;
        let result = match session.transport().execute(&request).await {
            Ok(response) => {
                debug!(status = response.status, body = %response.body, "JSON data");
                self.api.parse_response(response)
            }
            Err(err) => Err(err),
        };
        match &result {
            Err(err) if err.is_transport() => warn!(error = %err, "API request failed"),
            Err(err) => debug!(error = %err, "API reported failure"),
            Ok(_) => {}
        }
        result
    }

    /// Release the session. Owned sessions are closed exactly once; calling
    /// this again is a no-op.
    pub fn close(&mut self) {
        match self.session.take() {
            Some(Session::Owned(transport)) => {
                transport.close();
                debug!("closed owned session");
            }
            Some(Session::Shared(_)) => debug!("released shared session"),
            None => {}
        }
    }

    /// Run `body` with the client, then close it, whether `body` failed or not.
    ///
    /// ```no_run
    /// # async fn demo() -> Result<(), waqi_core::ApiError> {
    /// let client = waqi_core::WaqiClient::new("token")?;
    /// let _feed = client
    ///     .scope(|c| Box::pin(async move { c.feed("beijing").await }))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scope<F, R>(mut self, body: F) -> Result<R, ApiError>
    where
        F: for<'c> FnOnce(&'c Self) -> ScopeFuture<'c, R>,
    {
        let result = body(&self).await;
        self.close();
        result
    }
}

impl<T: Transport> Drop for WaqiClient<T> {
    fn drop(&mut self) {
        self.close();
    }
}
