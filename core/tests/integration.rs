//! End-to-end tests against the stub API and small inline servers.
//!
//! # Design
//! Each test binds the server to a random port and drives `WaqiClient` over
//! real HTTP with the reqwest-backed `HttpSession`, so the transport error
//! translation is exercised along with classification.

use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use mock_server::StubConfig;
use waqi_core::{ApiError, ClientConfig, HttpSession, WaqiClient};

async fn spawn_stub(config: StubConfig) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run_with(listener, config));
    format!("http://{addr}/")
}

async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await });
    format!("http://{addr}/")
}

fn client(base_url: &str, token: &str) -> WaqiClient {
    WaqiClient::with_config(token, ClientConfig::default().with_base_url(base_url)).unwrap()
}

// ---------------------------------------------------------------------------
// Stub API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn feed_returns_station_data() {
    let base = spawn_stub(StubConfig::default()).await;
    let data = client(&base, "demo").feed("beijing").await.unwrap();
    assert_eq!(data["idx"], 1451);
    assert_eq!(data["city"]["name"], "Beijing");
}

#[tokio::test]
async fn invalid_token_on_feed() {
    let base = spawn_stub(StubConfig::default()).await;
    let err = client(&base, "invalid_token").feed("beijing").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidToken), "got {err:?}");
}

#[tokio::test]
async fn empty_station_is_rejected_by_the_server() {
    let base = spawn_stub(StubConfig::default()).await;
    let err = client(&base, "demo").feed("").await.unwrap_err();
    assert!(matches!(err, ApiError::Api(_)), "got {err:?}");
}

#[tokio::test]
async fn unknown_station_and_id() {
    let base = spawn_stub(StubConfig::default()).await;
    let client = client(&base, "demo");

    let err = client.feed("atlantis").await.unwrap_err();
    assert!(matches!(err, ApiError::UnknownStation), "got {err:?}");

    let err = client.feed("@999999").await.unwrap_err();
    assert!(matches!(err, ApiError::UnknownId), "got {err:?}");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn search_returns_matches() {
    let base = spawn_stub(StubConfig::default()).await;
    let data = client(&base, "demo").search("shang").await.unwrap();
    let results = data.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["station"]["name"], "Shanghai");
}

#[tokio::test]
async fn search_without_match_is_unknown_city() {
    let base = spawn_stub(StubConfig::default()).await;
    let err = client(&base, "demo").search("atlantis").await.unwrap_err();
    assert!(matches!(err, ApiError::UnknownCity), "got {err:?}");
}

#[tokio::test]
async fn invalid_token_on_search() {
    let base = spawn_stub(StubConfig::default()).await;
    let err = client(&base, "nope").search("bei").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidToken), "got {err:?}");
}

#[tokio::test]
async fn over_quota() {
    let base = spawn_stub(StubConfig {
        quota: Some(1),
        ..StubConfig::default()
    })
    .await;
    let client = client(&base, "demo");

    client.feed("beijing").await.unwrap();
    let err = client.feed("beijing").await.unwrap_err();
    assert!(matches!(err, ApiError::OverQuota), "got {err:?}");
}

#[tokio::test]
async fn generic_get_with_extra_params() {
    let base = spawn_stub(StubConfig::default()).await;
    let data = client(&base, "demo")
        .get("search/", &[("keyword", "bangalore")])
        .await
        .unwrap();
    assert_eq!(data[0]["uid"], 8190);
}

#[tokio::test]
async fn concurrent_calls_on_one_client() {
    let base = spawn_stub(StubConfig::default()).await;
    let client = client(&base, "demo");

    let (a, b, c) = tokio::join!(
        client.feed("beijing"),
        client.feed("@1437"),
        client.search("bang"),
    );
    assert_eq!(a.unwrap()["idx"], 1451);
    assert_eq!(b.unwrap()["idx"], 1437);
    assert_eq!(c.unwrap()[0]["uid"], 8190);
}

#[tokio::test]
async fn shared_session_outlives_clients() {
    let base = spawn_stub(StubConfig::default()).await;
    let config = ClientConfig::default().with_base_url(&base);
    let session = Arc::new(HttpSession::from_client(reqwest::Client::new()));

    {
        let mut first = WaqiClient::with_session("demo", Arc::clone(&session), &config);
        first.feed("beijing").await.unwrap();
        first.close();
    }

    let second = WaqiClient::with_session("demo", Arc::clone(&session), &config);
    assert!(second.feed("shanghai").await.is_ok());
}

#[tokio::test]
async fn scoped_usage_closes_on_error() {
    let base = spawn_stub(StubConfig::default()).await;
    let client = client(&base, "invalid_token");

    let result = client
        .scope(|c| Box::pin(async move { c.feed("beijing").await }))
        .await;
    assert!(matches!(result, Err(ApiError::InvalidToken)));
}

// ---------------------------------------------------------------------------
// Transport failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_2xx_is_connection_failure() {
    let router = Router::new().route(
        "/feed/{station}/",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = spawn_router(router).await;

    let err = client(&base, "demo").feed("beijing").await.unwrap_err();
    assert!(matches!(err, ApiError::ConnectionFailed(_)), "got {err:?}");
    assert!(err.source().is_some());
}

#[tokio::test]
async fn non_2xx_error_does_not_leak_token() {
    let router = Router::new().route(
        "/feed/{station}/",
        get(|| async { (StatusCode::NOT_FOUND, "missing") }),
    );
    let base = spawn_router(router).await;

    let err = client(&base, "very-secret-token").feed("x").await.unwrap_err();
    let source = err.source().unwrap().to_string();
    assert!(!source.contains("very-secret-token"), "{source}");
}

#[tokio::test]
async fn refused_connection_is_connection_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}/"), "demo")
        .feed("beijing")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ConnectionFailed(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_server_times_out() {
    let router = Router::new().route(
        "/feed/{station}/",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            r#"{"status":"ok","data":{"aqi":1}}"#
        }),
    );
    let base = spawn_router(router).await;

    let config = ClientConfig::default()
        .with_base_url(&base)
        .with_timeout(Duration::from_millis(200));
    let client = WaqiClient::with_config("demo", config).unwrap();

    let err = client.feed("beijing").await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn undecodable_bodies() {
    let router = Router::new()
        .route("/feed/{station}/", get(|| async { "[1,2,3]" }))
        .route("/search/", get(|| async { "<html>not json</html>" }));
    let base = spawn_router(router).await;
    let client = client(&base, "demo");

    let err = client.feed("beijing").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");

    let err = client.search("bei").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}
