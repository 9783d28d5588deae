//! Stub of the WAQI API for tests and local development.
//!
//! Serves `/feed/{station}/` and `/search/` with the same envelopes the real
//! API uses, including its error shapes:
//!
//! - bad token on feed: `{"status":"error","data":"Invalid key"}`
//! - bad token on search: no `status`, message under `rxs.obs[0].msg`
//! - quota exhausted: `{"status":"error","data":"Over quota"}`
//! - unknown `@<id>`: `{"status":"ok","data":{"msg":"Unknown ID"}}`
//! - unknown name: `{"status":"error","data":"Unknown station"}`
//! - no match on search: `{"status":"ok","data":[]}`
//!
//! Every response is HTTP 200, as with the real API.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// Token accepted by `app()`.
pub const DEMO_TOKEN: &str = "demo";

#[derive(Clone, Debug, PartialEq)]
pub struct Station {
    pub idx: u32,
    pub name: String,
    pub aqi: u32,
    pub dominentpol: String,
}

#[derive(Clone, Debug)]
pub struct StubConfig {
    pub token: String,
    /// Requests allowed before every call answers "Over quota". `None` is unlimited.
    pub quota: Option<u32>,
    pub stations: Vec<Station>,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            token: DEMO_TOKEN.to_string(),
            quota: None,
            stations: default_stations(),
        }
    }
}

pub struct Stub {
    token: String,
    stations: Vec<Station>,
    remaining: RwLock<Option<u32>>,
}

pub type Db = Arc<Stub>;

pub fn default_stations() -> Vec<Station> {
    vec![
        station(1451, "Beijing", 57),
        station(1437, "Shanghai", 74),
        station(8190, "Bangalore", 103),
    ]
}

fn station(idx: u32, name: &str, aqi: u32) -> Station {
    Station {
        idx,
        name: name.to_string(),
        aqi,
        dominentpol: "pm25".to_string(),
    }
}

pub fn app() -> Router {
    app_with(StubConfig::default())
}

pub fn app_with(config: StubConfig) -> Router {
    let db: Db = Arc::new(Stub {
        token: config.token,
        stations: config.stations,
        remaining: RwLock::new(config.quota),
    });
    Router::new()
        .route("/feed/{station}/", get(feed))
        .route("/search/", get(search))
        .fallback(invalid_request)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, StubConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: StubConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

fn error(data: &str) -> Json<Value> {
    Json(json!({"status": "error", "data": data}))
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({"status": "ok", "data": data}))
}

fn feed_data(station: &Station) -> Value {
    json!({
        "aqi": station.aqi,
        "idx": station.idx,
        "city": {"name": station.name},
        "dominentpol": station.dominentpol,
    })
}

impl Stub {
    fn token_valid(&self, params: &HashMap<String, String>) -> bool {
        params.get("token") == Some(&self.token)
    }

    /// Take one request from the quota. `false` once it is used up.
    async fn charge(&self) -> bool {
        let mut remaining = self.remaining.write().await;
        match remaining.as_mut() {
            None => true,
            Some(0) => false,
            Some(n) => {
                *n -= 1;
                true
            }
        }
    }

    /// Look up `@<idx>` or a name. A malformed `@` id matches nothing.
    fn find(&self, station: &str) -> Option<&Station> {
        match station.strip_prefix('@') {
            Some(id) => {
                let idx: u32 = id.parse().ok()?;
                self.stations.iter().find(|s| s.idx == idx)
            }
            None => self
                .stations
                .iter()
                .find(|s| s.name.eq_ignore_ascii_case(station)),
        }
    }
}

async fn feed(
    State(db): State<Db>,
    Path(station): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    tracing::debug!(%station, "feed");
    if station.is_empty() {
        return error("Invalid request");
    }
    if !db.token_valid(&params) {
        return error("Invalid key");
    }
    if !db.charge().await {
        return error("Over quota");
    }
    match db.find(&station) {
        Some(found) => ok(feed_data(found)),
        None if station.starts_with('@') => ok(json!({"msg": "Unknown ID"})),
        None => error("Unknown station"),
    }
}

async fn search(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    tracing::debug!(keyword = params.get("keyword").map(String::as_str), "search");
    if !db.token_valid(&params) {
        return Json(json!({
            "rxs": {
                "ver": "1",
                "status": "ok",
                "obs": [{"status": "error", "msg": "Invalid key"}],
            }
        }));
    }
    if !db.charge().await {
        return error("Over quota");
    }
    let keyword = match params.get("keyword") {
        Some(keyword) => keyword.to_lowercase(),
        None => return error("Missing keyword"),
    };
    let matches: Vec<Value> = db
        .stations
        .iter()
        .filter(|s| s.name.to_lowercase().contains(&keyword))
        .map(|s| {
            json!({
                "uid": s.idx,
                "aqi": s.aqi.to_string(),
                "station": {"name": s.name},
            })
        })
        .collect();
    ok(Value::Array(matches))
}

async fn invalid_request() -> Json<Value> {
    error("Invalid request")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(quota: Option<u32>) -> Stub {
        Stub {
            token: DEMO_TOKEN.to_string(),
            stations: default_stations(),
            remaining: RwLock::new(quota),
        }
    }

    #[test]
    fn find_by_name_ignores_case() {
        let db = stub(None);
        assert_eq!(db.find("BEIJING").unwrap().idx, 1451);
        assert!(db.find("atlantis").is_none());
    }

    #[test]
    fn find_by_id() {
        let db = stub(None);
        assert_eq!(db.find("@8190").unwrap().name, "Bangalore");
        assert!(db.find("@1").is_none());
        assert!(db.find("@abc").is_none());
    }

    #[tokio::test]
    async fn quota_runs_out() {
        let db = stub(Some(2));
        assert!(db.charge().await);
        assert!(db.charge().await);
        assert!(!db.charge().await);
    }

    #[test]
    fn token_must_match() {
        let db = stub(None);
        let mut params = HashMap::new();
        assert!(!db.token_valid(&params));
        params.insert("token".to_string(), "wrong".to_string());
        assert!(!db.token_valid(&params));
        params.insert("token".to_string(), DEMO_TOKEN.to_string());
        assert!(db.token_valid(&params));
    }

    #[test]
    fn feed_data_shape() {
        let data = feed_data(&default_stations()[0]);
        assert_eq!(data["idx"], 1451);
        assert_eq!(data["city"]["name"], "Beijing");
    }
}
