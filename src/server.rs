//! HTTP read API over the snapshot cache.
//!
//! Every data route goes through [`SnapshotCache::get_snapshot`], so the
//! first request after the snapshot turns stale triggers (or joins) a
//! refresh.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Plain-text route listing |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/athletes` | Summary of every ranked athlete |
//! | `GET`  | `/athletes/{athleteId}` | Full profile of one athlete |
//! | `GET`  | `/divisions` | Every division with profile fields joined in |
//! | `GET`  | `/divisions/{divisionId}` | One merged division |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "fighter not found: jon-jonez" } }
//! ```
//!
//! Error codes: `not_found` (404), `ingest_failed` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use rankings_core::models::Snapshot;
use rankings_core::timestamp::format_http_date;
use rankings_core::view::{athlete_summaries, merge_division, merged_divisions};

use crate::cache::SnapshotCache;
use crate::config::Config;
use crate::error::IngestError;
use crate::extract::normalize_division_key;

const ROUTES: &str = "\
ufc-rankings read API

GET /health
GET /athletes
GET /athletes/{athleteId}
GET /divisions
GET /divisions/{divisionId}
";

/// Starts the read API on `[server].bind` and serves until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let cache = SnapshotCache::from_config(config).await?;
    let listener = TcpListener::bind(&config.server.bind).await?;
    info!(addr = %listener.local_addr()?, "read API listening");
    serve(listener, cache).await
}

/// Serve the read API on an already-bound listener.
pub async fn serve(listener: TcpListener, cache: SnapshotCache) -> anyhow::Result<()> {
    axum::serve(listener, router(cache))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("read API stopped");
    Ok(())
}

pub fn router(cache: SnapshotCache) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/athletes", get(handle_athletes))
        .route("/athletes/{athlete_id}", get(handle_athlete))
        .route("/divisions", get(handle_divisions))
        .route("/divisions/{division_id}", get(handle_division))
        .layer(cors)
        .with_state(cache)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

// ============ Response bodies ============
//
// Shared with the CLI query commands so both surfaces print the same JSON.

pub fn athletes_body(snapshot: &Snapshot) -> Value {
    json!({
        "athletes": athlete_summaries(snapshot),
        "lastUpdated": format_http_date(&snapshot.last_updated),
    })
}

/// `{ <athleteId>: Profile }`, or `None` if the athlete is not ranked.
pub fn athlete_body(snapshot: &Snapshot, athlete_id: &str) -> Option<Value> {
    let profile = snapshot.athletes.get(athlete_id)?;
    let mut body = Map::new();
    body.insert(athlete_id.to_string(), json!(profile));
    Some(Value::Object(body))
}

pub fn divisions_body(snapshot: &Snapshot) -> Value {
    let merged = merged_divisions(snapshot);
    let order: Vec<&str> = merged.iter().map(|(key, _)| key.as_str()).collect();
    let mut divisions = Map::new();
    for (key, division) in &merged {
        divisions.insert(key.clone(), json!(division));
    }
    json!({
        "divisions": divisions,
        "divisionOrder": order,
        "lastUpdated": format_http_date(&snapshot.last_updated),
    })
}

/// `{ <divisionKey>: merged division }`. Accepts the key or a title that
/// normalizes to it ("Light Heavyweight" finds `light-heavyweight`).
pub fn division_body(snapshot: &Snapshot, division_id: &str) -> Option<Value> {
    let (key, division) = snapshot
        .divisions
        .get_key_value(division_id)
        .or_else(|| snapshot.divisions.get_key_value(&normalize_division_key(division_id)))?;
    let mut body = Map::new();
    body.insert(key.clone(), json!(merge_division(snapshot, division)));
    Some(Value::Object(body))
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        error!(error = %e, "no snapshot available");
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "ingest_failed".to_string(),
            message: e.to_string(),
        }
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

// ============ Handlers ============

async fn handle_index() -> &'static str {
    ROUTES
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_athletes(State(cache): State<SnapshotCache>) -> Result<Json<Value>, AppError> {
    let snapshot = cache.get_snapshot().await?;
    Ok(Json(athletes_body(&snapshot)))
}

async fn handle_athlete(
    State(cache): State<SnapshotCache>,
    Path(athlete_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let snapshot = cache.get_snapshot().await?;
    athlete_body(&snapshot, &athlete_id)
        .map(Json)
        .ok_or_else(|| not_found(format!("fighter not found: {}", athlete_id)))
}

async fn handle_divisions(State(cache): State<SnapshotCache>) -> Result<Json<Value>, AppError> {
    let snapshot = cache.get_snapshot().await?;
    Ok(Json(divisions_body(&snapshot)))
}

async fn handle_division(
    State(cache): State<SnapshotCache>,
    Path(division_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let snapshot = cache.get_snapshot().await?;
    division_body(&snapshot, &division_id)
        .map(Json)
        .ok_or_else(|| not_found(format!("division not found: {}", division_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rankings_core::models::{CompetitorRef, Division, Profile};
    use std::collections::BTreeMap;

    fn competitor(id: &str, name: &str) -> CompetitorRef {
        CompetitorRef {
            athlete_id: id.into(),
            name: name.into(),
            image: None,
        }
    }

    fn profile(id: &str, name: &str, country: &str) -> Profile {
        Profile {
            athlete_id: id.into(),
            name: name.into(),
            country: country.into(),
            wins: 20,
            losses: 1,
            ..Profile::default()
        }
    }

    fn snapshot() -> Snapshot {
        let mut divisions = BTreeMap::new();
        divisions.insert(
            "welterweight".to_string(),
            Division {
                title: "welterweight".into(),
                champion: competitor("belal-muhammad", "Belal Muhammad"),
                contenders: vec![competitor("leon-edwards", "Leon Edwards")],
            },
        );
        divisions.insert(
            "light-heavyweight".to_string(),
            Division {
                title: "light-heavyweight".into(),
                champion: competitor("alex-pereira", "Alex Pereira"),
                contenders: vec![],
            },
        );
        let mut athletes = BTreeMap::new();
        for p in [
            profile("belal-muhammad", "Belal Muhammad", "United States"),
            profile("leon-edwards", "Leon Edwards", "Jamaica"),
            profile("alex-pereira", "Alex Pereira", "Brazil"),
        ] {
            athletes.insert(p.athlete_id.clone(), p);
        }
        Snapshot {
            divisions,
            division_order: vec!["welterweight".into(), "light-heavyweight".into()],
            athletes,
            last_updated: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_athletes_body_lists_every_profile() {
        let body = athletes_body(&snapshot());
        let athletes = body["athletes"].as_array().unwrap();
        assert_eq!(athletes.len(), 3);
        assert!(athletes.iter().any(|a| a["athleteId"] == "leon-edwards"));
        assert_eq!(body["lastUpdated"], "Fri, 01 Mar 2024 10:00:00 GMT");
    }

    #[test]
    fn test_athlete_body_is_keyed_by_id() {
        let body = athlete_body(&snapshot(), "alex-pereira").unwrap();
        assert_eq!(body["alex-pereira"]["country"], "Brazil");
        assert!(athlete_body(&snapshot(), "jon-jones").is_none());
    }

    #[test]
    fn test_divisions_body_joins_profiles_and_keeps_order() {
        let body = divisions_body(&snapshot());
        assert_eq!(
            body["divisionOrder"],
            json!(["welterweight", "light-heavyweight"])
        );
        let contender = &body["divisions"]["welterweight"]["contenders"][0];
        assert_eq!(contender["country"], "Jamaica");
        assert_eq!(contender["record"], "20-1-0");
    }

    #[test]
    fn test_division_body_accepts_title() {
        let snap = snapshot();
        assert!(division_body(&snap, "light-heavyweight").is_some());
        let body = division_body(&snap, "Light Heavyweight").unwrap();
        assert_eq!(
            body["light-heavyweight"]["champion"]["athleteId"],
            "alex-pereira"
        );
        assert!(division_body(&snap, "flyweight").is_none());
    }

    #[test]
    fn test_ingest_failure_maps_to_500() {
        let err = AppError::from(IngestError::Aborted("boom".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "ingest_failed");
    }
}
