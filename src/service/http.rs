//! History HTTP routes.
//!
//! - `GET /telemetry/{ids}?start=&end=`: JSON array of samples
//! - `GET /health`: liveness plus store and hub counters
//!
//! Every response carries `Access-Control-Allow-Origin: *`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use log::debug;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use super::request::HistoryRequest;
use crate::relay::Relay;
use crate::types::Sample;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub channels: usize,
    pub samples: usize,
    pub subscribers: usize,
}

/// Build the history router over a shared relay.
pub fn build_history_router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/telemetry/{ids}", get(query_history))
        .route("/health", get(health))
        .layer(open_cors())
        .with_state(relay)
}

fn open_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn query_history(
    State(relay): State<Arc<Relay>>,
    Path(ids): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Sample>> {
    let request = HistoryRequest::parse(
        &ids,
        params.get("start").map(String::as_str),
        params.get("end").map(String::as_str),
    );
    let samples = request.execute(relay.history());
    debug!(
        "History query ids={} range=({}, {}) -> {} samples",
        ids,
        request.range.start,
        request.range.end,
        samples.len()
    );
    Json(samples)
}

async fn health(State(relay): State<Arc<Relay>>) -> Json<HealthResponse> {
    let stats = relay.stats();
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: relay.uptime_secs(),
        channels: stats.history.channels,
        samples: stats.history.samples,
        subscribers: stats.hub.subscribers,
    })
}
