//! Health endpoint reporting the published snapshot

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    /// `None` until the first refresh publishes
    pub date: Option<NaiveDate>,
    pub count: usize,
    /// Whether a refresh cycle is currently in flight
    pub refreshing: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health_handler))
}

/// GET /api/health
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.orchestrator.snapshot();

    let response = HealthResponse {
        ok: true,
        date: snapshot.date,
        count: snapshot.len(),
        refreshing: state.orchestrator.is_refreshing(),
    };

    (StatusCode::OK, Json(response))
}
