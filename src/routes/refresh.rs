//! On-demand refresh trigger

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub ok: bool,
    pub date: Option<NaiveDate>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/refresh", post(refresh_handler))
}

/// POST /api/refresh - runs a refresh, or waits on the one already running
async fn refresh_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("🔄 Refresh requested over HTTP");

    match state.orchestrator.refresh().await {
        Ok(summary) => (
            StatusCode::OK,
            Json(RefreshResponse {
                ok: true,
                date: Some(summary.date),
                count: summary.count,
                error: None,
            }),
        ),
        Err(e) => {
            warn!("⚠️ Requested refresh failed: {}", e);
            // Describe the snapshot that stays published
            let snapshot = state.orchestrator.snapshot();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RefreshResponse {
                    ok: false,
                    date: snapshot.date,
                    count: snapshot.len(),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
