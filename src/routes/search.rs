//! Loan screening search endpoint

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use super::AppState;
use crate::analysis::{screen, ScreenedCompany, SearchParams};
use crate::error::{FieldError, QueryError};

#[derive(Debug, Serialize)]
pub struct SearchResponse<'a> {
    pub date: Option<NaiveDate>,
    pub count: usize,
    pub items: Vec<ScreenedCompany<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub error: &'static str,
    pub details: Vec<FieldError>,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let body = ValidationErrorResponse {
            error: "validation_error",
            details: self.details().to_vec(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/search", get(search_handler))
}

/// GET /api/search
///
/// A stale snapshot starts a background refresh and is still served.
async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, QueryError> {
    let params = SearchParams::from_query(&query)?;

    if state.orchestrator.refresh_if_stale() {
        info!("🕰️ Snapshot is stale, serving it while a refresh runs");
    }

    let snapshot = state.orchestrator.snapshot();
    let items = screen(&snapshot, &params);
    debug!("Search matched {} of {} companies", items.len(), snapshot.len());

    let response = SearchResponse {
        date: snapshot.date,
        count: items.len(),
        items,
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;
    use crate::refresh_orchestrator::SnapshotOrchestrator;
    use crate::routes::test_support::{body_json, mock_source, orchestrator};
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn refreshed_state() -> AppState {
        let orchestrator = orchestrator(mock_source());
        orchestrator.refresh().await.unwrap();
        AppState::new(orchestrator)
    }

    async fn request(state: AppState, uri: &str) -> Response {
        routes()
            .with_state(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_search_without_filters_returns_whole_snapshot() {
        let response = request(refreshed_state().await, "/api/search").await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 2);
        // Revenue breaks the tie when no loan terms are given
        assert_eq!(json["items"][0]["symbol"], "AAPL");
        assert_eq!(json["items"][1]["symbol"], "KO");
        assert!(json["items"][0].get("paybackYears").is_none());
    }

    #[tokio::test]
    async fn test_search_with_loan_terms() {
        let response = request(
            refreshed_state().await,
            "/api/search?loan_size=3%2C000%2C000&max_payback_years=4",
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["items"][0]["symbol"], "AAPL");
        assert_eq!(json["items"][0]["paybackYears"], 0.03);
        assert_eq!(json["items"][0]["loanCoverage"], 0.0);
    }

    #[tokio::test]
    async fn test_malformed_parameters_answer_400() {
        let response = request(refreshed_state().await, "/api/search?revenue_min=lots&exchanges=LSE").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["details"].as_array().unwrap().len(), 2);
        assert_eq!(json["details"][0]["field"], "revenue_min");
    }

    #[tokio::test]
    async fn test_stale_search_serves_old_snapshot_and_refreshes() {
        let config = Config::default();
        let orchestrator = SnapshotOrchestrator::new(Arc::new(mock_source()), &config);
        let state = AppState::new(Arc::clone(&orchestrator));

        let response = request(state, "/api/search").await;

        let json = body_json(response).await;
        assert!(json["date"].is_null());
        assert_eq!(json["count"], 0);

        // The background cycle publishes today's snapshot
        orchestrator.refresh().await.unwrap();
        assert_eq!(orchestrator.snapshot().len(), 2);
        assert_eq!(orchestrator.snapshot().date, Some(orchestrator.clock().today()));
    }
}
