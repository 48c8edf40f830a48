//! HTTP surface of the screening service
//!
//! - help: static usage page
//! - health: liveness plus snapshot status
//! - refresh: on-demand snapshot refresh
//! - search: loan screening over the current snapshot

pub mod health;
pub mod help;
pub mod refresh;
pub mod search;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::refresh_orchestrator::SnapshotOrchestrator;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SnapshotOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<SnapshotOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Build the main application router by merging all route modules
pub fn build_router(orchestrator: Arc<SnapshotOrchestrator>) -> Router {
    let state = AppState::new(orchestrator);

    Router::new()
        .merge(help::routes())
        .merge(health::routes())
        .merge(refresh::routes())
        .merge(search::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
