pub mod analysis;
pub mod api;
pub mod concurrent_fetcher;
pub mod error;
pub mod extractor;
pub mod models;
pub mod refresh_orchestrator;
pub mod routes;
pub mod server;
pub mod universe;
pub mod utils;

/// Initialize the global tracing subscriber; `RUST_LOG` overrides `default_filter`
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
