//! Server startup and binding

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::refresh_orchestrator::SnapshotOrchestrator;
use crate::routes;

pub struct Server {
    host: String,
    port: u16,
    router: Router,
}

impl Server {
    pub fn new(host: impl Into<String>, port: u16, orchestrator: Arc<SnapshotOrchestrator>) -> Self {
        Self {
            host: host.into(),
            port,
            router: routes::build_router(orchestrator),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub async fn run(self) -> Result<()> {
        let addr = self.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        self.run_with_listener(listener).await
    }

    /// Serve on an already bound listener (port 0 in tests)
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<()> {
        info!("🌐 Listening on http://{}", listener.local_addr()?);
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
