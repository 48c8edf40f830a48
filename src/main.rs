use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use lending_screener::api::HttpFactSource;
use lending_screener::models::Config;
use lending_screener::refresh_orchestrator::{spawn_daily_scheduler, SnapshotOrchestrator};
use lending_screener::server::Server;

/// Loan screening service over a daily SEC EDGAR snapshot
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve an empty snapshot until the first scheduled or requested refresh
    #[arg(long)]
    skip_initial_refresh: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    lending_screener::init_tracing("lending_screener=info,tower_http=info");

    info!("🚀 Starting lending screener");

    let mut config = Config::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    info!(
        "📋 Configuration: timezone {}, universe {}, {} workers, daily refresh {:02}:{:02}",
        config.business_timezone, config.universe_max, config.concurrency, config.refresh_hour, config.refresh_minute
    );

    let source = Arc::new(HttpFactSource::new(&config)?);
    let orchestrator = SnapshotOrchestrator::new(source, &config);

    if args.skip_initial_refresh {
        info!("⏭️ Skipping initial refresh");
    } else {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            if let Err(e) = orchestrator.refresh().await {
                error!("❌ Initial refresh failed: {}", e);
            }
        });
    }

    spawn_daily_scheduler(Arc::clone(&orchestrator));

    Server::new(config.host.clone(), config.port, orchestrator).run().await
}
