//! Run one snapshot refresh and print it as JSON

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use lending_screener::api::HttpFactSource;
use lending_screener::models::{Company, Config};
use lending_screener::refresh_orchestrator::SnapshotOrchestrator;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cap the universe at this many companies (overrides UNIVERSE_MAX)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct SnapshotDump<'a> {
    date: Option<chrono::NaiveDate>,
    count: usize,
    items: &'a [Company],
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lending_screener=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::from_env()?;
    if let Some(limit) = args.limit {
        config.universe_max = limit;
    }

    let source = Arc::new(HttpFactSource::new(&config)?);
    let orchestrator = SnapshotOrchestrator::new(source, &config);

    let summary = orchestrator.refresh().await.context("refresh failed")?;
    info!(
        "✅ {} companies for {} ({} without facts) in {} ms",
        summary.count, summary.date, summary.degraded, summary.duration_ms
    );

    let snapshot = orchestrator.snapshot();
    let dump = SnapshotDump {
        date: snapshot.date,
        count: snapshot.len(),
        items: &snapshot.companies,
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&dump)?
    } else {
        serde_json::to_string(&dump)?
    };
    println!("{}", json);

    Ok(())
}
