//! Refresh pipeline and HTTP surface end to end against mocked upstreams

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fixtures::{self, config_for, mount_upstream};
use crate::common::logging::log_test_step;
use lending_screener::api::HttpFactSource;
use lending_screener::models::{Config, Exchange};
use lending_screener::refresh_orchestrator::SnapshotOrchestrator;
use lending_screener::routes::build_router;

fn orchestrator(config: &Config) -> Arc<SnapshotOrchestrator> {
    let source = Arc::new(HttpFactSource::new(config).unwrap());
    SnapshotOrchestrator::new(source, config)
}

async fn call(router: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[test_log::test(tokio::test)]
async fn test_refresh_builds_snapshot_from_upstream() {
    let server = MockServer::start().await;
    mount_upstream(&server).await;
    let orchestrator = orchestrator(&config_for(&server));

    let summary = orchestrator.refresh().await.unwrap();
    let snapshot = orchestrator.snapshot();

    // SPY is a fund and is left out of the universe
    let symbols: Vec<&str> = snapshot.companies.iter().map(|c| c.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL", "KO", "NSRGY"]);
    assert_eq!(summary.count, 3);
    assert_eq!(summary.degraded, 1);
    assert!(snapshot.companies.iter().all(|c| c.as_of == summary.date));

    let apple = &snapshot.companies[0];
    assert_eq!(apple.exchange, Exchange::Nasdaq);
    assert_eq!(apple.revenue, Some(391e9));
    assert_eq!(apple.operating_cash_flow, Some(118e9));
    assert_eq!(apple.total_debt, Some(95e9));
    assert_eq!(apple.accounts_payable, Some(68e9));
    assert_eq!(apple.location.as_deref(), Some("CA"));
    assert_eq!(apple.last_raise_date.map(|d| d.to_string()), Some("2025-01-30".to_string()));
    assert_eq!(apple.market_cap, Some(3.4e12));
    assert_eq!(apple.avg_daily_value, Some(50_000_000.0 * 225.0));
    assert!((apple.borrowing_base - 41.15e9).abs() < 1.0);

    let coke = &snapshot.companies[1];
    assert_eq!(coke.exchange, Exchange::Nyse);
    assert_eq!(coke.total_debt, Some(0.0));
    assert_eq!(coke.location, None);
    assert_eq!(coke.market_cap, None);

    let nestle = &snapshot.companies[2];
    assert_eq!(nestle.exchange, Exchange::Otc);
    assert_eq!(nestle.revenue, None);
    assert_eq!(nestle.total_debt, None);
    assert_eq!(nestle.borrowing_base, 0.0);
}

#[test_log::test(tokio::test)]
async fn test_concurrent_refresh_requests_fetch_once() {
    log_test_step("Two refresh requests while the mapping download is slow");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/company_tickers.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixtures::ticker_map())
                .set_delay(Duration::from_millis(200)),
        )
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_upstream(&server).await;
    let orchestrator = orchestrator(&config_for(&server));
    let router = build_router(Arc::clone(&orchestrator));

    let (first, second) = tokio::join!(call(&router, "POST", "/api/refresh"), call(&router, "POST", "/api/refresh"));

    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);
    assert_eq!(first.1, second.1);
    assert_eq!(first.1["count"], 3);
    assert!(!orchestrator.is_refreshing());
}

#[test_log::test(tokio::test)]
async fn test_unreachable_mapping_uses_seed_universe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let config = Config {
        universe_max: 3,
        ..config_for(&server)
    };
    let orchestrator = orchestrator(&config);

    let summary = orchestrator.refresh().await.unwrap();

    // Seeds are published with identity only
    assert_eq!(summary.count, 3);
    assert_eq!(summary.degraded, 3);
    assert_eq!(orchestrator.snapshot().companies[0].symbol, "AAPL");
}

#[test_log::test(tokio::test)]
async fn test_search_over_refreshed_snapshot() {
    let server = MockServer::start().await;
    mount_upstream(&server).await;
    let orchestrator = orchestrator(&config_for(&server));
    let router = build_router(Arc::clone(&orchestrator));

    let (status, refresh) = call(&router, "POST", "/api/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refresh["ok"], true);

    let (status, health) = call(&router, "GET", "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["count"], 3);
    assert_eq!(health["date"], refresh["date"]);

    // Unknown values: NSRGY lacks revenue so a revenue floor drops it
    let (_, body) = call(&router, "GET", "/api/search?revenue_min=1").await;
    let symbols: Vec<&str> = body["items"].as_array().unwrap().iter().map(|i| i["symbol"].as_str().unwrap()).collect();
    assert_eq!(symbols, vec!["AAPL", "KO"]);

    // A missing market cap passes the ceiling, a known one above it fails
    let (_, body) = call(&router, "GET", "/api/search?market_cap_max=1e12").await;
    let symbols: Vec<&str> = body["items"].as_array().unwrap().iter().map(|i| i["symbol"].as_str().unwrap()).collect();
    assert_eq!(symbols, vec!["KO", "NSRGY"]);

    // KO repays 20B in ~2.9 years, AAPL in ~0.17 years; AAPL ranks first
    let (_, body) = call(&router, "GET", "/api/search?loan_size=$20,000,000,000&max_payback_years=3").await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["items"][0]["symbol"], "AAPL");
    assert_eq!(body["items"][1]["symbol"], "KO");
    assert!(body["items"][1]["paybackYears"].as_f64().unwrap() < 3.0);
    assert_eq!(body["items"][1]["loanCoverage"], 0.0);

    let (_, body) = call(&router, "GET", "/api/search?exchanges=otc").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["items"][0]["symbol"], "NSRGY");

    let (status, body) = call(&router, "GET", "/api/search?cfo_min=ten&max_payback_years=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
}
