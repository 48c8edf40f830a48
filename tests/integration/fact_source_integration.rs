//! HttpFactSource against mocked SEC and market-data servers

use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fixtures::{self, config_for, mount_upstream, USER_AGENT};
use crate::common::logging::log_test_step;
use lending_screener::api::{FactSource, HttpFactSource};

#[test_log::test(tokio::test)]
async fn test_ticker_map_keeps_source_order() {
    let server = MockServer::start().await;
    mount_upstream(&server).await;
    let source = HttpFactSource::new(&config_for(&server)).unwrap();

    let records = source.ticker_map().await.unwrap();
    let tickers: Vec<&str> = records.iter().map(|r| r.ticker.as_str()).collect();

    assert_eq!(tickers, vec!["AAPL", "SPY", "KO", "NSRGY"]);
    assert_eq!(records[0].cik_str, 320193);
}

#[test_log::test(tokio::test)]
async fn test_sec_requests_carry_contact_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/xbrl/companyfacts/CIK0000320193.json"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::apple_facts()))
        .expect(1)
        .mount(&server)
        .await;
    let source = HttpFactSource::new(&config_for(&server)).unwrap();

    let facts = source.company_facts(320193).await;

    assert!(facts.is_some());
    assert_eq!(facts.unwrap().entity_name.as_deref(), Some("Apple Inc."));
}

#[test_log::test(tokio::test)]
async fn test_failures_degrade_to_none() {
    log_test_step("Server errors, missing documents and garbage bodies");
    let server = MockServer::start().await;
    mount_upstream(&server).await;
    Mock::given(method("GET"))
        .and(path("/submissions/CIK0000000042.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;
    let source = HttpFactSource::new(&config_for(&server)).unwrap();

    assert!(source.company_facts(1234567).await.is_none());
    assert!(source.submissions(21344).await.is_none());
    assert!(source.submissions(42).await.is_none());
    assert!(source.market_quote("KO").await.is_none());
}

#[test_log::test(tokio::test)]
async fn test_unreachable_upstream_degrades_to_none() {
    let server = MockServer::start().await;
    let config = config_for(&server);
    drop(server);

    let source = HttpFactSource::new(&config).unwrap();
    assert!(source.ticker_map().await.is_none());
}

#[test_log::test(tokio::test)]
async fn test_market_quote_is_parsed() {
    let server = MockServer::start().await;
    mount_upstream(&server).await;
    let source = HttpFactSource::new(&config_for(&server)).unwrap();

    let quote = source.market_quote("AAPL").await.unwrap();

    assert_eq!(quote.symbol, "AAPL");
    assert_eq!(quote.market_cap, Some(3.4e12));
    assert_eq!(quote.regular_market_price, Some(225.0));
    assert_eq!(quote.average_daily_volume_3_month, Some(50_000_000.0));
}
