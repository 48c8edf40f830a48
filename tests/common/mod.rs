//! Common test utilities and helpers

/// Mock upstream servers and the config that points at them
pub mod fixtures {
    use lending_screener::models::Config;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const USER_AGENT: &str = "lending-screener-tests (qa@example.com)";

    /// Config pointing every upstream at `server`, with generous rate limits
    pub fn config_for(server: &MockServer) -> Config {
        Config {
            sec_user_agent: USER_AGENT.to_string(),
            sec_tickers_url: format!("{}/files/company_tickers.json", server.uri()),
            sec_data_url: server.uri(),
            market_data_url: format!("{}/v7/finance/quote", server.uri()),
            sec_requests_per_second: 1000,
            market_requests_per_second: 1000,
            concurrency: 2,
            refresh_on_stale: false,
            http_timeout_secs: 5,
            ..Config::default()
        }
    }

    /// SEC mapping rows keyed by row index, deliberately out of key order
    pub fn ticker_map() -> Value {
        json!({
            "2": { "cik_str": 21344, "ticker": "KO", "title": "COCA COLA CO" },
            "0": { "cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc." },
            "1": { "cik_str": 884394, "ticker": "SPY", "title": "SPDR S&P 500 ETF TRUST" },
            "10": { "cik_str": 1234567, "ticker": "NSRGY", "title": "NESTLE S A" }
        })
    }

    fn usd(values: &[(&str, f64)]) -> Value {
        let rows: Vec<Value> = values
            .iter()
            .map(|(end, val)| json!({ "end": end, "val": val, "filed": end, "form": "10-K" }))
            .collect();
        json!({ "units": { "USD": rows } })
    }

    pub fn apple_facts() -> Value {
        json!({
            "cik": 320193,
            "entityName": "Apple Inc.",
            "facts": { "us-gaap": {
                "RevenueFromContractWithCustomerExcludingAssessedTax": usd(&[("2023-09-30", 383e9), ("2024-09-28", 391e9)]),
                "NetCashProvidedByUsedInOperatingActivities": usd(&[("2024-09-28", 118e9)]),
                "LongTermDebtNoncurrent": usd(&[("2024-09-28", 85e9)]),
                "LongTermDebtCurrent": usd(&[("2024-09-28", 10e9)]),
                "AccountsPayableCurrent": usd(&[("2024-09-28", 68e9)]),
                "AccountsReceivableNetCurrent": usd(&[("2024-09-28", 33e9)]),
                "InventoryNet": usd(&[("2024-09-28", 7e9)]),
                "PropertyPlantAndEquipmentNet": usd(&[("2024-09-28", 45e9)])
            } }
        })
    }

    pub fn coke_facts() -> Value {
        json!({
            "entityName": "COCA COLA CO",
            "facts": { "us-gaap": {
                "Revenues": usd(&[("2024-12-31", 47e9)]),
                "NetCashProvidedByUsedInOperatingActivities": usd(&[("2024-12-31", 6.8e9)])
            } }
        })
    }

    pub fn apple_submissions() -> Value {
        json!({
            "cik": "320193",
            "stateOfIncorporation": "CA",
            "addresses": { "business": { "stateOrCountry": "CA" }, "mailing": { "stateOrCountry": "CA" } },
            "filings": { "recent": {
                "form": ["10-Q", "8-K", "S-3ASR", "424B2", "4"],
                "filingDate": ["2025-02-01", "2025-01-30", "2024-12-01", "2024-11-15", "2025-03-01"]
            } }
        })
    }

    pub fn apple_quote() -> Value {
        json!({ "quoteResponse": { "result": [ {
            "symbol": "AAPL",
            "marketCap": 3.4e12,
            "regularMarketPrice": 225.0,
            "averageDailyVolume3Month": 50_000_000.0
        } ], "error": null } })
    }

    /// Mount a full upstream: AAPL complete, KO without submissions or quote,
    /// NSRGY with every document failing
    pub async fn mount_upstream(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/files/company_tickers.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ticker_map()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/xbrl/companyfacts/CIK0000320193.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(apple_facts()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/xbrl/companyfacts/CIK0000021344.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(coke_facts()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/submissions/CIK0000320193.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(apple_submissions()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/quote"))
            .and(query_param("symbols", "AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(apple_quote()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/xbrl/companyfacts/CIK0001234567.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(server)
            .await;
        // Anything else is unknown upstream
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .with_priority(u8::MAX)
            .mount(server)
            .await;
    }
}

/// Logging utilities for tests
pub mod logging {
    use tracing::info;

    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }
}
