//! Outbound adapters for the disclosure and market-data sources.
//!
//! Every call degrades to `None` on transport failure, non-success status or
//! an undecodable body, so one issuer's bad lookup never aborts a refresh.

use anyhow::Result;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use tracing::{debug, warn};

use crate::models::Config;

pub mod market_data_client;
pub mod sec_edgar_client;
pub mod types;

pub use market_data_client::MarketDataClient;
pub use sec_edgar_client::SecEdgarClient;
pub use types::{CompanyFacts, MarketQuote, Submissions, TickerRecord};

/// Request-rate cap for one upstream
pub struct ApiRateLimiter {
    limiter: DefaultDirectRateLimiter,
}

impl ApiRateLimiter {
    pub fn new(requests_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        }
    }

    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

/// Source of raw per-issuer facts consumed by a refresh
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FactSource: Send + Sync {
    /// Ticker-to-CIK rows in source order
    async fn ticker_map(&self) -> Option<Vec<TickerRecord>>;
    async fn company_facts(&self, cik: u64) -> Option<CompanyFacts>;
    async fn submissions(&self, cik: u64) -> Option<Submissions>;
    async fn market_quote(&self, symbol: &str) -> Option<MarketQuote>;
}

/// Production fact source backed by SEC EDGAR and a quote endpoint
pub struct HttpFactSource {
    sec: SecEdgarClient,
    market: MarketDataClient,
}

impl HttpFactSource {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            sec: SecEdgarClient::new(config)?,
            market: MarketDataClient::new(config)?,
        })
    }
}

#[async_trait]
impl FactSource for HttpFactSource {
    async fn ticker_map(&self) -> Option<Vec<TickerRecord>> {
        self.sec.fetch_ticker_map().await
    }

    async fn company_facts(&self, cik: u64) -> Option<CompanyFacts> {
        self.sec.fetch_company_facts(cik).await
    }

    async fn submissions(&self, cik: u64) -> Option<Submissions> {
        self.sec.fetch_submissions(cik).await
    }

    async fn market_quote(&self, symbol: &str) -> Option<MarketQuote> {
        self.market.fetch_quote(symbol).await
    }
}

/// GET a JSON document, mapping every failure to `None`
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    client: &Client,
    rate_limiter: &ApiRateLimiter,
    url: &str,
    label: &str,
) -> Option<T> {
    rate_limiter.wait().await;
    debug!("GET {} ({})", url, label);

    let response = match client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!("⚠️ {} request failed: {}", label, e);
            return None;
        }
    };

    if !response.status().is_success() {
        warn!("⚠️ {} returned {}", label, response.status());
        return None;
    }

    match response.json::<T>().await {
        Ok(body) => Some(body),
        Err(e) => {
            warn!("⚠️ {} body could not be decoded: {}", label, e);
            None
        }
    }
}
