use anyhow::Result;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

use super::types::{CompanyFacts, Submissions, TickerRecord};
use super::{fetch_json, ApiRateLimiter};
use crate::models::Config;

/// SEC EDGAR client for the ticker mapping, company facts and submissions documents.
///
/// SEC fair-access policy requires a descriptive User-Agent with a contact
/// address and caps clients at 10 requests per second; every request goes
/// through the shared rate limiter.
pub struct SecEdgarClient {
    http_client: Client,
    tickers_url: String,
    data_url: String,
    rate_limiter: ApiRateLimiter,
}

impl SecEdgarClient {
    /// Create a new SEC EDGAR client
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(config.sec_user_agent.as_str())
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            tickers_url: config.sec_tickers_url.clone(),
            data_url: config.sec_data_url.trim_end_matches('/').to_string(),
            rate_limiter: ApiRateLimiter::new(config.sec_requests_per_second),
        })
    }

    /// Fetch the ticker mapping, ordered by the file's numeric row keys
    pub async fn fetch_ticker_map(&self) -> Option<Vec<TickerRecord>> {
        let rows: HashMap<String, TickerRecord> =
            fetch_json(&self.http_client, &self.rate_limiter, &self.tickers_url, "SEC ticker map").await?;

        let mut indexed: Vec<(u64, TickerRecord)> = rows
            .into_iter()
            .map(|(key, record)| (key.parse().unwrap_or(u64::MAX), record))
            .collect();
        indexed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.ticker.cmp(&b.1.ticker)));

        info!("📋 Loaded {} ticker mappings from SEC", indexed.len());
        Some(indexed.into_iter().map(|(_, record)| record).collect())
    }

    pub async fn fetch_company_facts(&self, cik: u64) -> Option<CompanyFacts> {
        let url = format!("{}/api/xbrl/companyfacts/CIK{:010}.json", self.data_url, cik);
        fetch_json(&self.http_client, &self.rate_limiter, &url, &format!("company facts CIK{}", cik)).await
    }

    pub async fn fetch_submissions(&self, cik: u64) -> Option<Submissions> {
        let url = format!("{}/submissions/CIK{:010}.json", self.data_url, cik);
        fetch_json(&self.http_client, &self.rate_limiter, &url, &format!("submissions CIK{}", cik)).await
    }
}
