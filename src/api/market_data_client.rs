use anyhow::Result;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;
use url::Url;

use super::types::{MarketQuote, QuoteEnvelope};
use super::{fetch_json, ApiRateLimiter};
use crate::models::Config;

/// Quote lookup against a Yahoo-style `quoteResponse` endpoint
pub struct MarketDataClient {
    http_client: Client,
    quote_url: String,
    rate_limiter: ApiRateLimiter,
}

impl MarketDataClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(config.sec_user_agent.as_str())
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            quote_url: config.market_data_url.clone(),
            rate_limiter: ApiRateLimiter::new(config.market_requests_per_second),
        })
    }

    /// Fetch the quote for one symbol; `None` when the endpoint has no match
    pub async fn fetch_quote(&self, symbol: &str) -> Option<MarketQuote> {
        let url = match Url::parse_with_params(&self.quote_url, &[("symbols", symbol)]) {
            Ok(url) => url,
            Err(e) => {
                warn!("⚠️ Invalid market data URL {}: {}", self.quote_url, e);
                return None;
            }
        };

        let envelope: QuoteEnvelope =
            fetch_json(&self.http_client, &self.rate_limiter, url.as_str(), &format!("quote {}", symbol)).await?;

        envelope
            .quote_response
            .result
            .into_iter()
            .find(|quote| quote.symbol.is_empty() || quote.symbol.eq_ignore_ascii_case(symbol))
    }
}
