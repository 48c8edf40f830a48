use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Market tier a listing trades on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Nasdaq,
    Nyse,
    Otc,
}

impl Exchange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Nasdaq => "NASDAQ",
            Exchange::Nyse => "NYSE",
            Exchange::Otc => "OTC",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NASDAQ" => Ok(Exchange::Nasdaq),
            "NYSE" => Ok(Exchange::Nyse),
            "OTC" => Ok(Exchange::Otc),
            other => Err(format!("unknown exchange '{}'", other)),
        }
    }
}

/// One candidate issuer considered during a refresh cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UniverseEntry {
    pub symbol: String,
    pub cik: u64,
    pub name: String,
    pub exchange: Exchange,
}

/// Company fundamentals as published in a snapshot.
///
/// Every financial field is optional: `None` means the upstream had no usable
/// value, which is distinct from a reported zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub symbol: String,
    pub cik: u64,
    pub name: String,
    pub exchange: Exchange,
    pub location: Option<String>,
    pub revenue: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub total_debt: Option<f64>,
    pub accounts_payable: Option<f64>,
    pub accounts_receivable: Option<f64>,
    pub inventory: Option<f64>,
    pub fixed_assets: Option<f64>,
    pub market_cap: Option<f64>,
    pub avg_daily_value: Option<f64>,
    pub last_raise_date: Option<NaiveDate>,
    pub borrowing_base: f64,
    pub as_of: NaiveDate,
}

impl Company {
    /// A record carrying identity only, used when every lookup for the entry failed
    pub fn bare(entry: &UniverseEntry, as_of: NaiveDate) -> Self {
        Self {
            symbol: entry.symbol.clone(),
            cik: entry.cik,
            name: entry.name.clone(),
            exchange: entry.exchange,
            location: None,
            revenue: None,
            operating_cash_flow: None,
            total_debt: None,
            accounts_payable: None,
            accounts_receivable: None,
            inventory: None,
            fixed_assets: None,
            market_cap: None,
            avg_daily_value: None,
            last_raise_date: None,
            borrowing_base: 0.0,
            as_of,
        }
    }
}

/// Immutable, dated result of one refresh cycle
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub date: Option<NaiveDate>,
    pub companies: Vec<Company>,
}

impl Snapshot {
    /// Placeholder published before the first refresh completes
    pub fn empty() -> Self {
        Self {
            date: None,
            companies: Vec::new(),
        }
    }

    /// Build a snapshot, stamping every company with the snapshot date
    pub fn new(date: NaiveDate, mut companies: Vec<Company>) -> Self {
        for company in &mut companies {
            company.as_of = date;
        }
        Self {
            date: Some(date),
            companies,
        }
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    /// Stale means not dated today in the business timezone
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        self.date != Some(today)
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub business_timezone: Tz,
    pub sec_user_agent: String,
    pub universe_max: usize,
    pub concurrency: usize,
    pub sec_requests_per_second: u32,
    pub market_requests_per_second: u32,
    pub request_delay_ms: u64,
    pub refresh_hour: u32,
    pub refresh_minute: u32,
    pub refresh_on_stale: bool,
    pub sec_tickers_url: String,
    pub sec_data_url: String,
    pub market_data_url: String,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            business_timezone: chrono_tz::America::New_York,
            sec_user_agent: "lending-screener/0.1 (contact@example.com)".to_string(),
            universe_max: 500,
            concurrency: 4,
            sec_requests_per_second: 8,
            market_requests_per_second: 5,
            request_delay_ms: 0,
            refresh_hour: 6,
            refresh_minute: 0,
            refresh_on_stale: true,
            sec_tickers_url: "https://www.sec.gov/files/company_tickers.json".to_string(),
            sec_data_url: "https://data.sec.gov".to_string(),
            market_data_url: "https://query1.finance.yahoo.com/v7/finance/quote".to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let defaults = Config::default();
        let business_timezone = match std::env::var("BUSINESS_TIMEZONE") {
            Ok(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("BUSINESS_TIMEZONE '{}' is not a valid zone: {}", name, e))?,
            Err(_) => defaults.business_timezone,
        };

        let config = Config {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            business_timezone,
            sec_user_agent: std::env::var("SEC_USER_AGENT")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.sec_user_agent),
            universe_max: env_or("UNIVERSE_MAX", defaults.universe_max),
            concurrency: env_or("CONCURRENCY", defaults.concurrency).max(1),
            sec_requests_per_second: env_or("SEC_REQUESTS_PER_SECOND", defaults.sec_requests_per_second).max(1),
            market_requests_per_second: env_or("MARKET_REQUESTS_PER_SECOND", defaults.market_requests_per_second)
                .max(1),
            request_delay_ms: env_or("REQUEST_DELAY_MS", defaults.request_delay_ms),
            refresh_hour: env_or("REFRESH_HOUR", defaults.refresh_hour).min(23),
            refresh_minute: env_or("REFRESH_MINUTE", defaults.refresh_minute).min(59),
            refresh_on_stale: env_or("REFRESH_ON_STALE", defaults.refresh_on_stale),
            sec_tickers_url: std::env::var("SEC_TICKERS_URL").unwrap_or(defaults.sec_tickers_url),
            sec_data_url: std::env::var("SEC_DATA_URL").unwrap_or(defaults.sec_data_url),
            market_data_url: std::env::var("MARKET_DATA_URL").unwrap_or(defaults.market_data_url),
            http_timeout_secs: env_or("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
        };

        Ok(config)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("⚠️ Ignoring malformed {}='{}', using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}
