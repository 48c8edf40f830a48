//! Universe construction: which issuers a refresh cycle covers.
//!
//! The universe is rebuilt from the SEC ticker mapping on every cycle. The last
//! successful build is remembered and reused when the mapping is unreachable;
//! before any successful build the hardcoded seed set stands in.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

use crate::api::{FactSource, TickerRecord};
use crate::models::{Exchange, UniverseEntry};

/// Funds, trusts and exchange-traded products are not operating companies
static NON_OPERATING_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(ETF|ETN|ETP|FUNDS?|TRUSTS?|INCOME|DIVIDENDS?)\b").expect("valid name pattern")
});

const SEED_UNIVERSE: &[(&str, u64, &str)] = &[
    ("AAPL", 320193, "Apple Inc."),
    ("MSFT", 789019, "MICROSOFT CORP"),
    ("AMZN", 1018724, "AMAZON COM INC"),
    ("NVDA", 1045810, "NVIDIA CORP"),
    ("GOOGL", 1652044, "Alphabet Inc."),
    ("META", 1326801, "Meta Platforms, Inc."),
    ("JNJ", 200406, "JOHNSON & JOHNSON"),
    ("WMT", 104169, "Walmart Inc."),
];

pub fn is_non_operating(name: &str) -> bool {
    NON_OPERATING_NAME.is_match(name)
}

/// Venue tier guessed from the ticker's shape
pub fn classify_exchange(ticker: &str) -> Exchange {
    let ticker = ticker.trim();
    let len = ticker.chars().count();

    if len >= 5 && (ticker.ends_with('F') || ticker.ends_with('Y')) {
        Exchange::Otc
    } else if ticker.contains('-') || ticker.contains('.') {
        Exchange::Nyse
    } else if (1..=3).contains(&len) {
        Exchange::Nyse
    } else {
        Exchange::Nasdaq
    }
}

/// Filter, deduplicate (first row per CIK and per ticker wins), classify and cap
pub fn build_from_records(records: Vec<TickerRecord>, max_entries: usize) -> Vec<UniverseEntry> {
    let mut seen_ciks = HashSet::new();
    let mut seen_tickers = HashSet::new();
    let mut entries = Vec::new();

    for record in records {
        if entries.len() >= max_entries {
            break;
        }

        let symbol = record.ticker.trim().to_ascii_uppercase();
        let name = record.title.trim().to_string();
        if symbol.is_empty() || is_non_operating(&name) {
            continue;
        }
        if !seen_ciks.insert(record.cik_str) || !seen_tickers.insert(symbol.clone()) {
            continue;
        }

        entries.push(UniverseEntry {
            exchange: classify_exchange(&symbol),
            symbol,
            cik: record.cik_str,
            name,
        });
    }

    entries
}

/// Small hardcoded universe that keeps the service queryable without SEC access
pub fn seed_universe() -> Vec<UniverseEntry> {
    SEED_UNIVERSE
        .iter()
        .map(|(symbol, cik, name)| UniverseEntry {
            symbol: symbol.to_string(),
            cik: *cik,
            name: name.to_string(),
            exchange: classify_exchange(symbol),
        })
        .collect()
}

pub struct UniverseBuilder {
    max_entries: usize,
    last_good: Mutex<Option<Vec<UniverseEntry>>>,
}

impl UniverseBuilder {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            last_good: Mutex::new(None),
        }
    }

    pub async fn build<S: FactSource + ?Sized>(&self, source: &S) -> Vec<UniverseEntry> {
        let Some(records) = source.ticker_map().await else {
            warn!("⚠️ Ticker mapping unavailable, falling back");
            return self.fallback();
        };

        let entries = build_from_records(records, self.max_entries);
        if entries.is_empty() {
            warn!("⚠️ Ticker mapping produced no operating companies, falling back");
            return self.fallback();
        }

        info!("🌐 Universe built with {} companies", entries.len());
        *self.last_good.lock().unwrap_or_else(PoisonError::into_inner) = Some(entries.clone());
        entries
    }

    fn fallback(&self) -> Vec<UniverseEntry> {
        if let Some(previous) = self.last_good.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            info!("🔁 Reusing previous universe of {} companies", previous.len());
            return previous.clone();
        }

        let mut seeds = seed_universe();
        seeds.truncate(self.max_entries);
        info!("🌱 Using seed universe of {} companies", seeds.len());
        seeds
    }
}
