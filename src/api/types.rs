//! Upstream JSON documents, decoded only as far as the extractor needs.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Like `#[serde(default)]`, but an explicit `null` also yields the default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unit -> observations, dropping `null` series and `null` rows
fn observations<'de, D>(deserializer: D) -> Result<HashMap<String, Vec<FactValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Option<Vec<Option<FactValue>>>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(unit, rows)| (unit, rows.unwrap_or_default().into_iter().flatten().collect()))
        .collect())
}

/// Parallel filing columns keep their length; a `null` cell becomes empty
fn string_column<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default().into_iter().map(Option::unwrap_or_default).collect())
}

/// Row of the SEC `company_tickers.json` mapping file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TickerRecord {
    pub cik_str: u64,
    pub ticker: String,
    pub title: String,
}

/// `companyfacts` document: taxonomy -> concept -> unit -> observations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyFacts {
    #[serde(default, rename = "entityName")]
    pub entity_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub facts: HashMap<String, HashMap<String, ConceptFacts>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConceptFacts {
    #[serde(default, deserialize_with = "observations")]
    pub units: HashMap<String, Vec<FactValue>>,
}

/// One dated observation. `val` stays raw so unparseable values can be skipped
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FactValue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub end: String,
    #[serde(default)]
    pub val: serde_json::Value,
    #[serde(default)]
    pub filed: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
}

/// `submissions` document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submissions {
    #[serde(default, rename = "stateOfIncorporation")]
    pub state_of_incorporation: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub addresses: Addresses,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filings: Filings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Addresses {
    #[serde(default)]
    pub business: Option<Address>,
    #[serde(default)]
    pub mailing: Option<Address>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Address {
    #[serde(default, rename = "stateOrCountry")]
    pub state_or_country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Filings {
    #[serde(default, deserialize_with = "null_as_default")]
    pub recent: RecentFilings,
}

/// Parallel arrays, index `i` of each describes the same filing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentFilings {
    #[serde(default, deserialize_with = "string_column")]
    pub form: Vec<String>,
    #[serde(default, rename = "filingDate", deserialize_with = "string_column")]
    pub filing_date: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteEnvelope {
    #[serde(default, rename = "quoteResponse", deserialize_with = "null_as_default")]
    pub quote_response: QuoteResponse,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Vec<MarketQuote>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MarketQuote {
    #[serde(default, deserialize_with = "null_as_default")]
    pub symbol: String,
    #[serde(default, rename = "marketCap")]
    pub market_cap: Option<f64>,
    #[serde(default, rename = "regularMarketPrice")]
    pub regular_market_price: Option<f64>,
    #[serde(default, rename = "sharesOutstanding")]
    pub shares_outstanding: Option<f64>,
    #[serde(default, rename = "averageDailyVolume3Month")]
    pub average_daily_volume_3_month: Option<f64>,
    #[serde(default, rename = "averageDailyVolume10Day")]
    pub average_daily_volume_10_day: Option<f64>,
}
