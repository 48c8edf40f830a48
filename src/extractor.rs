//! Metric extraction from raw disclosure facts.
//!
//! Concepts are tried in a fixed priority order and the first one with a usable
//! observation wins. Within a concept the most recent `end` date wins; dates are
//! fixed-width ISO strings, so plain string comparison orders them.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::api::types::{CompanyFacts, FactValue, MarketQuote, Submissions};
use crate::models::{Company, UniverseEntry};

/// Taxonomies searched for a concept, in order
const TAXONOMIES: [&str; 2] = ["us-gaap", "ifrs-full"];
const UNIT: &str = "USD";

pub const REVENUE_CONCEPTS: &[&str] = &[
    "Revenues",
    "RevenueFromContractWithCustomerExcludingAssessedTax",
    "SalesRevenueNet",
];

pub const OPERATING_CASH_FLOW_CONCEPTS: &[&str] = &[
    "NetCashProvidedByUsedInOperatingActivities",
    "NetCashProvidedByUsedInOperatingActivitiesContinuingOperations",
];

pub const LONG_TERM_DEBT_CONCEPTS: &[&str] = &[
    "LongTermDebtNoncurrent",
    "LongTermDebt",
    "LongTermDebtAndCapitalLeaseObligations",
];

pub const SHORT_TERM_DEBT_CONCEPTS: &[&str] = &["LongTermDebtCurrent", "DebtCurrent", "ShortTermBorrowings"];

pub const PAYABLES_CONCEPTS: &[&str] = &[
    "AccountsPayableCurrent",
    "AccountsPayableTradeCurrent",
    "AccountsPayableAndAccruedLiabilitiesCurrent",
];

pub const RECEIVABLES_CONCEPTS: &[&str] = &[
    "AccountsReceivableNetCurrent",
    "ReceivablesNetCurrent",
    "AccountsReceivableNet",
];

pub const INVENTORY_CONCEPTS: &[&str] = &["InventoryNet", "InventoryGross"];

pub const FIXED_ASSET_CONCEPTS: &[&str] = &[
    "PropertyPlantAndEquipmentNet",
    "PropertyPlantAndEquipmentAndFinanceLeaseRightOfUseAssetAfterAccumulatedDepreciationAndAmortization",
];

/// Advance rates applied to collateral classes
pub const RECEIVABLES_ADVANCE_RATE: f64 = 0.80;
pub const INVENTORY_ADVANCE_RATE: f64 = 0.50;
pub const FIXED_ASSET_ADVANCE_RATE: f64 = 0.25;

/// Offering prospectuses, current reports, registration statements and Form D notices
static CAPITAL_RAISE_FORMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(S-1|S-3|F-1|F-3|424B[1-8]?|8-K|D)(/A)?$").expect("valid form pattern"));

/// Balance sheet and cash flow figures pulled from one facts document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialMetrics {
    pub revenue: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub total_debt: Option<f64>,
    pub accounts_payable: Option<f64>,
    pub accounts_receivable: Option<f64>,
    pub inventory: Option<f64>,
    pub fixed_assets: Option<f64>,
}

/// Numeric value of an observation. Strings are parsed, anything non-finite is absent.
pub fn parse_fact_value(val: &Value) -> Option<f64> {
    let parsed = match val {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Value of the most recently dated usable observation.
///
/// Equal `end` dates prefer the later `filed` date so restatements win.
pub fn pick_most_recent(values: &[FactValue]) -> Option<f64> {
    let mut best: Option<(&FactValue, f64)> = None;

    for fact in values {
        if fact.end.is_empty() {
            continue;
        }
        let Some(val) = parse_fact_value(&fact.val) else {
            continue;
        };

        let newer = match best {
            None => true,
            Some((current, _)) => {
                let by_end = fact.end.as_str().cmp(current.end.as_str());
                by_end.is_gt()
                    || (by_end.is_eq() && fact.filed.as_deref().unwrap_or("") >= current.filed.as_deref().unwrap_or(""))
            }
        };
        if newer {
            best = Some((fact, val));
        }
    }

    best.map(|(_, val)| val)
}

/// Most recent value of the first concept in `concepts` that has data
pub fn latest_value(facts: &CompanyFacts, concepts: &[&str]) -> Option<f64> {
    concepts.iter().find_map(|concept| {
        TAXONOMIES.iter().find_map(|taxonomy| {
            let values = facts.facts.get(*taxonomy)?.get(*concept)?.units.get(UNIT)?;
            pick_most_recent(values)
        })
    })
}

/// Long-term plus short-term debt, each component defaulting to zero
pub fn total_debt(facts: &CompanyFacts) -> f64 {
    let long_term = latest_value(facts, LONG_TERM_DEBT_CONCEPTS).unwrap_or(0.0);
    let short_term = latest_value(facts, SHORT_TERM_DEBT_CONCEPTS).unwrap_or(0.0);
    long_term + short_term
}

/// Collateral-derived lending limit; missing components count as zero
pub fn borrowing_base(receivables: Option<f64>, inventory: Option<f64>, fixed_assets: Option<f64>) -> f64 {
    RECEIVABLES_ADVANCE_RATE * receivables.unwrap_or(0.0)
        + INVENTORY_ADVANCE_RATE * inventory.unwrap_or(0.0)
        + FIXED_ASSET_ADVANCE_RATE * fixed_assets.unwrap_or(0.0)
}

pub fn extract_metrics(facts: &CompanyFacts) -> FinancialMetrics {
    FinancialMetrics {
        revenue: latest_value(facts, REVENUE_CONCEPTS),
        operating_cash_flow: latest_value(facts, OPERATING_CASH_FLOW_CONCEPTS),
        total_debt: Some(total_debt(facts)),
        accounts_payable: latest_value(facts, PAYABLES_CONCEPTS),
        accounts_receivable: latest_value(facts, RECEIVABLES_CONCEPTS),
        inventory: latest_value(facts, INVENTORY_CONCEPTS),
        fixed_assets: latest_value(facts, FIXED_ASSET_CONCEPTS),
    }
}

/// Jurisdiction of incorporation, else business address, else mailing address
pub fn location(submissions: &Submissions) -> Option<String> {
    let addresses = &submissions.addresses;
    [
        submissions.state_of_incorporation.as_deref(),
        addresses.business.as_ref().and_then(|a| a.state_or_country.as_deref()),
        addresses.mailing.as_ref().and_then(|a| a.state_or_country.as_deref()),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|tag| !tag.is_empty())
    .map(str::to_string)
}

pub fn is_capital_raise_form(form: &str) -> bool {
    CAPITAL_RAISE_FORMS.is_match(form.trim())
}

/// Latest filing date among capital-raise forms in the recent filings list
pub fn last_raise_date(submissions: &Submissions) -> Option<NaiveDate> {
    let recent = &submissions.filings.recent;
    recent
        .form
        .iter()
        .zip(recent.filing_date.iter())
        .filter(|(form, _)| is_capital_raise_form(form))
        .filter_map(|(_, date)| NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok())
        .max()
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Quoted market cap, else price times shares outstanding
pub fn market_cap(quote: &MarketQuote) -> Option<f64> {
    positive(quote.market_cap).or_else(|| {
        let price = positive(quote.regular_market_price)?;
        let shares = positive(quote.shares_outstanding)?;
        Some(price * shares)
    })
}

/// Approximate dollar value traded per day
pub fn avg_daily_value(quote: &MarketQuote) -> Option<f64> {
    let price = positive(quote.regular_market_price)?;
    let volume = positive(quote.average_daily_volume_3_month).or(positive(quote.average_daily_volume_10_day))?;
    Some(price * volume)
}

/// Assemble one company record from whatever lookups succeeded
pub fn build_company(
    entry: &UniverseEntry,
    facts: Option<&CompanyFacts>,
    submissions: Option<&Submissions>,
    quote: Option<&MarketQuote>,
    as_of: NaiveDate,
) -> Company {
    let mut company = Company::bare(entry, as_of);

    if let Some(facts) = facts {
        let metrics = extract_metrics(facts);
        company.revenue = metrics.revenue;
        company.operating_cash_flow = metrics.operating_cash_flow;
        company.total_debt = metrics.total_debt;
        company.accounts_payable = metrics.accounts_payable;
        company.accounts_receivable = metrics.accounts_receivable;
        company.inventory = metrics.inventory;
        company.fixed_assets = metrics.fixed_assets;
    }

    if let Some(submissions) = submissions {
        company.location = location(submissions);
        company.last_raise_date = last_raise_date(submissions);
    }

    if let Some(quote) = quote {
        company.market_cap = market_cap(quote);
        company.avg_daily_value = avg_daily_value(quote);
    }

    company.borrowing_base = borrowing_base(company.accounts_receivable, company.inventory, company.fixed_assets);
    company
}
