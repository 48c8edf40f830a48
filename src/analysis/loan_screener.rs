// Loan screening over a published snapshot
// Filters and derived loan metrics are computed per request; the shared snapshot is never modified

use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

use super::search_params::SearchParams;
use crate::models::{Company, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Revenue,
    OperatingCashFlow,
    TotalDebt,
    AccountsPayable,
    AvgDailyValue,
    MarketCap,
    BorrowingBase,
}

impl Metric {
    pub fn value(&self, company: &Company) -> Option<f64> {
        match self {
            Metric::Revenue => company.revenue,
            Metric::OperatingCashFlow => company.operating_cash_flow,
            Metric::TotalDebt => company.total_debt,
            Metric::AccountsPayable => company.accounts_payable,
            Metric::AvgDailyValue => company.avg_daily_value,
            Metric::MarketCap => company.market_cap,
            Metric::BorrowingBase => Some(company.borrowing_base),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
}

/// What a filter does with a company whose metric is unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unknown {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterRule {
    pub param: &'static str,
    pub metric: Metric,
    pub bound: Bound,
    pub unknown: Unknown,
}

impl FilterRule {
    pub fn passes(&self, company: &Company, threshold: f64) -> bool {
        match self.metric.value(company) {
            None => self.unknown == Unknown::Pass,
            Some(value) => match self.bound {
                Bound::Min => value >= threshold,
                Bound::Max => value <= threshold,
            },
        }
    }
}

/// Numeric filters and their unknown-value handling.
///
/// An unknown market cap passes `market_cap_max`: small issuers are exactly
/// the ones most often missing a quote.
pub const FILTER_POLICY: &[FilterRule] = &[
    FilterRule { param: "revenue_min", metric: Metric::Revenue, bound: Bound::Min, unknown: Unknown::Fail },
    FilterRule { param: "revenue_max", metric: Metric::Revenue, bound: Bound::Max, unknown: Unknown::Fail },
    FilterRule { param: "cfo_min", metric: Metric::OperatingCashFlow, bound: Bound::Min, unknown: Unknown::Fail },
    FilterRule { param: "debt_max", metric: Metric::TotalDebt, bound: Bound::Max, unknown: Unknown::Fail },
    FilterRule { param: "ap_max", metric: Metric::AccountsPayable, bound: Bound::Max, unknown: Unknown::Fail },
    FilterRule { param: "adv_min", metric: Metric::AvgDailyValue, bound: Bound::Min, unknown: Unknown::Fail },
    FilterRule { param: "market_cap_max", metric: Metric::MarketCap, bound: Bound::Max, unknown: Unknown::Pass },
    FilterRule { param: "min_borrow_base", metric: Metric::BorrowingBase, bound: Bound::Min, unknown: Unknown::Fail },
];

/// One search hit: a borrowed snapshot record plus metrics scoped to this request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenedCompany<'a> {
    #[serde(flatten)]
    pub company: &'a Company,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payback_years: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_coverage: Option<f64>,
}

impl<'a> ScreenedCompany<'a> {
    fn plain(company: &'a Company) -> Self {
        Self {
            company,
            payback_years: None,
            loan_coverage: None,
        }
    }
}

fn passes_filters(company: &Company, params: &SearchParams) -> bool {
    let numeric_ok = FILTER_POLICY.iter().all(|rule| match params.threshold(rule.param) {
        Some(threshold) => rule.passes(company, threshold),
        None => true,
    });
    if !numeric_ok {
        return false;
    }

    if let Some(locations) = &params.location {
        match &company.location {
            Some(location) if locations.iter().any(|l| l.eq_ignore_ascii_case(location)) => {}
            _ => return false,
        }
    }

    if let Some(exchanges) = &params.exchanges {
        if !exchanges.contains(&company.exchange) {
            return false;
        }
    }

    true
}

/// Apply loan terms; `None` when the company cannot service the loan in time
fn apply_loan_terms<'a>(company: &'a Company, loan_size: f64, max_payback_years: f64) -> Option<ScreenedCompany<'a>> {
    let cfo = company.operating_cash_flow.filter(|cfo| *cfo > 0.0)?;
    let payback_years = loan_size / cfo;
    if payback_years > max_payback_years {
        return None;
    }

    Some(ScreenedCompany {
        company,
        payback_years: Some(payback_years),
        loan_coverage: Some(company.borrowing_base / loan_size),
    })
}

/// Filter and sort the snapshot for one search
pub fn screen<'a>(snapshot: &'a Snapshot, params: &SearchParams) -> Vec<ScreenedCompany<'a>> {
    let loan_terms = params.loan_terms();

    let mut results: Vec<ScreenedCompany<'a>> = snapshot
        .companies
        .iter()
        .filter(|company| passes_filters(company, params))
        .filter_map(|company| match loan_terms {
            Some((loan_size, horizon)) => apply_loan_terms(company, loan_size, horizon),
            None => Some(ScreenedCompany::plain(company)),
        })
        .collect();

    sort_results(&mut results);
    debug!("Screened {} of {} companies", results.len(), snapshot.len());
    results
}

/// Lower first, unknown last
fn ascending_unknown_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Higher first, unknown last
fn descending_unknown_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Payback ascending, then coverage descending, then revenue descending.
/// Stable, so full ties keep snapshot order.
pub fn sort_results(results: &mut [ScreenedCompany<'_>]) {
    results.sort_by(|a, b| {
        ascending_unknown_last(a.payback_years, b.payback_years)
            .then_with(|| descending_unknown_last(a.loan_coverage, b.loan_coverage))
            .then_with(|| descending_unknown_last(a.company.revenue, b.company.revenue))
    });
}
