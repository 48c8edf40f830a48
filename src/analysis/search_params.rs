// Search parameter parsing for the loan screener
// Query-string values are parsed leniently; every rejected field is reported at once

use std::collections::HashMap;

use crate::error::{FieldError, QueryError};
use crate::models::Exchange;

/// Optional filters for one search. `None` disables the matching filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pub revenue_min: Option<f64>,
    pub revenue_max: Option<f64>,
    pub cfo_min: Option<f64>,
    pub debt_max: Option<f64>,
    pub ap_max: Option<f64>,
    pub adv_min: Option<f64>,
    pub market_cap_max: Option<f64>,
    pub min_borrow_base: Option<f64>,
    pub location: Option<Vec<String>>,
    pub exchanges: Option<Vec<Exchange>>,
    pub loan_size: Option<f64>,
    pub max_payback_years: Option<f64>,
}

impl SearchParams {
    /// Threshold supplied for a numeric filter parameter
    pub fn threshold(&self, param: &str) -> Option<f64> {
        match param {
            "revenue_min" => self.revenue_min,
            "revenue_max" => self.revenue_max,
            "cfo_min" => self.cfo_min,
            "debt_max" => self.debt_max,
            "ap_max" => self.ap_max,
            "adv_min" => self.adv_min,
            "market_cap_max" => self.market_cap_max,
            "min_borrow_base" => self.min_borrow_base,
            _ => None,
        }
    }

    /// Loan size and payback horizon, only when both were supplied
    pub fn loan_terms(&self) -> Option<(f64, f64)> {
        Some((self.loan_size?, self.max_payback_years?))
    }

    pub fn from_query(query: &HashMap<String, String>) -> Result<Self, QueryError> {
        let mut errors = Vec::new();
        let mut number = |field: &str, positive: bool| -> Option<f64> {
            let raw = query.get(field)?;
            match parse_number(raw) {
                Ok(Some(value)) if positive && value <= 0.0 => {
                    errors.push(FieldError::new(field, "must be greater than zero"));
                    None
                }
                Ok(value) => value,
                Err(message) => {
                    errors.push(FieldError::new(field, message));
                    None
                }
            }
        };

        let mut params = SearchParams {
            revenue_min: number("revenue_min", false),
            revenue_max: number("revenue_max", false),
            cfo_min: number("cfo_min", false),
            debt_max: number("debt_max", false),
            ap_max: number("ap_max", false),
            adv_min: number("adv_min", false),
            market_cap_max: number("market_cap_max", false),
            min_borrow_base: number("min_borrow_base", false),
            loan_size: number("loan_size", true),
            max_payback_years: number("max_payback_years", true),
            ..SearchParams::default()
        };

        params.location = query.get("location").and_then(|raw| {
            let tags: Vec<String> = split_list(raw).map(|tag| tag.to_ascii_uppercase()).collect();
            (!tags.is_empty()).then_some(tags)
        });

        if let Some(raw) = query.get("exchanges") {
            let mut exchanges = Vec::new();
            for tag in split_list(raw) {
                match tag.parse::<Exchange>() {
                    Ok(exchange) if !exchanges.contains(&exchange) => exchanges.push(exchange),
                    Ok(_) => {}
                    Err(message) => errors.push(FieldError::new("exchanges", message)),
                }
            }
            if !exchanges.is_empty() {
                params.exchanges = Some(exchanges);
            }
        }

        if errors.is_empty() {
            Ok(params)
        } else {
            Err(QueryError::Validation(errors))
        }
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|part| !part.is_empty())
}

/// Parse `"3,000,000"`, `"$2.5e6"` or `"1_000"`; blank means not supplied
pub fn parse_number(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let cleaned: String = trimmed
        .strip_prefix('$')
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        Ok(_) => Err(format!("'{}' is not a finite number", raw)),
        Err(_) => Err(format!("'{}' is not a number", raw)),
    }
}
