pub mod loan_screener;
pub mod search_params;

pub use loan_screener::{screen, sort_results, ScreenedCompany, FILTER_POLICY};
pub use search_params::SearchParams;
