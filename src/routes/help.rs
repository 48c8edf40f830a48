use axum::{response::Html, routing::get, Router};

use super::AppState;

const HELP_PAGE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Lending screener</title></head>
<body>
<h1>Lending screener</h1>
<p>Daily snapshot of public-company fundamentals from SEC EDGAR, screened for loan eligibility.</p>
<h2>Endpoints</h2>
<ul>
  <li><code>GET /api/health</code> snapshot date, company count and whether a refresh is running</li>
  <li><code>POST /api/refresh</code> refresh the snapshot now (joins a refresh already running)</li>
  <li><code>GET /api/search</code> filter and rank the snapshot</li>
</ul>
<h2>Search parameters</h2>
<p>All optional. Numbers accept commas, underscores, a leading <code>$</code> and exponents.</p>
<ul>
  <li><code>revenue_min</code>, <code>revenue_max</code></li>
  <li><code>cfo_min</code> operating cash flow floor</li>
  <li><code>debt_max</code>, <code>ap_max</code> total debt and accounts payable ceilings</li>
  <li><code>adv_min</code> average daily traded value floor</li>
  <li><code>market_cap_max</code> (companies without a market cap pass)</li>
  <li><code>min_borrow_base</code> 0.80 &times; receivables + 0.50 &times; inventory + 0.25 &times; fixed assets</li>
  <li><code>location</code> comma-separated state or country codes</li>
  <li><code>exchanges</code> comma-separated: NASDAQ, NYSE, OTC</li>
  <li><code>loan_size</code> with <code>max_payback_years</code> adds payback years and loan coverage and drops companies that cannot repay in time</li>
</ul>
<p>Example: <a href="/api/search?loan_size=3000000&amp;max_payback_years=4&amp;exchanges=NASDAQ">/api/search?loan_size=3000000&amp;max_payback_years=4&amp;exchanges=NASDAQ</a></p>
</body>
</html>
"#;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(help_handler))
}

/// GET / - usage page
async fn help_handler() -> Html<&'static str> {
    Html(HELP_PAGE)
}
