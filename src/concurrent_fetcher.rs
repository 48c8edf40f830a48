//! Concurrent company fetching
//!
//! A fixed number of workers pull universe entries from a shared queue, look
//! each one up and write the result into the slot matching its universe
//! position, so the assembled list keeps source order whatever the completion
//! order was.

use chrono::NaiveDate;
use futures::FutureExt;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::api::FactSource;
use crate::error::RefreshError;
use crate::extractor::build_company;
use crate::models::{Company, UniverseEntry};

/// Configuration for concurrent fetching
#[derive(Debug, Clone)]
pub struct ConcurrentFetchConfig {
    pub num_workers: usize,
    /// Pause a worker takes before each entity after its first
    pub request_delay: Duration,
    pub as_of: NaiveDate,
}

/// Result of concurrent fetching operation
#[derive(Debug)]
pub struct FetchResult {
    pub companies: Vec<Company>,
    pub total_companies: usize,
    pub complete_companies: usize,
    pub degraded_companies: usize,
}

#[derive(Debug, Default)]
struct FetchCounters {
    complete: usize,
    degraded: usize,
}

type WorkQueue = Arc<Mutex<VecDeque<(usize, UniverseEntry)>>>;
type ResultSlots = Arc<Mutex<Vec<Option<Company>>>>;

/// Look up one company. Lookups that fail leave their fields absent.
pub async fn fetch_company<S: FactSource + ?Sized>(source: &S, entry: &UniverseEntry, as_of: NaiveDate) -> Company {
    let (facts, submissions, quote) = tokio::join!(
        source.company_facts(entry.cik),
        source.submissions(entry.cik),
        source.market_quote(&entry.symbol),
    );

    if facts.is_none() && submissions.is_none() && quote.is_none() {
        warn!("⚠️ No data for {} (CIK {})", entry.symbol, entry.cik);
    }

    build_company(entry, facts.as_ref(), submissions.as_ref(), quote.as_ref(), as_of)
}

/// Fetch every universe entry with a bounded worker pool
pub async fn fetch_companies_concurrently(
    source: Arc<dyn FactSource>,
    universe: Vec<UniverseEntry>,
    config: ConcurrentFetchConfig,
) -> Result<FetchResult, RefreshError> {
    let total_companies = universe.len();
    let num_workers = config.num_workers.clamp(1, total_companies.max(1));
    info!("🚀 Fetching {} companies with {} workers", total_companies, num_workers);

    let queue: WorkQueue = Arc::new(Mutex::new(universe.into_iter().enumerate().collect()));
    let slots: ResultSlots = Arc::new(Mutex::new(vec![None; total_companies]));
    let counters = Arc::new(Mutex::new(FetchCounters::default()));

    let mut handles = Vec::with_capacity(num_workers);
    for worker_id in 0..num_workers {
        let queue = Arc::clone(&queue);
        let slots = Arc::clone(&slots);
        let counters = Arc::clone(&counters);
        let source = Arc::clone(&source);
        let as_of = config.as_of;
        let request_delay = config.request_delay;

        handles.push(tokio::spawn(async move {
            worker(worker_id, queue, slots, counters, source, request_delay, as_of).await
        }));
    }

    for handle in handles {
        handle.await.map_err(|e| RefreshError::Worker(e.to_string()))?;
    }

    let slots = std::mem::take(&mut *slots.lock().unwrap_or_else(PoisonError::into_inner));
    let companies: Vec<Company> = slots.into_iter().flatten().collect();
    if companies.len() != total_companies {
        return Err(RefreshError::Worker(format!(
            "{} of {} companies missing after fetch",
            total_companies - companies.len(),
            total_companies
        )));
    }

    let counters = counters.lock().unwrap_or_else(PoisonError::into_inner);
    let result = FetchResult {
        companies,
        total_companies,
        complete_companies: counters.complete,
        degraded_companies: counters.degraded,
    };

    info!(
        "✅ Fetch completed: {} complete, {} without facts",
        result.complete_companies, result.degraded_companies
    );
    Ok(result)
}

async fn worker(
    worker_id: usize,
    queue: WorkQueue,
    slots: ResultSlots,
    counters: Arc<Mutex<FetchCounters>>,
    source: Arc<dyn FactSource>,
    request_delay: Duration,
    as_of: NaiveDate,
) {
    let mut processed = 0usize;
    loop {
        let next = queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        let Some((index, entry)) = next else {
            break; // No more companies to process
        };

        if processed > 0 && !request_delay.is_zero() {
            tokio::time::sleep(request_delay).await;
        }
        processed += 1;

        debug!("🔄 Worker {}: starting {}", worker_id, entry.symbol);

        let company = match AssertUnwindSafe(fetch_company(source.as_ref(), &entry, as_of))
            .catch_unwind()
            .await
        {
            Ok(company) => company,
            Err(_) => {
                error!("❌ Worker {}: lookup for {} panicked, keeping identity only", worker_id, entry.symbol);
                Company::bare(&entry, as_of)
            }
        };

        {
            let mut counters = counters.lock().unwrap_or_else(PoisonError::into_inner);
            if company.total_debt.is_some() {
                counters.complete += 1;
            } else {
                counters.degraded += 1;
            }
        }

        slots.lock().unwrap_or_else(PoisonError::into_inner)[index] = Some(company);
    }

    debug!("Worker {} finished", worker_id);
}
