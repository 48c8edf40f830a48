//! Snapshot refresh orchestration
//!
//! Holds the single process-wide snapshot and drives refresh cycles. At most
//! one cycle runs at a time: callers arriving while one is in flight await the
//! same shared result instead of starting another.

use chrono::NaiveDate;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::api::FactSource;
use crate::concurrent_fetcher::{fetch_companies_concurrently, ConcurrentFetchConfig};
use crate::error::RefreshError;
use crate::models::{Config, Snapshot};
use crate::universe::UniverseBuilder;
use crate::utils::BusinessClock;

/// Outcome of one completed refresh cycle
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RefreshSummary {
    pub date: NaiveDate,
    pub count: usize,
    pub degraded: usize,
    pub duration_ms: u64,
}

type SharedRefresh = Shared<BoxFuture<'static, Result<RefreshSummary, RefreshError>>>;

/// Current snapshot behind a swappable pointer.
///
/// Readers clone the `Arc` and keep a complete snapshot for as long as they
/// need it; publishing replaces the pointer in one write.
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
        }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&snapshot);
        snapshot
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SnapshotOrchestrator {
    source: Arc<dyn FactSource>,
    universe: UniverseBuilder,
    store: SnapshotStore,
    clock: BusinessClock,
    concurrency: usize,
    request_delay: Duration,
    refresh_on_stale: bool,
    in_flight: Mutex<Option<SharedRefresh>>,
}

/// Clears the in-flight marker when the refresh task ends, including by panic
struct InFlightGuard<'a>(&'a SnapshotOrchestrator);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        *self.0.in_flight.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl SnapshotOrchestrator {
    pub fn new(source: Arc<dyn FactSource>, config: &Config) -> Arc<Self> {
        let clock = BusinessClock::new(config.business_timezone, config.refresh_hour, config.refresh_minute);
        Self::with_clock(source, config, clock)
    }

    pub fn with_clock(source: Arc<dyn FactSource>, config: &Config, clock: BusinessClock) -> Arc<Self> {
        Arc::new(Self {
            source,
            universe: UniverseBuilder::new(config.universe_max),
            store: SnapshotStore::new(),
            clock,
            concurrency: config.concurrency.max(1),
            request_delay: Duration::from_millis(config.request_delay_ms),
            refresh_on_stale: config.refresh_on_stale,
            in_flight: Mutex::new(None),
        })
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.current()
    }

    pub fn clock(&self) -> &BusinessClock {
        &self.clock
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Run a refresh, or join the one already in flight
    pub async fn refresh(self: &Arc<Self>) -> Result<RefreshSummary, RefreshError> {
        self.start_or_join().await
    }

    /// Start a background refresh when the snapshot is not dated today.
    ///
    /// Returns whether the snapshot was stale. The stale snapshot keeps being
    /// served while the refresh runs.
    pub fn refresh_if_stale(self: &Arc<Self>) -> bool {
        if !self.refresh_on_stale || !self.snapshot().is_stale(self.clock.today()) {
            return false;
        }

        // The cycle runs in its own task; dropping the handle does not cancel it
        let _ = self.start_or_join();
        true
    }

    fn start_or_join(self: &Arc<Self>) -> SharedRefresh {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = slot.as_ref() {
            debug!("Refresh already in flight, joining it");
            return existing.clone();
        }

        let this = Arc::clone(self);
        let task: JoinHandle<Result<RefreshSummary, RefreshError>> = tokio::spawn(async move {
            let _guard = InFlightGuard(&this);
            this.run_cycle().await
        });

        let shared = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    error!("❌ Refresh task aborted: {}", e);
                    Err(RefreshError::Aborted(e.to_string()))
                }
            }
        }
        .boxed()
        .shared();

        *slot = Some(shared.clone());
        shared
    }

    async fn run_cycle(&self) -> Result<RefreshSummary, RefreshError> {
        let started = Instant::now();
        let started_on = self.clock.today();
        info!("🔄 Starting snapshot refresh on {}", started_on);

        let universe = self.universe.build(self.source.as_ref()).await;
        let config = ConcurrentFetchConfig {
            num_workers: self.concurrency,
            request_delay: self.request_delay,
            as_of: started_on,
        };

        let fetched = fetch_companies_concurrently(Arc::clone(&self.source), universe, config)
            .await
            .map_err(|e| {
                error!("❌ Refresh failed, keeping previous snapshot: {}", e);
                e
            })?;

        // Dated at assembly so a cycle crossing midnight is not stale on arrival
        let as_of = self.clock.today();
        let snapshot = self.store.publish(Snapshot::new(as_of, fetched.companies));
        let summary = RefreshSummary {
            date: as_of,
            count: snapshot.len(),
            degraded: fetched.degraded_companies,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            "📸 Published snapshot {} with {} companies in {} ms",
            summary.date, summary.count, summary.duration_ms
        );
        Ok(summary)
    }
}

/// Refresh once per day at the configured wall-clock time in the business timezone
pub fn spawn_daily_scheduler(orchestrator: Arc<SnapshotOrchestrator>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = orchestrator.clock().now();
            let wait = orchestrator.clock().until_next_run(now);
            info!(
                "⏰ Next scheduled refresh at {} ({} min)",
                orchestrator.clock().next_run_after(now),
                wait.as_secs() / 60
            );

            tokio::time::sleep(wait).await;

            if let Err(e) = orchestrator.refresh().await {
                error!("❌ Scheduled refresh failed: {}", e);
            }
        }
    })
}
