//! Exchange rate caching with TTL and single-flight refresh.
//!
//! One slot holds the current table, the time of the last successful fetch and
//! an optional in-flight fetch. Callers that find the slot stale attach to the
//! in-flight fetch instead of starting their own, so at most one provider
//! request is outstanding at any time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Duration;
use fintrack_common::{constants, elapsed_since, Clock, SystemClock, Timestamp};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::provider::RateProvider;
use crate::rate_table::{RateTable, SharedRateTable};

/// Handle every waiter of one fetch awaits.
type SharedFetch = Shared<BoxFuture<'static, SharedRateTable>>;

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// How long a fetched table stays valid.
    pub ttl: Duration,
    /// Table handed out when a fetch fails.
    pub fallback: RateTable,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: constants::rate_cache_ttl(),
            fallback: RateTable::fallback(),
        }
    }
}

/// Observable state of the cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing fetched yet and no fetch running.
    Empty,
    /// A fetch is in flight.
    Fetching,
    /// A table is present and within its TTL.
    Populated,
    /// A table is present but expired, or the last refresh failed.
    Stale,
}

#[derive(Default)]
struct Slot {
    table: Option<SharedRateTable>,
    fetched_at: Option<Timestamp>,
    in_flight: Option<SharedFetch>,
}

struct Inner {
    provider: Arc<dyn RateProvider>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    fallback: SharedRateTable,
    slot: Mutex<Slot>,
    hits: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
}

impl Inner {
    fn valid_table(&self, slot: &Slot) -> Option<SharedRateTable> {
        let table = slot.table.as_ref()?;
        let fetched_at = slot.fetched_at?;

        if table.is_empty() || elapsed_since(&*self.clock, fetched_at) >= self.ttl {
            return None;
        }
        Some(Arc::clone(table))
    }

    /// Body of the spawned fetch task. Only this writes the table.
    async fn fetch_and_store(&self, started_at: Timestamp) -> SharedRateTable {
        match self.provider.latest_rates().await {
            Ok(table) => {
                let table = Arc::new(table);
                {
                    let mut slot = self.slot.lock();
                    slot.table = Some(Arc::clone(&table));
                    slot.fetched_at = Some(started_at);
                    slot.in_flight = None;
                }
                info!(
                    provider = self.provider.name(),
                    currencies = table.len(),
                    "Exchange rates refreshed"
                );
                table
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                self.slot.lock().in_flight = None;
                warn!(
                    provider = self.provider.name(),
                    error = %e,
                    "Failed to fetch exchange rates, using fallback rates"
                );
                Arc::clone(&self.fallback)
            }
        }
    }
}

/// Process-wide exchange rate cache.
///
/// Cheap to clone; clones share the same slot. Must be used from within a
/// Tokio runtime since refreshes run as spawned tasks.
#[derive(Clone)]
pub struct RateCache {
    inner: Arc<Inner>,
}

impl RateCache {
    /// Create a cache over `provider` using the wall clock.
    pub fn new(provider: Arc<dyn RateProvider>, config: RateCacheConfig) -> Self {
        Self::with_clock(provider, config, Arc::new(SystemClock))
    }

    /// Create a cache reading time from `clock`.
    pub fn with_clock(
        provider: Arc<dyn RateProvider>,
        config: RateCacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                clock,
                ttl: config.ttl,
                fallback: Arc::new(config.fallback),
                slot: Mutex::new(Slot::default()),
                hits: AtomicU64::new(0),
                fetches: AtomicU64::new(0),
                failures: AtomicU64::new(0),
            }),
        }
    }

    /// Get a table that is fresh enough to trust.
    ///
    /// Returns the cached table while it is within its TTL. Otherwise joins the
    /// in-flight fetch, or starts one. A failed fetch yields the fallback
    /// table without caching it, so the next call tries the provider again.
    pub async fn get_rates(&self) -> SharedRateTable {
        let fetch = {
            let mut slot = self.inner.slot.lock();

            if let Some(table) = self.inner.valid_table(&slot) {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Rate cache hit");
                return table;
            }

            match &slot.in_flight {
                Some(fetch) => {
                    debug!("Joining in-flight rate fetch");
                    fetch.clone()
                }
                None => {
                    debug!("Rate cache miss, starting fetch");
                    let fetch = self.start_fetch();
                    slot.in_flight = Some(fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Spawn the provider call. Caller holds the slot lock.
    ///
    /// The fetch runs as its own task so it completes even if every waiter
    /// goes away.
    fn start_fetch(&self) -> SharedFetch {
        self.inner.fetches.fetch_add(1, Ordering::Relaxed);
        let started_at = self.inner.clock.now();

        let task_inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { task_inner.fetch_and_store(started_at).await });

        let inner = Arc::clone(&self.inner);
        async move {
            match handle.await {
                Ok(table) => table,
                Err(e) => {
                    inner.failures.fetch_add(1, Ordering::Relaxed);
                    inner.slot.lock().in_flight = None;
                    error!(error = %e, "Rate fetch task aborted, using fallback rates");
                    Arc::clone(&inner.fallback)
                }
            }
        }
        .boxed()
        .shared()
    }

    /// The table currently held, however old. Never fetches.
    pub fn resident(&self) -> Option<SharedRateTable> {
        self.inner.slot.lock().table.clone()
    }

    /// Time the resident table was fetched.
    pub fn last_fetched_at(&self) -> Option<Timestamp> {
        self.inner.slot.lock().fetched_at
    }

    /// The fallback table.
    pub fn fallback(&self) -> SharedRateTable {
        Arc::clone(&self.inner.fallback)
    }

    /// Current slot state.
    pub fn state(&self) -> CacheState {
        let slot = self.inner.slot.lock();

        if slot.in_flight.is_some() {
            CacheState::Fetching
        } else if self.inner.valid_table(&slot).is_some() {
            CacheState::Populated
        } else if slot.table.is_some() {
            CacheState::Stale
        } else {
            CacheState::Empty
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            fetches: self.inner.fetches.load(Ordering::Relaxed),
            failures: self.inner.failures.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls answered from a valid cached table.
    pub hits: u64,
    /// Provider fetches started.
    pub fetches: u64,
    /// Fetches that ended with the fallback table.
    pub failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockRateProvider;
    use fintrack_common::{Currency, ManualClock};
    use std::time::Duration as StdDuration;
    use tokio_test::assert_pending;

    fn live_table() -> RateTable {
        RateTable::from_rates(vec![("USD", 1.0), ("EUR", 0.9), ("INR", 83.0)])
    }

    fn setup(provider: Arc<MockRateProvider>) -> (RateCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let cache = RateCache::with_clock(provider, RateCacheConfig::default(), clock.clone());
        (cache, clock)
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let provider = Arc::new(
            MockRateProvider::with_rates(live_table()).with_latency(StdDuration::from_millis(20)),
        );
        let (cache, _clock) = setup(provider.clone());

        let results = futures::future::join_all((0..50).map(|_| cache.get_rates())).await;

        assert_eq!(provider.calls(), 1);
        assert_eq!(results.len(), 50);
        assert!(results.iter().all(|t| Arc::ptr_eq(t, &results[0])));
        assert_eq!(*results[0], live_table());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tasks_share_one_fetch() {
        let provider = Arc::new(
            MockRateProvider::with_rates(live_table()).with_latency(StdDuration::from_millis(100)),
        );
        let (cache, _clock) = setup(provider.clone());

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_rates().await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(provider.calls(), 1);
        assert!(results.iter().all(|t| Arc::ptr_eq(t, &results[0])));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_fallback() {
        let provider =
            Arc::new(MockRateProvider::new("down").with_latency(StdDuration::from_millis(20)));
        let (cache, _clock) = setup(provider.clone());

        let results = futures::future::join_all((0..10).map(|_| cache.get_rates())).await;

        assert_eq!(provider.calls(), 1);
        assert!(results.iter().all(|t| **t == RateTable::fallback()));
        assert_eq!(cache.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let provider = Arc::new(MockRateProvider::with_rates(live_table()));
        let (cache, clock) = setup(provider.clone());
        let ttl = constants::rate_cache_ttl();

        cache.get_rates().await;
        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.state(), CacheState::Populated);

        clock.advance(ttl - Duration::milliseconds(1));
        cache.get_rates().await;
        assert_eq!(provider.calls(), 1);

        clock.advance(Duration::milliseconds(2));
        assert_eq!(cache.state(), CacheState::Stale);
        cache.get_rates().await;
        assert_eq!(provider.calls(), 2);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.fetches, 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let provider = Arc::new(MockRateProvider::with_rates(live_table()));
        provider.push_failure("connection refused");
        let (cache, _clock) = setup(provider.clone());

        let first = cache.get_rates().await;
        assert_eq!(*first, RateTable::fallback());
        assert!(cache.last_fetched_at().is_none());
        assert!(cache.resident().is_none());
        assert_eq!(cache.state(), CacheState::Empty);

        let second = cache.get_rates().await;
        assert_eq!(provider.calls(), 2);
        assert_eq!(*second, live_table());
        assert!(cache.last_fetched_at().is_some());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_table() {
        let provider = Arc::new(MockRateProvider::with_rates(live_table()));
        let (cache, clock) = setup(provider.clone());

        let live = cache.get_rates().await;
        let fetched_at = cache.last_fetched_at();

        clock.advance(Duration::hours(25));
        provider.push_failure("timeout");

        let during_outage = cache.get_rates().await;
        assert_eq!(*during_outage, RateTable::fallback());
        assert_eq!(cache.state(), CacheState::Stale);
        assert_eq!(cache.last_fetched_at(), fetched_at);
        assert!(Arc::ptr_eq(&cache.resident().unwrap(), &live));
    }

    #[tokio::test]
    async fn test_followers_join_in_flight_fetch() {
        let provider = Arc::new(
            MockRateProvider::with_rates(live_table()).with_latency(StdDuration::from_millis(20)),
        );
        let (cache, _clock) = setup(provider.clone());

        let mut leader = tokio_test::task::spawn(cache.get_rates());
        assert_pending!(leader.poll());
        assert_eq!(cache.state(), CacheState::Fetching);

        let follower = cache.get_rates().await;
        assert_eq!(provider.calls(), 1);
        assert_eq!(follower.get(&Currency::inr()), Some(83.0));
        assert_eq!(cache.state(), CacheState::Populated);
    }

    #[tokio::test]
    async fn test_fetched_at_is_fetch_start() {
        let provider = Arc::new(
            MockRateProvider::with_rates(live_table()).with_latency(StdDuration::from_millis(20)),
        );
        let (cache, clock) = setup(provider.clone());
        let started = clock.now();

        let mut leader = tokio_test::task::spawn(cache.get_rates());
        assert_pending!(leader.poll());
        clock.advance(Duration::hours(1));

        cache.get_rates().await;
        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.last_fetched_at(), Some(started));

        // The TTL runs from the start of the fetch.
        clock.advance(constants::rate_cache_ttl() - Duration::hours(1));
        assert_eq!(cache.state(), CacheState::Stale);
    }

    #[tokio::test]
    async fn test_fetch_completes_without_waiters() {
        let provider = Arc::new(
            MockRateProvider::with_rates(live_table()).with_latency(StdDuration::from_millis(10)),
        );
        let (cache, _clock) = setup(provider.clone());

        let mut abandoned = tokio_test::task::spawn(cache.get_rates());
        assert_pending!(abandoned.poll());
        drop(abandoned);

        tokio::time::sleep(StdDuration::from_millis(50)).await;

        assert_eq!(cache.state(), CacheState::Populated);
        cache.get_rates().await;
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_cache_has_no_resident_table() {
        let provider = Arc::new(MockRateProvider::with_rates(live_table()));
        let (cache, _clock) = setup(provider.clone());

        assert!(cache.resident().is_none());
        assert_eq!(cache.state(), CacheState::Empty);
        assert_eq!(provider.calls(), 0);
        assert_eq!(*cache.fallback(), RateTable::fallback());
    }
}
