// Query cache: keyed, deduplicated, invalidation-aware fetch results.
//
// Every entry owns a watch channel carrying its latest `QueryState`. Fetches
// run as spawned shared futures so that concurrent readers join the same
// request and a caller going away never cancels it. Entry bookkeeping lives
// behind a std mutex that is never held across an await point.

use crate::config::CacheConfig;
use crate::error::{AppError, AppResult};
use crate::infrastructure::invalidation::InvalidationBus;
use crate::infrastructure::query_key::QueryKey;
use crate::infrastructure::retry::{run_with_retry, RetryPolicy};
use crate::infrastructure::traits::QueryFetcher;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

pub type QueryData = Arc<Value>;

type FetchFuture = Shared<BoxFuture<'static, AppResult<QueryData>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueryStatus {
    /// No data and no error yet.
    Pending,
    Success,
    /// Last fetch failed. Previously fetched data is kept.
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub status: QueryStatus,
    pub data: Option<QueryData>,
    pub error: Option<AppError>,
    pub is_fetching: bool,
    /// Set by invalidation; cleared by the next successful fetch.
    pub is_invalidated: bool,
    pub data_updated_at: Option<DateTime<Utc>>,
    /// Completed fetch attempts, successful or not.
    pub fetch_count: u64,
}

impl QueryState {
    pub fn pending() -> Self {
        Self {
            status: QueryStatus::Pending,
            data: None,
            error: None,
            is_fetching: false,
            is_invalidated: false,
            data_updated_at: None,
            fetch_count: 0,
        }
    }

    /// First load: nothing to show yet and a fetch is running or due.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Pending && self.data.is_none()
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn decode<T: DeserializeOwned>(&self) -> AppResult<Option<T>> {
        self.data
            .as_ref()
            .map(|data| serde_json::from_value(Value::clone(data)))
            .transpose()
            .map_err(AppError::from)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Overrides the cache-wide stale time for this key.
    pub stale_time: Option<Duration>,
    /// Refetch on this period while at least one observer is mounted.
    pub poll_interval: Option<Duration>,
    pub retry: RetryPolicy,
    /// A disabled query never fetches; it only reports cached state.
    pub enabled: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: None,
            poll_interval: None,
            retry: RetryPolicy::default(),
            enabled: true,
        }
    }
}

impl QueryOptions {
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }

    pub fn with_poll_interval(mut self, period: Duration) -> Self {
        self.poll_interval = Some(period).filter(|period| !period.is_zero());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Generation and write counters observed when a fetch begins.
#[derive(Debug, Clone, Copy, Default)]
struct FetchMark {
    generation: u64,
    writes: u64,
}

struct CacheEntry {
    state: watch::Sender<QueryState>,
    fetcher: Option<Arc<dyn QueryFetcher>>,
    retry: RetryPolicy,
    stale_time: Option<Duration>,
    poll_interval: Option<Duration>,
    enabled: bool,
    fetched_at: Option<Instant>,
    last_accessed: Instant,
    subscribers: usize,
    /// Bumped by every invalidation.
    generation: u64,
    /// Bumped by every direct write; a fetch that raced one is discarded.
    writes: u64,
    in_flight: Option<FetchFuture>,
}

impl CacheEntry {
    fn new() -> Self {
        let (state, _) = watch::channel(QueryState::pending());
        Self {
            state,
            fetcher: None,
            retry: RetryPolicy::default(),
            stale_time: None,
            poll_interval: None,
            enabled: true,
            fetched_at: None,
            last_accessed: Instant::now(),
            subscribers: 0,
            generation: 0,
            writes: 0,
            in_flight: None,
        }
    }

    /// The most recent caller's options win.
    fn configure(
        &mut self,
        fetcher: Arc<dyn QueryFetcher>,
        options: &QueryOptions,
        default_stale_time: Option<Duration>,
    ) {
        self.fetcher = Some(fetcher);
        self.retry = options.retry;
        self.stale_time = options.stale_time.or(default_stale_time);
        self.poll_interval = options.poll_interval;
        self.enabled = options.enabled;
        self.last_accessed = Instant::now();
    }

    fn is_stale(&self, now: Instant) -> bool {
        let state = self.state.borrow();
        if state.is_invalidated || state.status != QueryStatus::Success {
            return true;
        }
        let Some(fetched_at) = self.fetched_at else {
            return true;
        };
        let age = now.saturating_duration_since(fetched_at);
        self.stale_time.is_some_and(|limit| age >= limit)
            || self.poll_interval.is_some_and(|period| age >= period)
    }

    fn snapshot(&self) -> QueryState {
        self.state.borrow().clone()
    }

    fn is_evictable(&self) -> bool {
        self.subscribers == 0 && self.in_flight.is_none()
    }
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    deduplicated: AtomicU64,
    invalidations: AtomicU64,
    evictions: AtomicU64,
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub in_flight: usize,
    pub hits: u64,
    pub misses: u64,
    pub fetches: u64,
    pub deduplicated: u64,
    pub invalidations: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheInner {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    config: CacheConfig,
    counters: CacheCounters,
}

/// Shared handle to the query cache. Clones point at the same entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(HashMap::new()),
                config,
                counters: CacheCounters::default(),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn entry_mut<'a>(
        &self,
        entries: &'a mut HashMap<QueryKey, CacheEntry>,
        key: &QueryKey,
    ) -> &'a mut CacheEntry {
        if !entries.contains_key(key) && entries.len() >= self.inner.config.max_entries {
            self.evict_lru(entries);
        }
        entries.entry(key.clone()).or_insert_with(CacheEntry::new)
    }

    /// Drop the least recently used entry nobody is watching or fetching.
    fn evict_lru(&self, entries: &mut HashMap<QueryKey, CacheEntry>) {
        let victim = entries
            .iter()
            .filter(|(_, entry)| entry.is_evictable())
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone());

        match victim {
            Some(key) => {
                entries.remove(&key);
                self.inner.counters.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("Evicted query {} from cache", key);
            }
            None => warn!(
                "Query cache holds {} entries, all in use; growing past capacity",
                entries.len()
            ),
        }
    }

    /// Start a fetch for `key`, or join the one already running.
    fn start_fetch(&self, key: &QueryKey, entry: &mut CacheEntry) -> Option<FetchFuture> {
        if let Some(in_flight) = &entry.in_flight {
            self.inner.counters.deduplicated.fetch_add(1, Ordering::Relaxed);
            return Some(in_flight.clone());
        }
        let fetcher = entry.fetcher.clone()?;

        let future = run_fetch(Arc::downgrade(&self.inner), key.clone(), fetcher, entry.retry)
            .boxed()
            .shared();
        entry.in_flight = Some(future.clone());
        entry.state.send_modify(|state| state.is_fetching = true);
        self.inner.counters.fetches.fetch_add(1, Ordering::Relaxed);

        // Detached: dropping every waiter must not cancel the request.
        tokio::spawn(future.clone());
        Some(future)
    }

    fn mark_fetch_started(&self, key: &QueryKey) -> FetchMark {
        self.lock()
            .get(key)
            .map(|entry| FetchMark {
                generation: entry.generation,
                writes: entry.writes,
            })
            .unwrap_or_default()
    }

    fn complete_fetch(&self, key: &QueryKey, started: FetchMark, result: &AppResult<QueryData>) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            debug!("Query {} was removed while fetching", key);
            return;
        };
        entry.in_flight = None;

        let superseded = entry.generation != started.generation;
        let overwritten = entry.writes != started.writes;
        let completed_at = Utc::now();

        entry.state.send_modify(|state| {
            state.is_fetching = false;
            state.fetch_count += 1;
            match result {
                Ok(data) if !overwritten => {
                    state.status = QueryStatus::Success;
                    state.data = Some(Arc::clone(data));
                    state.error = None;
                    state.data_updated_at = Some(completed_at);
                    state.is_invalidated = false;
                }
                Ok(_) => {}
                Err(err) => {
                    state.status = QueryStatus::Error;
                    state.error = Some(err.clone());
                }
            }
            if superseded {
                state.is_invalidated = true;
            }
        });

        match result {
            Ok(_) if overwritten => debug!("Discarded result for {}: data was replaced mid-fetch", key),
            Ok(_) => entry.fetched_at = Some(Instant::now()),
            Err(err) => warn!("Query {} failed: {}", key, err),
        }

        if superseded && entry.subscribers > 0 && entry.enabled {
            debug!("Query {} invalidated mid-fetch; refetching", key);
            self.start_fetch(key, entry);
        }
    }

    /// Return cached data when fresh, otherwise fetch (joining any fetch
    /// already running) and return the settled state. Errors are reported in
    /// the state, next to whatever data was cached before.
    #[instrument(skip(self, key, fetcher, options), fields(key = %key))]
    pub async fn fetch_query(
        &self,
        key: QueryKey,
        fetcher: Arc<dyn QueryFetcher>,
        options: QueryOptions,
    ) -> QueryState {
        let mut pending = {
            let mut entries = self.lock();
            let entry = self.entry_mut(&mut entries, &key);
            entry.configure(fetcher, &options, self.inner.config.stale_time());

            if !options.enabled {
                return entry.snapshot();
            }
            if !entry.is_stale(Instant::now()) {
                self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
                return entry.snapshot();
            }
            self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
            match self.start_fetch(&key, entry) {
                Some(future) => future,
                None => return entry.snapshot(),
            }
        };

        // Follow a refetch that an invalidation queued behind this one.
        loop {
            let _ = pending.await;
            let follow_up = self.lock().get(&key).and_then(|entry| entry.in_flight.clone());
            match follow_up {
                Some(next) => pending = next,
                None => break,
            }
        }

        self.query_state(&key).unwrap_or_else(QueryState::pending)
    }

    /// Typed variant of [`fetch_query`](Self::fetch_query): a failed last
    /// fetch is returned as the error even if stale data is cached.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        key: QueryKey,
        fetcher: Arc<dyn QueryFetcher>,
        options: QueryOptions,
    ) -> AppResult<T> {
        let missing = key.to_string();
        let state = self.fetch_query(key, fetcher, options).await;
        if state.is_error() {
            if let Some(err) = state.error.clone() {
                return Err(err);
            }
        }
        state
            .decode()?
            .ok_or_else(|| AppError::NotFound(format!("No data for query {}", missing)))
    }

    /// Mount an observer on `key`. Fetches immediately when the entry is
    /// missing or stale, and polls while `poll_interval` is set. Must be
    /// called inside a tokio runtime.
    pub fn subscribe(
        &self,
        key: QueryKey,
        fetcher: Arc<dyn QueryFetcher>,
        options: QueryOptions,
    ) -> QueryObserver {
        let receiver = {
            let mut entries = self.lock();
            let entry = self.entry_mut(&mut entries, &key);
            entry.configure(fetcher, &options, self.inner.config.stale_time());
            entry.subscribers += 1;
            if options.enabled && entry.is_stale(Instant::now()) {
                self.start_fetch(&key, entry);
            }
            entry.state.subscribe()
        };

        let poller = match (options.enabled, options.poll_interval.filter(|p| !p.is_zero())) {
            (true, Some(period)) => Some(self.spawn_poller(key.clone(), period)),
            _ => None,
        };

        QueryObserver {
            cache: self.clone(),
            key,
            receiver,
            poller,
        }
    }

    fn unsubscribe(&self, key: &QueryKey) {
        if let Some(entry) = self.lock().get_mut(key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            entry.last_accessed = Instant::now();
        }
    }

    fn spawn_poller(&self, key: QueryKey, period: Duration) -> JoinHandle<()> {
        let cache = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = cache.upgrade() else {
                    break;
                };
                QueryCache { inner }.refetch(&key);
            }
        })
    }

    /// Fetch `key` now regardless of freshness. Returns false when the key
    /// has never been registered with a fetcher.
    pub fn refetch(&self, key: &QueryKey) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return false;
        };
        entry.last_accessed = Instant::now();
        self.start_fetch(key, entry).is_some()
    }

    /// Mark every entry under `prefix` stale. Entries with mounted observers
    /// refetch; a fetch already in flight is followed by exactly one more.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.lock();
        let mut matched = 0;
        for (key, entry) in entries.iter_mut() {
            if !key.starts_with(prefix) {
                continue;
            }
            matched += 1;
            entry.generation += 1;
            entry.state.send_modify(|state| state.is_invalidated = true);
            if entry.subscribers > 0 && entry.enabled {
                self.start_fetch(key, entry);
            }
        }

        self.inner
            .counters
            .invalidations
            .fetch_add(matched as u64, Ordering::Relaxed);
        if matched > 0 {
            info!("Invalidated {} query(ies) under {}", matched, prefix);
        }
        matched
    }

    pub fn invalidate_all(&self) -> usize {
        self.invalidate(&QueryKey::new())
    }

    /// Write data directly, as an optimistic update does. The entry becomes
    /// fresh and any fetch racing this write is discarded on completion.
    pub fn set_query_data(&self, key: &QueryKey, data: Value) {
        let mut entries = self.lock();
        let entry = self.entry_mut(&mut entries, key);
        entry.writes += 1;
        entry.fetched_at = Some(Instant::now());
        entry.last_accessed = Instant::now();
        let data = Arc::new(data);
        entry.state.send_modify(|state| {
            state.status = QueryStatus::Success;
            state.data = Some(data);
            state.error = None;
            state.data_updated_at = Some(Utc::now());
        });
    }

    /// Roll a key back to a snapshot taken before [`set_query_data`](Self::set_query_data).
    pub fn restore_query_data(&self, key: &QueryKey, previous: Option<QueryData>) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        entry.writes += 1;
        match previous {
            Some(data) => entry.state.send_modify(|state| {
                state.status = QueryStatus::Success;
                state.data = Some(data);
            }),
            None if entry.is_evictable() => {
                entries.remove(key);
            }
            None => {
                entry.fetched_at = None;
                entry.state.send_modify(|state| {
                    state.status = QueryStatus::Pending;
                    state.data = None;
                    state.data_updated_at = None;
                    state.is_invalidated = true;
                });
            }
        }
    }

    pub fn get_query_data(&self, key: &QueryKey) -> Option<QueryData> {
        self.lock()
            .get(key)
            .and_then(|entry| entry.state.borrow().data.clone())
    }

    pub fn query_state(&self, key: &QueryKey) -> Option<QueryState> {
        self.lock().get(key).map(CacheEntry::snapshot)
    }

    /// Remove an entry nobody observes. Returns false if it is in use.
    pub fn remove(&self, key: &QueryKey) -> bool {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_evictable() => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Drop entries unobserved for longer than the configured gc time.
    pub fn collect_garbage(&self) -> usize {
        let gc_time = self.inner.config.gc_time();
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| {
            !entry.is_evictable() || now.saturating_duration_since(entry.last_accessed) < gc_time
        });
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Garbage-collected {} inactive query(ies)", removed);
        }
        removed
    }

    /// Run [`collect_garbage`](Self::collect_garbage) every gc period until
    /// the cache is dropped.
    pub fn spawn_gc(&self) -> JoinHandle<()> {
        let period = self.inner.config.gc_time().max(Duration::from_secs(1));
        let cache = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let Some(inner) = cache.upgrade() else {
                    break;
                };
                QueryCache { inner }.collect_garbage();
            }
            debug!("Query garbage collector stopped");
        })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let (entries, in_flight) = {
            let entries = self.lock();
            let in_flight = entries.values().filter(|entry| entry.in_flight.is_some()).count();
            (entries.len(), in_flight)
        };
        let counters = &self.inner.counters;
        CacheStats {
            entries,
            in_flight,
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            fetches: counters.fetches.load(Ordering::Relaxed),
            deduplicated: counters.deduplicated.load(Ordering::Relaxed),
            invalidations: counters.invalidations.load(Ordering::Relaxed),
            evictions: counters.evictions.load(Ordering::Relaxed),
        }
    }

    /// Apply every event published on `bus` until the bus closes or the
    /// cache is dropped. A lagging listener invalidates everything.
    pub fn listen(&self, bus: &InvalidationBus) -> JoinHandle<()> {
        let mut receiver = bus.subscribe();
        let cache = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        let Some(inner) = cache.upgrade() else {
                            break;
                        };
                        let active = QueryCache { inner };
                        for key in &event.keys {
                            active.invalidate(key);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Invalidation listener skipped {} event(s); invalidating all queries", skipped);
                        let Some(inner) = cache.upgrade() else {
                            break;
                        };
                        QueryCache { inner }.invalidate_all();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Invalidation listener stopped");
        })
    }
}

async fn run_fetch(
    cache: Weak<CacheInner>,
    key: QueryKey,
    fetcher: Arc<dyn QueryFetcher>,
    retry: RetryPolicy,
) -> AppResult<QueryData> {
    let started = match cache.upgrade() {
        Some(inner) => QueryCache { inner }.mark_fetch_started(&key),
        None => FetchMark::default(),
    };

    let label = format!("query {}", key);
    let result = {
        let fetcher = &fetcher;
        let key = &key;
        run_with_retry(&retry, &label, move || fetcher.fetch(key))
            .await
            .map(Arc::new)
    };

    if let Some(inner) = cache.upgrade() {
        QueryCache { inner }.complete_fetch(&key, started, &result);
    }
    result
}

/// A mounted subscriber. Dropping it unmounts: polling stops and the entry
/// becomes eligible for eviction once no other observer remains.
pub struct QueryObserver {
    cache: QueryCache,
    key: QueryKey,
    receiver: watch::Receiver<QueryState>,
    poller: Option<JoinHandle<()>>,
}

impl QueryObserver {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn state(&self) -> QueryState {
        self.receiver.borrow().clone()
    }

    /// Wait for the next state change.
    pub async fn changed(&mut self) -> AppResult<QueryState> {
        self.receiver
            .changed()
            .await
            .map_err(|_| AppError::Internal(format!("query {} was dropped", self.key)))?;
        Ok(self.state())
    }

    /// Wait until the state satisfies `condition`, checking the current one first.
    pub async fn wait_for<F>(&mut self, condition: F) -> AppResult<QueryState>
    where
        F: FnMut(&QueryState) -> bool,
    {
        let state = self
            .receiver
            .wait_for(condition)
            .await
            .map_err(|_| AppError::Internal(format!("query {} was dropped", self.key)))?
            .clone();
        Ok(state)
    }

    /// Wait until no fetch is running.
    pub async fn settled(&mut self) -> AppResult<QueryState> {
        self.wait_for(|state| !state.is_fetching).await
    }

    pub fn refetch(&self) -> bool {
        self.cache.refetch(&self.key)
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|poller| !poller.is_finished())
    }
}

impl Drop for QueryObserver {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        self.cache.unsubscribe(&self.key);
    }
}
