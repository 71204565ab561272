//! The query cache.
//!
//! One [`QueryClient`] per application. Entries are type-erased so a single
//! map can hold every resource; typed access downcasts on read. The entry
//! map sits behind a std mutex that is never held across an await: fetches
//! run as shared futures stored in the entry, and every caller for the same
//! key awaits the same one.

use crate::key::QueryKey;
use crate::options::{QueryClientConfig, RetryPolicy};
use futures::future::{BoxFuture, FutureExt, Shared, join_all};
use leadbook_api::{ApiError, ApiResult};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

pub(crate) type AnyData = Arc<dyn Any + Send + Sync>;
pub(crate) type FetchResult = Result<AnyData, ApiError>;
pub(crate) type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;
pub(crate) type ErasedFetcher = Arc<dyn Fn() -> BoxFuture<'static, FetchResult> + Send + Sync>;

const UPDATE_CAPACITY: usize = 256;

/// Wraps a typed fetch function for storage in the cache.
pub(crate) fn erase<T, F, Fut>(fetcher: F) -> ErasedFetcher
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult<T>> + Send + 'static,
{
    Arc::new(move || {
        let fut = fetcher();
        async move { fut.await.map(|data| Arc::new(data) as AnyData) }.boxed()
    })
}

pub(crate) fn downcast<T: Send + Sync + 'static>(data: AnyData, key: &QueryKey) -> Option<Arc<T>> {
    match data.downcast::<T>() {
        Ok(typed) => Some(typed),
        Err(_) => {
            warn!("cached value for {key} has a different type than requested");
            None
        }
    }
}

struct InFlight {
    id: u64,
    future: SharedFetch,
}

struct Entry {
    data: Option<AnyData>,
    error: Option<ApiError>,
    updated_at: Option<Instant>,
    invalidated: bool,
    /// Bumped by every invalidation; a fetch that started under an older
    /// epoch leaves the entry stale.
    epoch: u64,
    fetch: Option<InFlight>,
    fetcher: Option<(ErasedFetcher, RetryPolicy)>,
    observers: usize,
    inactive_since: Option<Instant>,
    cache_time: Option<Duration>,
}

impl Entry {
    fn new() -> Self {
        Self {
            data: None,
            error: None,
            updated_at: None,
            invalidated: false,
            epoch: 0,
            fetch: None,
            fetcher: None,
            observers: 0,
            inactive_since: Some(Instant::now()),
            cache_time: None,
        }
    }

    fn is_fresh(&self, stale_time: Duration, now: Instant) -> bool {
        self.data.is_some()
            && !self.invalidated
            && self
                .updated_at
                .is_some_and(|at| now.duration_since(at) < stale_time)
    }

    fn is_collectable(&self, default_cache_time: Duration, now: Instant) -> bool {
        let cache_time = self.cache_time.unwrap_or(default_cache_time);
        self.observers == 0
            && self.fetch.is_none()
            && self
                .inactive_since
                .is_some_and(|since| now.duration_since(since) >= cache_time)
    }
}

/// Untyped view of one entry, as observers read it.
pub(crate) struct EntrySnapshot {
    pub data: Option<AnyData>,
    pub error: Option<ApiError>,
    pub updated_at: Option<Instant>,
    pub invalidated: bool,
    pub is_fetching: bool,
}

/// Status of a cached query, independent of its data type.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub has_data: bool,
    pub error: Option<ApiError>,
    pub updated_at: Option<Instant>,
    pub is_invalidated: bool,
    pub is_fetching: bool,
    pub observers: usize,
}

pub(crate) struct Inner {
    config: QueryClientConfig,
    entries: Mutex<HashMap<QueryKey, Entry>>,
    next_fetch_id: AtomicU64,
    updates: broadcast::Sender<QueryKey>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, key: &QueryKey) {
        let _ = self.updates.send(key.clone());
    }

    /// Returns the in-flight fetch for `key`, starting one if none is running.
    pub(crate) fn fetch_handle(
        self: &Arc<Self>,
        key: &QueryKey,
        fetcher: ErasedFetcher,
        retry: RetryPolicy,
    ) -> SharedFetch {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
        entry.fetcher = Some((Arc::clone(&fetcher), retry));
        if let Some(in_flight) = &entry.fetch {
            debug!("joining in-flight fetch for {key}");
            return in_flight.future.clone();
        }

        let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let epoch = entry.epoch;
        let weak = Arc::downgrade(self);
        let settle_key = key.clone();
        let future = async move {
            let result = run_with_retry(&fetcher, retry, &settle_key).await;
            if let Some(inner) = weak.upgrade() {
                inner.settle(&settle_key, id, epoch, &result);
            }
            result
        }
        .boxed()
        .shared();

        entry.fetch = Some(InFlight {
            id,
            future: future.clone(),
        });
        drop(entries);

        debug!("fetching {key}");
        // Drive the fetch even if every caller goes away.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(future.clone());
        }
        future
    }

    fn settle(self: &Arc<Self>, key: &QueryKey, id: u64, epoch: u64, result: &FetchResult) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            debug!("query {key} was removed while fetching");
            return;
        };
        if entry.fetch.as_ref().map(|f| f.id) != Some(id) {
            return;
        }
        entry.fetch = None;
        match result {
            Ok(data) => {
                entry.data = Some(Arc::clone(data));
                entry.error = None;
                entry.updated_at = Some(Instant::now());
                entry.invalidated = entry.epoch != epoch;
            }
            Err(e) => {
                warn!("query {key} failed: {e}");
                entry.error = Some(e.clone());
            }
        }
        let idle = entry.observers == 0;
        let cache_time = entry.cache_time.unwrap_or(self.config.cache_time);
        drop(entries);

        self.notify(key);
        if idle {
            self.schedule_gc(key.clone(), cache_time);
        }
    }

    fn schedule_gc(self: &Arc<Self>, key: QueryKey, after: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let weak: Weak<Self> = Arc::downgrade(self);
        handle.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(inner) = weak.upgrade() {
                inner.collect_key(&key);
            }
        });
    }

    fn collect_key(&self, key: &QueryKey) {
        let mut entries = self.lock();
        let now = Instant::now();
        if entries
            .get(key)
            .is_some_and(|e| e.is_collectable(self.config.cache_time, now))
        {
            entries.remove(key);
            debug!("evicted {key}");
        }
    }

    pub(crate) fn observe(&self, key: &QueryKey, cache_time: Duration) {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
        entry.observers += 1;
        entry.inactive_since = None;
        entry.cache_time = Some(entry.cache_time.map_or(cache_time, |c| c.max(cache_time)));
    }

    pub(crate) fn unobserve(self: &Arc<Self>, key: &QueryKey) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        entry.observers = entry.observers.saturating_sub(1);
        if entry.observers > 0 {
            return;
        }
        entry.inactive_since = Some(Instant::now());
        let cache_time = entry.cache_time.unwrap_or(self.config.cache_time);
        drop(entries);
        self.schedule_gc(key.clone(), cache_time);
    }

    pub(crate) fn snapshot(&self, key: &QueryKey) -> Option<EntrySnapshot> {
        let entries = self.lock();
        entries.get(key).map(|e| EntrySnapshot {
            data: e.data.clone(),
            error: e.error.clone(),
            updated_at: e.updated_at,
            invalidated: e.invalidated,
            is_fetching: e.fetch.is_some(),
        })
    }

    pub(crate) fn is_fresh(&self, key: &QueryKey, stale_time: Duration) -> bool {
        let now = Instant::now();
        self.lock()
            .get(key)
            .is_some_and(|e| e.is_fresh(stale_time, now))
    }
}

async fn run_with_retry(fetcher: &ErasedFetcher, retry: RetryPolicy, key: &QueryKey) -> FetchResult {
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(data) => return Ok(data),
            Err(e) if attempt < retry.retries && e.is_retryable() => {
                let delay = retry.backoff(attempt);
                debug!("retrying {key} in {delay:?} after: {e}");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Shared cache of query results.
///
/// Cloning is cheap; clones share the same cache.
#[derive(Clone)]
pub struct QueryClient {
    pub(crate) inner: Arc<Inner>,
}

impl QueryClient {
    pub fn new() -> Self {
        Self::with_config(QueryClientConfig::default())
    }

    pub fn with_config(config: QueryClientConfig) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                config,
                entries: Mutex::new(HashMap::new()),
                next_fetch_id: AtomicU64::new(0),
                updates,
            }),
        }
    }

    pub fn config(&self) -> &QueryClientConfig {
        &self.inner.config
    }

    fn default_retry(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.inner.config.retry,
            delay: self.inner.config.retry_delay,
            max_delay: self.inner.config.max_retry_delay,
        }
    }

    /// Returns cached data younger than `stale_time`, or fetches it.
    ///
    /// Concurrent calls for the same key share one fetch.
    pub async fn fetch_query<T, F, Fut>(
        &self,
        key: QueryKey,
        fetcher: F,
        stale_time: Duration,
    ) -> ApiResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        if self.inner.is_fresh(&key, stale_time) {
            if let Some(data) = self.get_query_data::<T>(&key) {
                return Ok(data);
            }
        }
        let data = self
            .inner
            .fetch_handle(&key, erase(fetcher), self.default_retry())
            .await?;
        downcast(data, &key)
            .ok_or_else(|| ApiError::Decode(format!("cached value for {key} has another type")))
    }

    /// Warms the cache. Failures are logged, not returned.
    pub async fn prefetch_query<T, F, Fut>(&self, key: QueryKey, fetcher: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let stale_time = self.inner.config.prefetch_stale_time;
        if let Err(e) = self.fetch_query(key.clone(), fetcher, stale_time).await {
            debug!("prefetch of {key} failed: {e}");
        }
    }

    pub fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let data = self.inner.lock().get(key)?.data.clone()?;
        downcast(data, key)
    }

    /// Replaces the cached data for `key` as if it had just been fetched.
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: QueryKey, data: T) {
        let idle_for = {
            let mut entries = self.inner.lock();
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            entry.data = Some(Arc::new(data));
            entry.error = None;
            entry.updated_at = Some(Instant::now());
            entry.invalidated = false;
            (entry.observers == 0).then(|| entry.cache_time.unwrap_or(self.inner.config.cache_time))
        };
        self.inner.notify(&key);
        if let Some(cache_time) = idle_for {
            self.inner.schedule_gc(key, cache_time);
        }
    }

    /// Marks every entry under `prefix` stale. Entries with observers are
    /// refetched in the background; the rest refetch on next use.
    ///
    /// Returns the number of entries marked.
    pub fn invalidate_queries(&self, prefix: &QueryKey) -> usize {
        let mut marked = Vec::new();
        let mut refetch = Vec::new();
        {
            let mut entries = self.inner.lock();
            for (key, entry) in entries.iter_mut().filter(|(k, _)| k.starts_with(prefix)) {
                entry.invalidated = true;
                entry.epoch += 1;
                marked.push(key.clone());
                if entry.observers > 0 && entry.fetch.is_none() {
                    if let Some((fetcher, retry)) = &entry.fetcher {
                        refetch.push((key.clone(), Arc::clone(fetcher), *retry));
                    }
                }
            }
        }

        debug!("invalidated {} queries under {prefix}", marked.len());
        for (key, fetcher, retry) in refetch {
            drop(self.inner.fetch_handle(&key, fetcher, retry));
        }
        for key in &marked {
            self.inner.notify(key);
        }
        marked.len()
    }

    /// Refetches every entry under `prefix` that has been fetched before,
    /// observed or not, and waits for all of them.
    ///
    /// Returns the number of entries refetched.
    pub async fn refetch_queries(&self, prefix: &QueryKey) -> usize {
        let targets: Vec<_> = {
            let entries = self.inner.lock();
            entries
                .iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .filter_map(|(k, e)| {
                    e.fetcher
                        .as_ref()
                        .map(|(f, r)| (k.clone(), Arc::clone(f), *r))
                })
                .collect()
        };
        let handles: Vec<_> = targets
            .iter()
            .map(|(key, fetcher, retry)| self.inner.fetch_handle(key, Arc::clone(fetcher), *retry))
            .collect();
        join_all(handles).await;
        targets.len()
    }

    /// Drops every entry under `prefix`. In-flight fetches for removed
    /// entries complete without touching the cache.
    pub fn remove_queries(&self, prefix: &QueryKey) -> usize {
        let removed: Vec<QueryKey> = {
            let mut entries = self.inner.lock();
            let keys: Vec<_> = entries
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect();
            for key in &keys {
                entries.remove(key);
            }
            keys
        };
        for key in &removed {
            self.inner.notify(key);
        }
        removed.len()
    }

    /// Empties the cache.
    pub fn clear(&self) {
        let count = {
            let mut entries = self.inner.lock();
            let count = entries.len();
            entries.clear();
            count
        };
        debug!("cleared {count} cached queries");
    }

    /// Evicts every unobserved entry idle for longer than its cache time.
    ///
    /// Eviction is also scheduled automatically when an entry loses its last
    /// observer; this is for callers without a timer.
    pub fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let default_cache_time = self.inner.config.cache_time;
        let mut entries = self.inner.lock();
        let before = entries.len();
        entries.retain(|_, e| !e.is_collectable(default_cache_time, now));
        before - entries.len()
    }

    pub fn query_state(&self, key: &QueryKey) -> Option<QueryState> {
        self.inner.lock().get(key).map(|e| QueryState {
            has_data: e.data.is_some(),
            error: e.error.clone(),
            updated_at: e.updated_at,
            is_invalidated: e.invalidated,
            is_fetching: e.fetch.is_some(),
            observers: e.observers,
        })
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.inner.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Number of fetches currently running.
    pub fn is_fetching(&self) -> usize {
        self.inner.lock().values().filter(|e| e.fetch.is_some()).count()
    }

    /// Receives the key of every entry whose data, error or staleness changed.
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.inner.updates.subscribe()
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("config", &self.inner.config)
            .field("entries", &self.len())
            .finish()
    }
}
