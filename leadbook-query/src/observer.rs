//! Typed views onto cache entries.

use crate::client::{ErasedFetcher, QueryClient, downcast, erase};
use crate::key::QueryKey;
use crate::options::QueryOptions;
use futures::FutureExt;
use futures::future::BoxFuture;
use leadbook_api::{ApiError, ApiResult};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

/// What a screen renders for one query.
pub struct QueryResult<T> {
    pub data: Option<Arc<T>>,
    pub error: Option<ApiError>,
    /// No data to show yet and a fetch is pending or about to start.
    pub is_loading: bool,
    /// A fetch for this key is running, initial or background.
    pub is_fetching: bool,
    /// `data` belongs to the previous key (keep-previous-data).
    pub is_previous_data: bool,
    pub is_stale: bool,
    pub updated_at: Option<Instant>,
}

impl<T> QueryResult<T> {
    pub fn data(&self) -> Option<&T> {
        self.data.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.data.is_some() && self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl<T> Clone for QueryResult<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            is_loading: self.is_loading,
            is_fetching: self.is_fetching,
            is_previous_data: self.is_previous_data,
            is_stale: self.is_stale,
            updated_at: self.updated_at,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for QueryResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResult")
            .field("data", &self.data)
            .field("error", &self.error)
            .field("is_loading", &self.is_loading)
            .field("is_fetching", &self.is_fetching)
            .field("is_previous_data", &self.is_previous_data)
            .field("is_stale", &self.is_stale)
            .finish()
    }
}

/// One mounted query.
///
/// Registers as an observer of its key for as long as it lives; dropping it
/// starts the entry's cache-time countdown.
pub struct QueryObserver<T> {
    client: QueryClient,
    key: QueryKey,
    fetcher: ErasedFetcher,
    options: QueryOptions<T>,
    previous: Option<Arc<T>>,
}

impl<T: Send + Sync + 'static> QueryObserver<T> {
    pub fn new<F, Fut>(
        client: &QueryClient,
        key: QueryKey,
        fetcher: F,
        options: QueryOptions<T>,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        client.inner.observe(&key, options.cache_time);
        Self {
            client: client.clone(),
            key,
            fetcher: erase(fetcher),
            options,
            previous: None,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn options(&self) -> &QueryOptions<T> {
        &self.options
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    /// Current state without fetching.
    pub fn result(&self) -> QueryResult<T> {
        let snapshot = self.client.inner.snapshot(&self.key);
        let (data, error, updated_at, invalidated, is_fetching) = match snapshot {
            Some(s) => (
                s.data.and_then(|d| downcast::<T>(d, &self.key)),
                s.error,
                s.updated_at,
                s.invalidated,
                s.is_fetching,
            ),
            None => (None, None, None, false, false),
        };

        let is_stale = match updated_at {
            Some(at) => invalidated || Instant::now().duration_since(at) >= self.options.stale_time,
            None => true,
        };

        let (data, is_previous_data) = match data {
            Some(data) => (Some(data), false),
            None if self.options.keep_previous_data && self.previous.is_some() => {
                (self.previous.clone(), true)
            }
            None => (None, false),
        };

        let is_loading =
            self.options.enabled && data.is_none() && (is_fetching || error.is_none());

        QueryResult {
            data,
            error,
            is_loading,
            is_fetching,
            is_previous_data,
            is_stale,
            updated_at,
        }
    }

    /// Passive trigger (mount, re-render): fetches unless disabled or the
    /// cached data is still fresh.
    pub async fn load(&mut self) -> QueryResult<T> {
        if !self.options.enabled {
            return self.result();
        }
        if self.client.inner.is_fresh(&self.key, self.options.stale_time) {
            debug!("{} is fresh, not fetching", self.key);
            return self.result();
        }
        self.run().await
    }

    /// Fetches regardless of freshness. A disabled query stays idle.
    pub async fn refetch(&mut self) -> QueryResult<T> {
        if !self.options.enabled {
            return self.result();
        }
        self.run().await
    }

    /// Window focus regained.
    pub async fn on_focus(&mut self) -> QueryResult<T> {
        if self.options.refetch_on_focus {
            self.load().await
        } else {
            self.result()
        }
    }

    /// Points the observer at another key, e.g. after a filter or page
    /// change. Does not fetch; call [`load`](Self::load) afterwards.
    pub fn set_query<F, Fut>(&mut self, key: QueryKey, fetcher: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        self.fetcher = erase(fetcher);
        if key == self.key {
            return;
        }

        self.previous = if self.options.keep_previous_data {
            self.result().data
        } else {
            None
        };

        self.client.inner.unobserve(&self.key);
        self.client.inner.observe(&key, self.options.cache_time);
        self.key = key;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.options.enabled = enabled;
    }

    async fn run(&mut self) -> QueryResult<T> {
        let handle = self.client.inner.fetch_handle(
            &self.key,
            self.fetcher.clone(),
            self.options.retry_policy(),
        );
        let outcome = match handle.await {
            Ok(data) => {
                self.previous = None;
                let data = downcast::<T>(data, &self.key);
                if let (Some(callback), Some(data)) = (&self.options.on_success, &data) {
                    callback(data);
                }
                Ok(data)
            }
            Err(e) => {
                if let Some(callback) = &self.options.on_error {
                    callback(&e);
                }
                Err(e)
            }
        };

        let mut result = self.result();
        if !self.client.contains(&self.key) {
            // Removed mid-fetch: report this fetch's own outcome.
            match outcome {
                Ok(data) => result.data = data,
                Err(e) => result.error = Some(e),
            }
            result.is_loading = false;
        }
        result
    }
}

impl<T> Drop for QueryObserver<T> {
    fn drop(&mut self) {
        self.client.inner.unobserve(&self.key);
    }
}

impl<T> fmt::Debug for QueryObserver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryObserver")
            .field("key", &self.key)
            .field("options", &self.options)
            .finish()
    }
}

type PageFetcher<T> = Arc<dyn Fn(u32, u32) -> BoxFuture<'static, ApiResult<T>> + Send + Sync>;

/// A query over one page of a list, keyed `[..base, "paginated", page, limit]`.
///
/// Keeps the previous page visible while the next one loads.
pub struct PaginatedQuery<T> {
    base: QueryKey,
    page: u32,
    limit: u32,
    fetch: PageFetcher<T>,
    observer: QueryObserver<T>,
}

/// The cache key of one page.
pub fn paginated_key(base: &QueryKey, page: u32, limit: u32) -> QueryKey {
    base.clone().with("paginated").with(&page).with(&limit)
}

impl<T: Send + Sync + 'static> PaginatedQuery<T> {
    pub fn new<F, Fut>(
        client: &QueryClient,
        base: QueryKey,
        page: u32,
        limit: u32,
        fetch: F,
        options: QueryOptions<T>,
    ) -> Self
    where
        F: Fn(u32, u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let fetch: PageFetcher<T> = Arc::new(move |page, limit| fetch(page, limit).boxed());
        let page_fetch = Arc::clone(&fetch);
        let observer = QueryObserver::new(
            client,
            paginated_key(&base, page, limit),
            move || page_fetch(page, limit),
            options.keep_previous_data(true),
        );
        Self {
            base,
            page,
            limit,
            fetch,
            observer,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Switches to another page or page size. Call [`load`](Self::load)
    /// afterwards.
    pub fn set_page(&mut self, page: u32, limit: u32) {
        self.page = page;
        self.limit = limit;
        let fetch = Arc::clone(&self.fetch);
        self.observer.set_query(
            paginated_key(&self.base, page, limit),
            move || fetch(page, limit),
        );
    }

    pub async fn load(&mut self) -> QueryResult<T> {
        self.observer.load().await
    }

    pub async fn refetch(&mut self) -> QueryResult<T> {
        self.observer.refetch().await
    }

    pub fn result(&self) -> QueryResult<T> {
        self.observer.result()
    }

    pub fn observer(&self) -> &QueryObserver<T> {
        &self.observer
    }
}
