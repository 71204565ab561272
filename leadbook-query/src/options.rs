//! Query configuration.

use leadbook_api::ApiError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Client-wide defaults. Per-query [`QueryOptions`] start from these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryClientConfig {
    /// How long fetched data counts as fresh.
    pub stale_time: Duration,
    /// How long an unobserved entry is kept before eviction.
    pub cache_time: Duration,
    /// Extra attempts after a failed fetch.
    pub retry: u32,
    /// Delay before the first retry; doubles per attempt.
    pub retry_delay: Duration,
    /// Upper bound for the retry delay.
    pub max_retry_delay: Duration,
    /// Freshness applied by [`QueryClient::prefetch_query`](crate::QueryClient::prefetch_query).
    pub prefetch_stale_time: Duration,
}

impl Default for QueryClientConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            cache_time: Duration::from_secs(5 * 60),
            retry: 1,
            retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(30),
            prefetch_stale_time: Duration::from_secs(10 * 60),
        }
    }
}

/// Retry policy of a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub const NONE: RetryPolicy = RetryPolicy {
        retries: 0,
        delay: Duration::ZERO,
        max_delay: Duration::ZERO,
    };

    /// Delay before retry number `attempt` (zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.delay.saturating_mul(factor).min(self.max_delay)
    }
}

pub(crate) type SuccessCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;
pub(crate) type ErrorCallback = Arc<dyn Fn(&ApiError) + Send + Sync>;

/// Per-query behaviour.
pub struct QueryOptions<T> {
    /// A disabled query never fetches and never reports loading.
    pub enabled: bool,
    pub stale_time: Duration,
    pub cache_time: Duration,
    pub retry: u32,
    pub retry_delay: Duration,
    /// Upper bound for the doubling retry delay.
    pub max_retry_delay: Duration,
    /// Refetch stale data when the window regains focus.
    pub refetch_on_focus: bool,
    /// Keep showing the previous key's data while a new key loads.
    pub keep_previous_data: bool,
    pub(crate) on_success: Option<SuccessCallback<T>>,
    pub(crate) on_error: Option<ErrorCallback>,
}

impl<T> QueryOptions<T> {
    /// Options seeded from the client defaults.
    pub fn from_config(config: &QueryClientConfig) -> Self {
        Self {
            stale_time: config.stale_time,
            cache_time: config.cache_time,
            retry: config.retry,
            retry_delay: config.retry_delay,
            max_retry_delay: config.max_retry_delay,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    #[must_use]
    pub fn cache_time(mut self, cache_time: Duration) -> Self {
        self.cache_time = cache_time;
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    #[must_use]
    pub fn max_retry_delay(mut self, max_retry_delay: Duration) -> Self {
        self.max_retry_delay = max_retry_delay;
        self
    }

    #[must_use]
    pub fn refetch_on_focus(mut self, refetch: bool) -> Self {
        self.refetch_on_focus = refetch;
        self
    }

    #[must_use]
    pub fn keep_previous_data(mut self, keep: bool) -> Self {
        self.keep_previous_data = keep;
        self
    }

    /// Runs after every successful fetch this query triggers or joins.
    #[must_use]
    pub fn on_success(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(f));
        self
    }

    /// Runs after every failed fetch this query triggers or joins.
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&ApiError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retry,
            delay: self.retry_delay,
            max_delay: self.max_retry_delay,
        }
    }
}

impl<T> Default for QueryOptions<T> {
    fn default() -> Self {
        let config = QueryClientConfig::default();
        Self {
            enabled: true,
            stale_time: config.stale_time,
            cache_time: config.cache_time,
            retry: config.retry,
            retry_delay: config.retry_delay,
            max_retry_delay: config.max_retry_delay,
            refetch_on_focus: false,
            keep_previous_data: false,
            on_success: None,
            on_error: None,
        }
    }
}

impl<T> Clone for QueryOptions<T> {
    fn clone(&self) -> Self {
        Self {
            enabled: self.enabled,
            stale_time: self.stale_time,
            cache_time: self.cache_time,
            retry: self.retry,
            retry_delay: self.retry_delay,
            max_retry_delay: self.max_retry_delay,
            refetch_on_focus: self.refetch_on_focus,
            keep_previous_data: self.keep_previous_data,
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<T> fmt::Debug for QueryOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("enabled", &self.enabled)
            .field("stale_time", &self.stale_time)
            .field("cache_time", &self.cache_time)
            .field("retry", &self.retry)
            .field("refetch_on_focus", &self.refetch_on_focus)
            .field("keep_previous_data", &self.keep_previous_data)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
