//! Write operations with notifications and cache invalidation.

use crate::client::QueryClient;
use crate::key::QueryKey;
use crate::notifier::Notifier;
use futures::FutureExt;
use futures::future::BoxFuture;
use leadbook_api::{ApiError, ApiResult};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::error;

/// Shown when neither the caller nor the server supplied a message.
pub const FALLBACK_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

type SuccessHook<V, T> = Arc<dyn Fn(&T, &V) + Send + Sync>;
type ErrorHook<V> = Arc<dyn Fn(&ApiError, &V) + Send + Sync>;
type SettledHook<V, T> = Arc<dyn Fn(Option<&T>, Option<&ApiError>, &V) + Send + Sync>;
type MutationFn<V, T> = Arc<dyn Fn(V) -> BoxFuture<'static, ApiResult<T>> + Send + Sync>;

/// How a [`Mutation`] reports and what it invalidates.
pub struct MutationOptions<V, T> {
    pub success_message: Option<String>,
    /// Replaces the server's message in the error notification.
    pub error_message: Option<String>,
    /// Key prefixes marked stale after a success.
    pub invalidate_queries: Vec<QueryKey>,
    pub show_success_toast: bool,
    pub show_error_toast: bool,
    on_success: Option<SuccessHook<V, T>>,
    on_error: Option<ErrorHook<V>>,
    on_settled: Option<SettledHook<V, T>>,
}

impl<V, T> Default for MutationOptions<V, T> {
    fn default() -> Self {
        Self {
            success_message: None,
            error_message: None,
            invalidate_queries: Vec::new(),
            show_success_toast: true,
            show_error_toast: true,
            on_success: None,
            on_error: None,
            on_settled: None,
        }
    }
}

impl<V, T> MutationOptions<V, T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn invalidate(mut self, prefix: QueryKey) -> Self {
        self.invalidate_queries.push(prefix);
        self
    }

    #[must_use]
    pub fn show_success_toast(mut self, show: bool) -> Self {
        self.show_success_toast = show;
        self
    }

    #[must_use]
    pub fn show_error_toast(mut self, show: bool) -> Self {
        self.show_error_toast = show;
        self
    }

    /// Runs after invalidation, with the result and the variables.
    #[must_use]
    pub fn on_success(mut self, f: impl Fn(&T, &V) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&ApiError, &V) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Runs last, after either outcome.
    #[must_use]
    pub fn on_settled(
        mut self,
        f: impl Fn(Option<&T>, Option<&ApiError>, &V) + Send + Sync + 'static,
    ) -> Self {
        self.on_settled = Some(Arc::new(f));
        self
    }
}

impl<V, T> fmt::Debug for MutationOptions<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationOptions")
            .field("success_message", &self.success_message)
            .field("error_message", &self.error_message)
            .field("invalidate_queries", &self.invalidate_queries)
            .field("show_success_toast", &self.show_success_toast)
            .field("show_error_toast", &self.show_error_toast)
            .finish_non_exhaustive()
    }
}

/// Decrements the in-flight counter even if the mutation future is dropped.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A reusable write operation.
///
/// Per call, exactly one of `on_success` / `on_error` runs, then
/// `on_settled`. On success the configured prefixes are invalidated before
/// `on_success` sees the result.
pub struct Mutation<V, T> {
    client: QueryClient,
    notifier: Arc<dyn Notifier>,
    run: MutationFn<V, T>,
    options: MutationOptions<V, T>,
    in_flight: AtomicUsize,
}

impl<V, T> Mutation<V, T>
where
    V: Clone + Send + 'static,
    T: Send + 'static,
{
    pub fn new<F, Fut>(
        client: &QueryClient,
        notifier: Arc<dyn Notifier>,
        f: F,
        options: MutationOptions<V, T>,
    ) -> Self
    where
        F: Fn(V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        Self {
            client: client.clone(),
            notifier,
            run: Arc::new(move |vars| f(vars).boxed()),
            options,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub async fn mutate(&self, vars: V) -> ApiResult<T> {
        let _guard = InFlightGuard::enter(&self.in_flight);
        let result = (self.run)(vars.clone()).await;

        match &result {
            Ok(data) => {
                if self.options.show_success_toast {
                    if let Some(message) = &self.options.success_message {
                        self.notifier.success(message);
                    }
                }
                for prefix in &self.options.invalidate_queries {
                    self.client.invalidate_queries(prefix);
                }
                if let Some(hook) = &self.options.on_success {
                    hook(data, &vars);
                }
            }
            Err(err) => {
                error!("mutation failed: {err}");
                if self.options.show_error_toast {
                    self.notifier.error(&self.error_message(err));
                }
                if let Some(hook) = &self.options.on_error {
                    hook(err, &vars);
                }
            }
        }

        if let Some(hook) = &self.options.on_settled {
            hook(result.as_ref().ok(), result.as_ref().err(), &vars);
        }
        result
    }

    /// The message shown for `err`: the configured override, else the
    /// server's message, else [`FALLBACK_ERROR_MESSAGE`].
    pub fn error_message(&self, err: &ApiError) -> String {
        self.options
            .error_message
            .clone()
            .or_else(|| err.payload_message().map(str::to_string))
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
    }

    /// True while at least one call is running.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn options(&self) -> &MutationOptions<V, T> {
        &self.options
    }
}

impl<V, T> fmt::Debug for Mutation<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("options", &self.options)
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .finish()
    }
}
