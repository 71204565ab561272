//! Per-resource query and mutation bundles.
//!
//! A bundle is a cheap handle obtained from [`CrmContext`](crate::CrmContext).
//! Query methods return a [`QueryObserver`] the screen keeps while it shows
//! the data; mutation methods return a [`Mutation`] that notifies the user
//! and invalidates the affected keys.

mod clients;
mod dashboard;
mod leads;
mod profile;
mod teams;
mod users;

pub use clients::Clients;
pub use dashboard::Dashboard;
pub use leads::{LeadSearch, Leads};
pub use profile::Profile;
pub use teams::Teams;
pub use users::Users;

use leadbook_api::ApiResult;
use leadbook_query::{
    Mutation, MutationOptions, Notifier, QueryClient, QueryKey, QueryObserver, QueryOptions,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Stale time of single records and stats.
pub(crate) const RECORD_STALE_TIME: Duration = Duration::from_secs(5 * 60);
/// Stale time of lists and searches.
pub(crate) const LIST_STALE_TIME: Duration = Duration::from_secs(30);
/// Cache time of stats.
pub(crate) const STATS_CACHE_TIME: Duration = Duration::from_secs(10 * 60);

/// What every bundle shares: the cache and the notifier.
#[derive(Clone)]
pub(crate) struct Binding {
    queries: QueryClient,
    notifier: Arc<dyn Notifier>,
}

impl Binding {
    pub(crate) fn new(queries: QueryClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { queries, notifier }
    }

    pub(crate) fn queries(&self) -> &QueryClient {
        &self.queries
    }

    /// Options seeded from the client defaults.
    pub(crate) fn options<T>(&self) -> QueryOptions<T> {
        QueryOptions::from_config(self.queries.config())
    }

    pub(crate) fn observe<T, F, Fut>(
        &self,
        key: QueryKey,
        fetcher: F,
        options: QueryOptions<T>,
    ) -> QueryObserver<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        QueryObserver::new(&self.queries, key, fetcher, options)
    }

    pub(crate) fn mutation<V, T, F, Fut>(
        &self,
        f: F,
        options: MutationOptions<V, T>,
    ) -> Mutation<V, T>
    where
        V: Clone + Send + 'static,
        T: Send + 'static,
        F: Fn(V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        Mutation::new(&self.queries, Arc::clone(&self.notifier), f, options)
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("queries", &self.queries)
            .finish_non_exhaustive()
    }
}
