//! Client-side data layer for Leadbook.
//!
//! - [`QueryClient`]: keyed cache of server reads with staleness, request
//!   deduplication, retry, prefix invalidation and idle eviction
//! - [`QueryObserver`] / [`PaginatedQuery`]: typed views a screen holds
//!   while it shows a query
//! - [`Mutation`]: writes that notify the user and invalidate affected reads
//! - [`FilterState`]: filter and paging state of a list screen
//! - [`Debouncer`]: settles fast-changing input such as a search box

mod client;
mod debounce;
mod filters;
pub mod key;
mod mutation;
mod notifier;
mod observer;
mod options;

pub use client::{QueryClient, QueryState};
pub use debounce::{DEFAULT_DEBOUNCE, DebounceInput, Debouncer};
pub use filters::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, FilterState, ListParams};
pub use key::QueryKey;
pub use mutation::{FALLBACK_ERROR_MESSAGE, Mutation, MutationOptions};
pub use notifier::{LogNotifier, MemoryNotifier, Notification, Notifier};
pub use observer::{PaginatedQuery, QueryObserver, QueryResult, paginated_key};
pub use options::{QueryClientConfig, QueryOptions, RetryPolicy};
