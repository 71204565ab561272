//! Filter and pagination state of a list screen.

use crate::key::QueryKey;
use leadbook_types::Filters;
use serde::Serialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Filters plus paging, as sent to a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListParams<F> {
    #[serde(flatten)]
    pub filters: F,
    pub page: u32,
    pub limit: u32,
}

/// Owns the filters, page and page size of one list screen.
///
/// Every filter change returns to page 1, and so does a page-size change.
/// [`revision`](Self::revision) and the derived [`query_key`](Self::query_key)
/// only change when some value actually changed.
#[derive(Debug, Clone)]
pub struct FilterState<F: Filters> {
    base: QueryKey,
    initial: F,
    filters: F,
    page: u32,
    limit: u32,
    revision: u64,
    key: QueryKey,
}

impl<F: Filters> FilterState<F> {
    /// State for the list under `base` (e.g. `["leads"]`), starting from
    /// `initial` filters on page 1 with 10 rows.
    pub fn new(base: QueryKey, initial: F) -> Self {
        let key = list_key(&base, &initial, DEFAULT_PAGE, DEFAULT_PAGE_SIZE);
        Self {
            base,
            filters: initial.clone(),
            initial,
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_SIZE,
            revision: 0,
            key,
        }
    }

    pub fn filters(&self) -> &F {
        &self.filters
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Bumped on every change of filters, page or limit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// `[..base, {filters, page, limit}]`.
    pub fn query_key(&self) -> &QueryKey {
        &self.key
    }

    pub fn params(&self) -> ListParams<F> {
        ListParams {
            filters: self.filters.clone(),
            page: self.page,
            limit: self.limit,
        }
    }

    /// Edits the filters in place.
    pub fn update_filter(&mut self, edit: impl FnOnce(&mut F)) {
        let mut filters = self.filters.clone();
        edit(&mut filters);
        self.apply(filters, DEFAULT_PAGE, self.limit);
    }

    /// Overlays every field set in `patch`.
    pub fn update_filters(&mut self, patch: F) {
        let mut filters = self.filters.clone();
        filters.merge(patch);
        self.apply(filters, DEFAULT_PAGE, self.limit);
    }

    /// Unsets one field by its snake_case name.
    pub fn clear_filter(&mut self, field: &str) {
        let mut filters = self.filters.clone();
        filters.clear(field);
        self.apply(filters, DEFAULT_PAGE, self.limit);
    }

    /// Back to the initial filters.
    pub fn clear_filters(&mut self) {
        self.apply(self.initial.clone(), DEFAULT_PAGE, self.limit);
    }

    /// Jumps to `page`, clamped to at least 1. The upper bound is the
    /// server's business.
    pub fn go_to_page(&mut self, page: i64) {
        let page = u32::try_from(page.max(1)).unwrap_or(u32::MAX);
        self.apply(self.filters.clone(), page, self.limit);
    }

    pub fn next_page(&mut self) {
        self.apply(self.filters.clone(), self.page.saturating_add(1), self.limit);
    }

    pub fn prev_page(&mut self) {
        self.apply(
            self.filters.clone(),
            self.page.saturating_sub(1).max(1),
            self.limit,
        );
    }

    /// Sets the page size (at least 1) and returns to page 1.
    pub fn change_limit(&mut self, limit: u32) {
        self.apply(self.filters.clone(), DEFAULT_PAGE, limit.max(1));
    }

    fn apply(&mut self, filters: F, page: u32, limit: u32) {
        if filters == self.filters && page == self.page && limit == self.limit {
            return;
        }
        self.filters = filters;
        self.page = page;
        self.limit = limit;
        self.revision += 1;
        self.key = list_key(&self.base, &self.filters, page, limit);
    }
}

fn list_key<F: Filters>(base: &QueryKey, filters: &F, page: u32, limit: u32) -> QueryKey {
    base.clone().with(&ListParams {
        filters: filters.clone(),
        page,
        limit,
    })
}
