//! Paginated list results.

use serde::{Deserialize, Serialize};

/// Page metadata as the backend reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Builds metadata for `total_items` split into pages of `items_per_page`.
    #[must_use]
    pub fn compute(current_page: u32, items_per_page: u32, total_items: u64) -> Self {
        let per_page = u64::from(items_per_page.max(1));
        let total_pages = u32::try_from(total_items.div_ceil(per_page)).unwrap_or(u32::MAX);
        let current_page = current_page.max(1);
        Self {
            current_page,
            total_pages,
            total_items,
            items_per_page,
            has_next: current_page < total_pages,
            has_prev: current_page > 1,
        }
    }

    /// Whether the current page starts inside the result set.
    ///
    /// Always true for an empty result set.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        if self.total_items == 0 {
            return true;
        }
        let offset = u64::from(self.items_per_page) * u64::from(self.current_page.saturating_sub(1));
        self.current_page >= 1 && offset < self.total_items
    }
}

/// One page of a list endpoint: `{ data: [...], pagination: {...} }` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(rename = "data", default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::default(),
        }
    }
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self { items, pagination }
    }

    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.pagination.current_page
    }

    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.pagination.total_pages
    }

    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.pagination.total_items
    }

    #[must_use]
    pub fn items_per_page(&self) -> u32 {
        self.pagination.items_per_page
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.pagination.is_consistent()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
