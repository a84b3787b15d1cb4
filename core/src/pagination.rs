//! Paging parameters and paged results.
//!
//! Pagination only travels as request input and in the response payload of
//! paged request slots; the reactive core never inspects it.

use serde::{Deserialize, Serialize};

/// Request for one page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Zero-based page index
    pub page: u32,
    /// Page size
    pub size: u32,
    /// Sort keys, e.g. `"price,asc"`
    pub sort: Vec<String>,
}

impl Pagination {
    /// First page of `size` items, unsorted.
    #[must_use]
    pub const fn first(size: u32) -> Self {
        Self {
            page: 0,
            size,
            sort: Vec::new(),
        }
    }

    /// The following page with the same size and sort.
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
            sort: self.sort.clone(),
        }
    }

    /// Add a sort key.
    #[must_use]
    pub fn sorted_by(mut self, key: impl Into<String>) -> Self {
        self.sort.push(key.into());
        self
    }

    /// Query parameters in request order: `page`, `size`, then one `sort`
    /// entry per key.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        pairs.extend(self.sort.iter().map(|key| ("sort", key.clone())));
        pairs
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    pub content: Vec<T>,
    /// Zero-based page index
    pub number: u32,
    /// Requested page size
    pub size: u32,
    /// Total items across all pages
    pub total_elements: u64,
    /// Total number of pages
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Whether this is the first page.
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.number == 0
    }

    /// Whether this is the last page.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.number.saturating_add(1) >= self.total_pages
    }

    /// Whether the page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
