//! Pagination utilities for Magento list responses.

use serde::{Deserialize, Serialize};

/// Envelope returned by Magento list endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResults<T> {
    /// Items matching the criteria. Omitted by Magento when a `fields`
    /// projection filters everything out.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Total number of matching items across all pages.
    #[serde(default)]
    pub total_count: Option<u64>,
    /// The criteria echoed back by the server.
    #[serde(default)]
    pub search_criteria: Option<serde_json::Value>,
}

/// A page of results from the Magento API.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Total number of items across all pages (if known).
    pub total: Option<u64>,
    /// Current page number (1-indexed).
    pub page: u32,
    /// Number of items per page.
    pub count: u32,
    /// Whether there are more pages.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Create a new page from items and pagination info.
    #[must_use]
    pub fn new(items: Vec<T>, page: u32, count: u32, total: Option<u64>) -> Self {
        let has_more = match total {
            Some(t) => (u64::from(page) * u64::from(count)) < t,
            None => items.len() >= count as usize,
        };
        Self {
            items,
            total,
            page,
            count,
            has_more,
        }
    }

    /// Create a page from a Magento list envelope.
    #[must_use]
    pub fn from_results(results: SearchResults<T>, page: u32, count: u32) -> Self {
        Self::new(results.items, page, count, results.total_count)
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
