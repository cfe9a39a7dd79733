//! Page arithmetic and paginated collections

use serde::{Deserialize, Serialize};

/// Number of records preceding `page` (1-based)
///
/// Page `0` is treated like page `1`.
#[inline]
#[must_use]
pub fn offset(page: usize, per_page: usize) -> usize {
    page.saturating_sub(1).saturating_mul(per_page)
}

/// One page of records plus paging metadata
///
/// `total_count` is the size of the whole collection, not of `records`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedCollection<T> {
    /// Records on this page
    pub records: Vec<T>,
    /// 1-based page number
    pub page: usize,
    /// Requested page size
    pub per_page: usize,
    /// Size of the full, unfiltered collection
    pub total_count: usize,
}

impl<T> PaginatedCollection<T> {
    /// Create collection
    #[inline]
    #[must_use]
    pub fn new(records: Vec<T>, page: usize, per_page: usize, total_count: usize) -> Self {
        Self {
            records,
            page,
            per_page,
            total_count,
        }
    }

    /// Check if there are records after this page
    #[inline]
    #[must_use]
    pub fn has_next(&self) -> bool {
        offset(self.page, self.per_page) + self.records.len() < self.total_count
    }
}
