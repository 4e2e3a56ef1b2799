//! Pagination envelopes for list queries.
//!
//! All list operations accept a [`PageRequest`] and return a [`Page`].
//! Page sizes are clamped to [`MAX_PAGE_SIZE`] so a single query can never
//! scan unbounded rows; page numbers are 1-based.

use serde::{Deserialize, Serialize};

/// Hard upper bound on page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default page size when none is requested.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A 1-based page request with a clamped page size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Items per page (clamped to [`MAX_PAGE_SIZE`]).
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a request, normalizing out-of-range values.
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }.normalized()
    }

    /// Clamp page size to `1..=MAX_PAGE_SIZE` and page to `>= 1`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// SQL `LIMIT` for this request.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.normalized().page_size)
    }

    /// SQL `OFFSET` for this request.
    #[must_use]
    pub fn offset(&self) -> i64 {
        let norm = self.normalized();
        i64::from(norm.page - 1) * i64::from(norm.page_size)
    }
}

/// One page of results plus navigation metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total matching items across all pages.
    pub total: i64,
    /// 1-based page number.
    pub page: u32,
    /// Effective (clamped) page size.
    pub page_size: u32,
    /// Whether a next page exists.
    pub has_next: bool,
    /// Whether a previous page exists.
    pub has_prev: bool,
}

impl<T> Page<T> {
    /// Assemble a page from query results and a total count.
    #[must_use]
    pub fn from_items(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        let req = request.normalized();
        let consumed = req.offset() + items.len() as i64;
        Self {
            items,
            total,
            page: req.page,
            page_size: req.page_size,
            has_next: consumed < total,
            has_prev: req.page > 1,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_request() {
        let req = PageRequest::default();
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn page_size_is_clamped() {
        let req = PageRequest::new(1, 10_000);
        assert_eq!(req.page_size, MAX_PAGE_SIZE);

        let req = PageRequest::new(1, 0);
        assert_eq!(req.page_size, 1);
    }

    #[test]
    fn page_zero_becomes_one() {
        let req = PageRequest::new(0, 10);
        assert_eq!(req.page, 1);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn limit_and_offset() {
        let req = PageRequest::new(3, 25);
        assert_eq!(req.limit(), 25);
        assert_eq!(req.offset(), 50);
    }

    #[test]
    fn page_navigation_flags() {
        let page = Page::from_items(vec![1, 2, 3], 10, PageRequest::new(1, 3));
        assert!(page.has_next);
        assert!(!page.has_prev);

        let page = Page::from_items(vec![7, 8, 9], 10, PageRequest::new(3, 3));
        assert!(page.has_next);
        assert!(page.has_prev);

        let page = Page::from_items(vec![10], 10, PageRequest::new(4, 3));
        assert!(!page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn empty_page() {
        let page = Page::<i32>::from_items(vec![], 0, PageRequest::default());
        assert_eq!(page.total, 0);
        assert!(!page.has_next);
        assert!(!page.has_prev);
    }
}
