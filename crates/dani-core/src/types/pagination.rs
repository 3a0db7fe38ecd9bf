//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u64 = 50;
/// Hard ceiling on page size; larger requests are clamped, never rejected.
pub const MAX_PAGE_SIZE: u64 = 1000;
/// Highest page number kept; larger pages are clamped so `offset()` always
/// fits a signed 64-bit SQL `OFFSET`.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

/// Sanitized pagination parameters.
///
/// Both fields are always within range once constructed:
/// `1 <= page <= MAX_PAGE` and `1 <= limit <= MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub limit: u64,
}

impl PageRequest {
    /// Create a new page request, clamping both values into range.
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.clamp(1, MAX_PAGE),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Build a page request from raw, untrusted caller input.
    ///
    /// Missing or non-positive pages become page 1; a missing or
    /// non-positive limit becomes `default_limit`.
    pub fn from_raw(page: Option<i64>, limit: Option<i64>, default_limit: u64) -> Self {
        let page = page.filter(|p| *p >= 1).map(|p| p as u64).unwrap_or(1);
        let limit = limit
            .filter(|l| *l >= 1)
            .map(|l| l as u64)
            .unwrap_or(default_limit);
        Self::new(page, limit)
    }

    /// Calculate the SQL `OFFSET` value.
    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1)).saturating_mul(self.limit)
    }

    /// The `OFFSET` as the signed value Postgres binds; never negative.
    pub fn sql_offset(&self) -> i64 {
        i64::try_from(self.offset()).unwrap_or(i64::MAX)
    }

    /// Return the SQL `LIMIT` value.
    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T: Serialize> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// Current page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub limit: u64,
    /// Total number of pages, `ceil(total / limit)`.
    pub total_pages: u64,
    /// Whether there is a next page.
    pub has_next: bool,
    /// Whether there is a previous page.
    pub has_previous: bool,
}

impl<T: Serialize> PageResponse<T> {
    /// Create a new paginated response.
    pub fn new(items: Vec<T>, page: &PageRequest, total: u64) -> Self {
        let total_pages = total.div_ceil(page.limit);
        Self {
            items,
            total,
            page: page.page,
            limit: page.limit,
            total_pages,
            has_next: page.page < total_pages,
            has_previous: page.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let page = PageRequest::from_raw(Some(-5), Some(5000), DEFAULT_PAGE_SIZE);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, MAX_PAGE_SIZE);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_missing_limit_uses_default() {
        let page = PageRequest::from_raw(Some(3), None, 25);
        assert_eq!(page.limit, 25);
        assert_eq!(page.offset(), 50);

        let zero = PageRequest::from_raw(None, Some(0), 25);
        assert_eq!(zero.limit, 25);
    }

    #[test]
    fn test_huge_page_keeps_offset_non_negative() {
        let page = PageRequest::from_raw(Some(i64::MAX), Some(1000), DEFAULT_PAGE_SIZE);
        assert_eq!(page.page, MAX_PAGE);
        assert!(page.sql_offset() >= 0);
        assert_eq!(page.sql_offset() as u64, page.offset());

        let small = PageRequest::from_raw(Some(i64::MAX), Some(1), DEFAULT_PAGE_SIZE);
        assert!(small.sql_offset() >= 0);
        assert_eq!(small.offset(), MAX_PAGE - 1);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = PageRequest::new(1, 10);
        let response = PageResponse::new(vec![1, 2, 3], &page, 21);
        assert_eq!(response.total_pages, 3);
        assert!(response.has_next);
        assert!(!response.has_previous);
    }

    #[test]
    fn test_empty_result_has_zero_pages() {
        let response: PageResponse<u8> = PageResponse::new(Vec::new(), &PageRequest::default(), 0);
        assert_eq!(response.total, 0);
        assert_eq!(response.total_pages, 0);
        assert!(!response.has_next);
    }
}
