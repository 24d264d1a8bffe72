//! Page requests and result pages for list operations.

use crate::config::PaginationConfig;
use crate::errors::{Error, Result};
use serde::Serialize;

/// Largest row offset the store accepts.
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Caller-supplied paging parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number, defaults to 1
    pub page: Option<u64>,
    /// Items per page, defaults to the configured default
    pub limit: Option<u64>,
}

impl PageRequest {
    /// Requests a specific page and size.
    #[must_use]
    pub const fn new(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Resolves defaults and bounds into a [`PageWindow`].
    ///
    /// Page 0 and limit 0 are rejected; limits above the configured maximum are
    /// clamped to it. A page whose first row lies beyond the largest offset the
    /// store can address is rejected rather than wrapped.
    pub fn resolve(self, config: &PaginationConfig) -> Result<PageWindow> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(Error::invalid("Page must be at least 1"));
        }
        let limit = self.limit.unwrap_or(config.default_limit);
        if limit == 0 {
            return Err(Error::invalid("Limit must be at least 1"));
        }
        let limit = limit.min(config.max_limit);

        let offset = (page - 1)
            .checked_mul(limit)
            .filter(|offset| *offset <= MAX_OFFSET)
            .ok_or_else(|| Error::invalid(format!("Page {page} is out of range")))?;

        Ok(PageWindow {
            page,
            limit,
            offset,
        })
    }
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number
    pub page: u64,
    /// Items per page
    pub limit: u64,
    /// Rows skipped before this page
    pub offset: u64,
}

/// One page of results plus the totals needed to render a pager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u64,
    /// Page size that was applied
    pub limit: u64,
    /// Items across all pages
    pub total: u64,
    /// Number of pages
    pub pages: u64,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        Self {
            items,
            page,
            limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_resolve_defaults_and_clamps() {
        let config = PaginationConfig::default();
        assert_eq!(
            PageRequest::default().resolve(&config).unwrap(),
            PageWindow {
                page: 1,
                limit: 10,
                offset: 0
            }
        );
        assert_eq!(
            PageRequest::new(3, 500).resolve(&config).unwrap(),
            PageWindow {
                page: 3,
                limit: 100,
                offset: 200
            }
        );
        assert!(PageRequest::new(0, 10).resolve(&config).is_err());
        assert!(PageRequest::new(1, 0).resolve(&config).is_err());
    }

    #[test]
    fn test_resolve_rejects_unaddressable_pages() {
        let config = PaginationConfig::default();
        assert!(matches!(
            PageRequest::new(u64::MAX, 10).resolve(&config),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(PageRequest::new(u64::MAX / 10, 100).resolve(&config).is_err());

        let last = PageRequest::new(MAX_OFFSET / 10 + 1, 10).resolve(&config).unwrap();
        assert_eq!(last.offset, MAX_OFFSET / 10 * 10);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(Page::new(vec![1, 2], 1, 2, 5).pages, 3);
        assert_eq!(Page::<u8>::new(vec![], 1, 10, 0).pages, 0);
        assert_eq!(Page::new(vec![1], 1, 10, 10).pages, 1);
    }
}
