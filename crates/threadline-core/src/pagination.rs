//! Limit/offset pagination types.

use serde::{Deserialize, Serialize};

use crate::defaults::{PAGE_LIMIT, PAGE_OFFSET};
use crate::error::{Error, Result};

/// A validated limit/offset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    limit: i64,
    offset: i64,
}

impl PageRequest {
    /// Validate a window: `limit >= 1`, `offset >= 0`. There is no upper bound
    /// on `limit`; a page simply holds at most `limit` items.
    pub fn new(limit: i64, offset: i64) -> Result<Self> {
        if limit < 1 {
            return Err(Error::InvalidInput(format!(
                "limit must be at least 1, got {}",
                limit
            )));
        }
        if offset < 0 {
            return Err(Error::InvalidInput(format!(
                "offset must not be negative, got {}",
                offset
            )));
        }
        Ok(Self { limit, offset })
    }

    /// Build from optional query parameters, falling back to the defaults.
    pub fn from_query(limit: Option<i64>, offset: Option<i64>) -> Result<Self> {
        Self::new(limit.unwrap_or(PAGE_LIMIT), offset.unwrap_or(PAGE_OFFSET))
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Wrap a page of items fetched for this window.
    pub fn paginate<T>(&self, items: Vec<T>, total: i64) -> Page<T> {
        Page {
            limit: self.limit,
            offset: self.offset,
            total,
            items,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: PAGE_LIMIT,
            offset: PAGE_OFFSET,
        }
    }
}

/// One page of results plus the total matching count from the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub limit: i64,
    pub offset: i64,
    pub total: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Whether rows exist beyond this page.
    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as i64) < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window() {
        let page = PageRequest::default();
        assert_eq!(page.limit(), PAGE_LIMIT);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_from_query_uses_defaults() {
        let page = PageRequest::from_query(None, Some(20)).unwrap();
        assert_eq!(page.limit(), PAGE_LIMIT);
        assert_eq!(page.offset(), 20);
    }

    #[test]
    fn test_rejects_zero_limit() {
        let err = PageRequest::new(0, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_large_limit_is_accepted() {
        let page = PageRequest::new(150, 0).unwrap();
        assert_eq!(page.limit(), 150);
        assert!(PageRequest::new(i64::MAX, 0).is_ok());
    }

    #[test]
    fn test_rejects_negative_offset() {
        assert!(matches!(
            PageRequest::new(10, -1),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_paginate_carries_window_and_total() {
        let page = PageRequest::new(2, 0).unwrap().paginate(vec!["a", "b"], 3);
        assert_eq!(page.limit, 2);
        assert_eq!(page.offset, 0);
        assert_eq!(page.total, 3);
        assert_eq!(page.items, vec!["a", "b"]);
        assert!(page.has_more());
    }

    #[test]
    fn test_last_page_has_no_more() {
        let page = PageRequest::new(2, 2).unwrap().paginate(vec!["c"], 3);
        assert!(!page.has_more());
    }

    #[test]
    fn test_page_serializes_flat() {
        let page = PageRequest::new(5, 0).unwrap().paginate(vec![1, 2], 2);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["limit"], 5);
        assert_eq!(json["offset"], 0);
        assert_eq!(json["total"], 2);
        assert_eq!(json["items"], serde_json::json!([1, 2]));
    }
}
