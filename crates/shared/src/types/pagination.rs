//! Limit/offset pagination for list endpoints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw pagination parameters as supplied by a caller.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum number of items to return.
    pub limit: Option<u64>,
    /// Number of items to skip.
    pub offset: Option<u64>,
}

/// Largest offset a store can bind; SQL `OFFSET` is a signed 64-bit value.
pub const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Rejected pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// Limit outside `1..=max`.
    #[error("limit must be between 1 and {max}, got {limit}")]
    LimitOutOfRange {
        /// Requested limit.
        limit: u64,
        /// Largest allowed limit.
        max: u64,
    },

    /// Offset beyond what the store can address.
    #[error("offset must be at most {max}, got {offset}")]
    OffsetTooLarge {
        /// Requested offset.
        offset: u64,
        /// Largest allowed offset.
        max: u64,
    },
}

/// Validated pagination bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    /// Maximum number of items to return.
    pub limit: u64,
    /// Number of items to skip.
    pub offset: u64,
}

impl PageRequest {
    /// Creates a request with explicit bounds.
    #[must_use]
    pub const fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self { limit, offset }
    }

    /// Applies defaults and validates the limit against `1..=max_limit`.
    ///
    /// # Errors
    ///
    /// Returns `PaginationError` when the requested limit is out of range or
    /// the offset exceeds [`MAX_OFFSET`].
    pub fn resolve(self, default_limit: u64, max_limit: u64) -> Result<PageBounds, PaginationError> {
        let limit = self.limit.unwrap_or(default_limit);
        if limit == 0 || limit > max_limit {
            return Err(PaginationError::LimitOutOfRange {
                limit,
                max: max_limit,
            });
        }
        let offset = self.offset.unwrap_or(0);
        if offset > MAX_OFFSET {
            return Err(PaginationError::OffsetTooLarge {
                offset,
                max: MAX_OFFSET,
            });
        }
        Ok(PageBounds { limit, offset })
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items in the current page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// Limit used for this page.
    pub limit: u64,
    /// Offset used for this page.
    pub offset: u64,
}

impl<T> Page<T> {
    /// Creates a page from its items and bounds.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, bounds: PageBounds) -> Self {
        Self {
            items,
            total,
            limit: bounds.limit,
            offset: bounds.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let bounds = PageRequest::default().resolve(20, 100).unwrap();
        assert_eq!(bounds, PageBounds { limit: 20, offset: 0 });
    }

    #[test]
    fn test_explicit_bounds() {
        let bounds = PageRequest::new(Some(100), Some(40)).resolve(20, 100).unwrap();
        assert_eq!(bounds, PageBounds { limit: 100, offset: 40 });
    }

    #[test]
    fn test_limit_out_of_range() {
        assert!(PageRequest::new(Some(0), None).resolve(20, 100).is_err());
        let err = PageRequest::new(Some(101), None).resolve(20, 100).unwrap_err();
        assert_eq!(err.to_string(), "limit must be between 1 and 100, got 101");
    }

    #[test]
    fn test_offset_beyond_signed_range() {
        let bounds = PageRequest::new(None, Some(MAX_OFFSET)).resolve(20, 100).unwrap();
        assert_eq!(bounds.offset, MAX_OFFSET);

        let err = PageRequest::new(None, Some(u64::MAX)).resolve(20, 100).unwrap_err();
        assert!(matches!(err, PaginationError::OffsetTooLarge { offset: u64::MAX, .. }));
        assert_eq!(
            err.to_string(),
            format!("offset must be at most {}, got {}", i64::MAX, u64::MAX)
        );
    }
}
