//! Pagination shared by the listing operations.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// A validated page request (`page` is 1-based).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page_size: u32,
    offset: i64,
}

impl PageRequest {
    /// Both `page` and `page_size` must be at least 1.
    pub fn new(page: i64, page_size: i64) -> Result<Self, ServiceError> {
        if page < 1 || page_size < 1 {
            return Err(ServiceError::invalid_argument("invalid pagination"));
        }
        let page = u32::try_from(page).map_err(|_| ServiceError::invalid_argument("page too large"))?;
        let page_size = u32::try_from(page_size)
            .map_err(|_| ServiceError::invalid_argument("page size too large"))?;
        let offset = i64::from(page - 1)
            .checked_mul(i64::from(page_size))
            .ok_or_else(|| ServiceError::invalid_argument("page out of range"))?;
        Ok(Self { page_size, offset })
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Rows to skip. Never negative.
    pub fn offset(&self) -> i64 {
        self.offset
    }
}

/// One page of records plus the total number of records matching the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(records: Vec<T>, total: u64) -> Self {
        Self { records, total }
    }
}
