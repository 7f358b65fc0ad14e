use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use super::error::FilterError;

/// Raw `pageNumber` / `pageSize` query parameters, both optional
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageQuery {
    pub fn to_request(self) -> Result<PageRequest, FilterError> {
        PageRequest::from_query(self.page_number, self.page_size)
    }
}

/// Validated 1-based page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_number: i64,
    page_size: i64,
}

impl PageRequest {
    /// Both values must be at least 1. Page sizes above the configured
    /// maximum are capped rather than rejected.
    pub fn new(page_number: i64, page_size: i64) -> Result<Self, FilterError> {
        let max = crate::config::CONFIG.pagination.max_page_size;
        Self::with_max(page_number, page_size, max)
    }

    /// Defaults: first page, configured default size.
    pub fn from_query(page_number: Option<i64>, page_size: Option<i64>) -> Result<Self, FilterError> {
        let pagination = &crate::config::CONFIG.pagination;
        Self::new(
            page_number.unwrap_or(1),
            page_size.unwrap_or(pagination.default_page_size),
        )
    }

    pub(crate) fn with_max(page_number: i64, page_size: i64, max_page_size: i64) -> Result<Self, FilterError> {
        if page_number < 1 {
            return Err(FilterError::InvalidPageNumber(format!(
                "pageNumber must be at least 1, got {}",
                page_number
            )));
        }
        if page_size < 1 {
            return Err(FilterError::InvalidPageSize(format!(
                "pageSize must be at least 1, got {}",
                page_size
            )));
        }

        let page_size = if page_size > max_page_size {
            tracing::warn!("Page size {} exceeds max {}, capping to max", page_size, max_page_size);
            max_page_size
        } else {
            page_size
        };

        let request = Self { page_number, page_size };
        request.checked_offset()?;
        Ok(request)
    }

    pub fn page_number(&self) -> i64 {
        self.page_number
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        // Checked at construction
        (self.page_number - 1) * self.page_size
    }

    fn checked_offset(&self) -> Result<i64, FilterError> {
        (self.page_number - 1)
            .checked_mul(self.page_size)
            .ok_or(FilterError::OffsetOverflow {
                page_number: self.page_number,
                page_size: self.page_size,
            })
    }
}

/// One page of rows plus the total number of rows matching the same filter
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total_count: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            rows: self.rows.into_iter().map(f).collect(),
            total_count: self.total_count,
        }
    }

    pub fn into_response(self, request: &PageRequest, list_key: &'static str) -> PagedResponse<T> {
        PagedResponse {
            total_count: self.total_count,
            page_number: request.page_number(),
            page_size: request.page_size(),
            list_key,
            items: self.rows,
        }
    }
}

/// Paging envelope: `{ TotalCount, PageNumber, PageSize, <list_key>: [...] }`
#[derive(Debug, Clone)]
pub struct PagedResponse<T> {
    pub total_count: i64,
    pub page_number: i64,
    pub page_size: i64,
    pub list_key: &'static str,
    pub items: Vec<T>,
}

impl<T: Serialize> Serialize for PagedResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("TotalCount", &self.total_count)?;
        map.serialize_entry("PageNumber", &self.page_number)?;
        map.serialize_entry("PageSize", &self.page_size)?;
        map.serialize_entry(self.list_key, &self.items)?;
        map.end()
    }
}
