//! HTTP route handlers.

pub mod enquiry;
pub mod health;
pub mod product;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::query::types::Page;

/// Parse a path identifier, mapping malformed input to a 400 rather than
/// the extractor's default rejection.
pub(crate) fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidIdentifier)
}

/// Pagination metadata returned with every list response.
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    /// Current page number (1-indexed).
    pub current: u32,
    /// Total number of pages.
    pub pages: u32,
    /// Total matching records, ignoring pagination.
    pub total: u64,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
    #[serde(rename = "hasPrev")]
    pub has_prev: bool,
}

impl<T> From<&Page<T>> for PaginationMeta {
    fn from(page: &Page<T>) -> Self {
        Self {
            current: page.page,
            pages: page.pages,
            total: page.total,
            has_next: page.has_next,
            has_prev: page.has_prev,
        }
    }
}
