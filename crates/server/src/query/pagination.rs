//! Pagination engine.
//!
//! Parses page/limit parameters strictly: non-numeric or non-positive input
//! is rejected rather than silently coerced, and the page size is capped.

use super::QueryError;
use super::types::PageWindow;

/// Page number used when the parameter is absent.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the parameter is absent.
pub const DEFAULT_LIMIT: u32 = 10;

/// Hard cap on items per page.
pub const MAX_LIMIT: u32 = 100;

impl PageWindow {
    /// Resolve raw page/limit parameters into a bounded window.
    ///
    /// Absent parameters take the defaults. Anything that does not parse as
    /// a positive integer fails with [`QueryError::InvalidPagination`].
    /// Limits above [`MAX_LIMIT`] are capped, not rejected.
    pub fn resolve(page: Option<&str>, limit: Option<&str>) -> Result<Self, QueryError> {
        let page = match page {
            None => DEFAULT_PAGE,
            Some(raw) => parse_positive("page", raw)?,
        };

        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(raw) => parse_positive("limit", raw)?,
        };

        let limit = if limit > MAX_LIMIT {
            tracing::warn!(requested = limit, capped = MAX_LIMIT, "limit exceeds maximum, capping");
            MAX_LIMIT
        } else {
            limit
        };

        Ok(Self { page, limit })
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<u32, QueryError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(QueryError::InvalidPagination(format!(
            "{name} must be a positive integer, got '{raw}'"
        ))),
    }
}
