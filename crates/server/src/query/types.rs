//! Query engine types.
//!
//! Vocabulary shared by the filter builder, sort resolver, pagination
//! engine, and executor: operators, values, page windows, and page results.

use serde::{Deserialize, Serialize};

/// Comparison operators for filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Exact match.
    Equals,
    /// Not equal.
    NotEquals,
    /// Case-insensitive substring match (ILIKE %value%).
    Contains,
    /// Greater than or equal.
    GreaterOrEqual,
    /// Less than or equal.
    LessOrEqual,
    /// Full-text search against the table's search vector.
    #[serde(rename = "full_text_search")]
    FullTextSearch,
}

/// Filter value types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl FilterValue {
    /// Convert to string representation for SQL.
    pub fn as_string(&self) -> Option<String> {
        match self {
            FilterValue::String(s) => Some(s.clone()),
            FilterValue::Integer(i) => Some(i.to_string()),
            FilterValue::Float(f) => Some(f.to_string()),
            FilterValue::Boolean(b) => Some(b.to_string()),
        }
    }

    /// Convert to integer if possible.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FilterValue::Integer(i) => Some(*i),
            FilterValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// A single (column, operator, value) constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Resolved ordering: a storage column plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// Bounded offset/limit window derived from page/limit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-indexed page number.
    pub page: u32,
    /// Items per page.
    pub limit: u32,
}

impl PageWindow {
    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching rows, ignoring pagination.
    pub total: u64,
    /// Current page number (1-indexed).
    pub page: u32,
    /// Items per page.
    pub limit: u32,
    /// Total number of pages.
    pub pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    /// Create a page with derived paging metadata.
    pub fn new(items: Vec<T>, total: u64, window: PageWindow) -> Self {
        let pages = if window.limit > 0 {
            total.div_ceil(u64::from(window.limit)) as u32
        } else {
            1
        };

        Self {
            items,
            total,
            page: window.page,
            limit: window.limit,
            pages,
            has_next: window.page < pages,
            has_prev: window.page > 1,
        }
    }
}

/// One grouped-count entry in a statistics report.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CountBucket {
    pub key: String,
    pub count: i64,
}

/// One (year, month) bucket in a time-series report.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MonthBucket {
    pub year: i32,
    pub month: i32,
    pub count: i64,
}
