//! Query engine.
//!
//! Turns untrusted request parameters into validated, structured queries and
//! executes them against PostgreSQL:
//! - [`filter`]: raw parameters → conjunctive filter predicate
//! - [`sort`]: sortBy/sortOrder → ordering specification
//! - [`pagination`]: page/limit → bounded offset/limit window
//! - [`builder`]: predicate + sort + window → SQL via SeaQuery
//! - [`executor`]: count + page queries under a statement timeout

pub mod builder;
pub mod executor;
pub mod filter;
pub mod pagination;
pub mod sort;
pub mod types;

use thiserror::Error;

/// Rejection of a malformed query parameter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid sort field: {0}")]
    InvalidSortField(String),

    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
}
