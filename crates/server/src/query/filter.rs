//! Filter builder.
//!
//! Accumulates validated constraints from untrusted request parameters.
//! A parameter contributes nothing when absent, empty, or the sentinel
//! `"all"`; enumerated values are checked against their declared set; range
//! bounds must parse as numbers or dates. Each field holds at most one
//! constraint — re-specifying a field replaces the earlier one.

use chrono::NaiveDate;

use super::QueryError;
use super::types::{FieldFilter, FilterOperator, FilterValue};

/// Ordered set of per-field constraints, conjunctively combined.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    entries: Vec<(String, Vec<FieldFilter>)>,
}

/// Strip sentinel values: absent, empty, and "all" all mean "no constraint".
pub(crate) fn effective(raw: Option<&str>) -> Option<&str> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(value) => Some(value),
    }
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all constraints on `field` (last write wins).
    pub fn replace(&mut self, field: &str, filters: Vec<FieldFilter>) {
        self.entries.retain(|(name, _)| name != field);
        if !filters.is_empty() {
            self.entries.push((field.to_string(), filters));
        }
    }

    /// Unconditional equality constraint on a string column.
    pub fn equals_str(&mut self, field: &str, value: &str) {
        self.replace(
            field,
            vec![FieldFilter {
                field: field.to_string(),
                operator: FilterOperator::Equals,
                value: FilterValue::String(value.to_string()),
            }],
        );
    }

    /// Unconditional equality constraint on an integer column.
    pub fn equals_i64(&mut self, field: &str, value: i64) {
        self.replace(
            field,
            vec![FieldFilter {
                field: field.to_string(),
                operator: FilterOperator::Equals,
                value: FilterValue::Integer(value),
            }],
        );
    }

    /// Unconditional equality constraint on a boolean column.
    pub fn equals_bool(&mut self, field: &str, value: bool) {
        self.replace(
            field,
            vec![FieldFilter {
                field: field.to_string(),
                operator: FilterOperator::Equals,
                value: FilterValue::Boolean(value),
            }],
        );
    }

    /// Inequality constraint on a string column.
    pub fn not_equals_str(&mut self, field: &str, value: &str) {
        self.replace(
            field,
            vec![FieldFilter {
                field: field.to_string(),
                operator: FilterOperator::NotEquals,
                value: FilterValue::String(value.to_string()),
            }],
        );
    }

    /// Case-insensitive substring constraint from a raw parameter.
    pub fn contains(&mut self, field: &str, raw: Option<&str>) {
        if let Some(value) = effective(raw) {
            self.replace(
                field,
                vec![FieldFilter {
                    field: field.to_string(),
                    operator: FilterOperator::Contains,
                    value: FilterValue::String(value.to_string()),
                }],
            );
        }
    }

    /// Boolean constraint from a raw parameter.
    ///
    /// Only the literals "true" and "false" constrain; anything else is
    /// treated as absent.
    pub fn boolean(&mut self, field: &str, raw: Option<&str>) {
        let value = match effective(raw) {
            Some("true") => true,
            Some("false") => false,
            _ => return,
        };
        self.equals_bool(field, value);
    }

    /// Equality constraint validated against a declared value set.
    pub fn enumerated(
        &mut self,
        field: &str,
        raw: Option<&str>,
        allowed: &[&str],
    ) -> Result<(), QueryError> {
        let Some(value) = effective(raw) else {
            return Ok(());
        };
        if !allowed.contains(&value) {
            return Err(QueryError::InvalidFilter(format!(
                "'{value}' is not a valid {field} (expected one of: {})",
                allowed.join(", ")
            )));
        }
        self.equals_str(field, value);
        Ok(())
    }

    /// Numeric range constraint; either bound may be omitted.
    pub fn numeric_range(
        &mut self,
        field: &str,
        min_raw: Option<&str>,
        max_raw: Option<&str>,
    ) -> Result<(), QueryError> {
        let mut filters = Vec::new();
        if let Some(raw) = effective(min_raw) {
            filters.push(FieldFilter {
                field: field.to_string(),
                operator: FilterOperator::GreaterOrEqual,
                value: FilterValue::Float(parse_number(field, raw)?),
            });
        }
        if let Some(raw) = effective(max_raw) {
            filters.push(FieldFilter {
                field: field.to_string(),
                operator: FilterOperator::LessOrEqual,
                value: FilterValue::Float(parse_number(field, raw)?),
            });
        }
        self.replace(field, filters);
        Ok(())
    }

    /// Integer range constraint with pre-validated bounds (for derived
    /// filters such as stock status).
    pub fn int_range(&mut self, field: &str, min: Option<i64>, max: Option<i64>) {
        let mut filters = Vec::new();
        if let Some(min) = min {
            filters.push(FieldFilter {
                field: field.to_string(),
                operator: FilterOperator::GreaterOrEqual,
                value: FilterValue::Integer(min),
            });
        }
        if let Some(max) = max {
            filters.push(FieldFilter {
                field: field.to_string(),
                operator: FilterOperator::LessOrEqual,
                value: FilterValue::Integer(max),
            });
        }
        self.replace(field, filters);
    }

    /// Timestamp range constraint over a Unix-seconds column; bounds accept
    /// RFC 3339 instants or YYYY-MM-DD dates (midnight UTC).
    pub fn date_range(
        &mut self,
        field: &str,
        from_raw: Option<&str>,
        to_raw: Option<&str>,
    ) -> Result<(), QueryError> {
        let mut filters = Vec::new();
        if let Some(raw) = effective(from_raw) {
            filters.push(FieldFilter {
                field: field.to_string(),
                operator: FilterOperator::GreaterOrEqual,
                value: FilterValue::Integer(parse_date_bound(field, raw)?),
            });
        }
        if let Some(raw) = effective(to_raw) {
            filters.push(FieldFilter {
                field: field.to_string(),
                operator: FilterOperator::LessOrEqual,
                value: FilterValue::Integer(parse_date_bound(field, raw)?),
            });
        }
        self.replace(field, filters);
        Ok(())
    }

    /// Full-text search constraint across the table's indexed text fields.
    ///
    /// When present this replaces per-field text matching with a single
    /// search-vector query.
    pub fn full_text(&mut self, raw: Option<&str>) {
        if let Some(value) = effective(raw) {
            self.replace(
                "search_vector",
                vec![FieldFilter {
                    field: "search_vector".to_string(),
                    operator: FilterOperator::FullTextSearch,
                    value: FilterValue::String(value.to_string()),
                }],
            );
        }
    }

    /// Flatten into the constraint list the select builder consumes.
    pub fn into_filters(self) -> Vec<FieldFilter> {
        self.entries
            .into_iter()
            .flat_map(|(_, filters)| filters)
            .collect()
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64, QueryError> {
    raw.parse::<f64>().map_err(|_| {
        QueryError::InvalidFilter(format!("'{raw}' is not a valid number for {field}"))
    })
}

fn parse_date_bound(field: &str, raw: &str) -> Result<i64, QueryError> {
    if let Ok(instant) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.timestamp());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc().timestamp());
    }
    Err(QueryError::InvalidFilter(format!(
        "'{raw}' is not a valid date for {field}"
    )))
}
