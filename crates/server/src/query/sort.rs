//! Sort resolver.
//!
//! Maps the API sort vocabulary onto storage columns and validates the
//! requested field against the resource's sortable set. Unknown fields are
//! rejected rather than silently accepted.

use super::QueryError;
use super::types::{SortDirection, SortSpec};

/// The fields a resource may be sorted by: (API name, storage column).
///
/// The first entry is the default when no sortBy parameter is given.
#[derive(Debug, Clone, Copy)]
pub struct SortableSet {
    pub fields: &'static [(&'static str, &'static str)],
}

impl SortableSet {
    /// Resolve sortBy/sortOrder parameters into a sort specification.
    ///
    /// Direction defaults to descending when absent or unrecognized; an
    /// unknown field fails with [`QueryError::InvalidSortField`].
    pub fn resolve(
        &self,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
    ) -> Result<SortSpec, QueryError> {
        let column = match sort_by {
            None => self.fields[0].1,
            Some(name) => self
                .fields
                .iter()
                .find(|(api, _)| *api == name)
                .map(|(_, column)| *column)
                .ok_or_else(|| QueryError::InvalidSortField(name.to_string()))?,
        };

        let direction = match sort_order {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        };

        Ok(SortSpec { column, direction })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SORTABLE: SortableSet = SortableSet {
        fields: &[("createdAt", "created"), ("name", "name"), ("price", "price")],
    };

    #[test]
    fn default_is_first_entry_descending() {
        let spec = SORTABLE.resolve(None, None).unwrap();
        assert_eq!(spec.column, "created");
        assert_eq!(spec.direction, SortDirection::Desc);
    }

    #[test]
    fn maps_api_name_to_column() {
        let spec = SORTABLE.resolve(Some("createdAt"), Some("asc")).unwrap();
        assert_eq!(spec.column, "created");
        assert_eq!(spec.direction, SortDirection::Asc);
    }

    #[test]
    fn unknown_field_rejected() {
        let err = SORTABLE.resolve(Some("fields.secret"), None).unwrap_err();
        assert_eq!(err, QueryError::InvalidSortField("fields.secret".to_string()));
    }

    #[test]
    fn unrecognized_direction_falls_back_to_desc() {
        let spec = SORTABLE.resolve(Some("price"), Some("sideways")).unwrap();
        assert_eq!(spec.direction, SortDirection::Desc);
    }
}
