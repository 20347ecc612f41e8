//! Select builder using SeaQuery.
//!
//! Renders a validated filter predicate plus sort specification into SQL:
//! a paginated page query, an unbounded count query, or an unpaged listing
//! (for exports and fixed reports).

use sea_query::extension::postgres::PgBinOper;
use sea_query::{
    Alias, Asterisk, Expr, ExprTrait, Order, PostgresQueryBuilder, Query, SelectStatement,
    SimpleExpr, Value,
};

use super::filter::FilterSet;
use super::types::{
    FieldFilter, FilterOperator, FilterValue, PageWindow, SortDirection, SortSpec,
};

/// Query builder for a single resource table.
pub struct SelectBuilder {
    table: &'static str,
    filters: Vec<FieldFilter>,
    sort: SortSpec,
}

impl SelectBuilder {
    /// Create a builder over `table` with a resolved predicate and sort.
    pub fn new(table: &'static str, filters: FilterSet, sort: SortSpec) -> Self {
        Self {
            table,
            filters: filters.into_filters(),
            sort,
        }
    }

    /// Build the main SELECT query for one page window.
    pub fn build(&self, window: PageWindow) -> String {
        let mut query = self.base_select();
        self.add_sorts(&mut query);
        query.limit(u64::from(window.limit));
        query.offset(window.offset());
        query.to_string(PostgresQueryBuilder)
    }

    /// Build a COUNT query for the total matching the filter alone.
    pub fn build_count(&self) -> String {
        let mut query = Query::select();
        query.expr(Expr::col(Asterisk).count());
        query.from(Alias::new(self.table));
        self.add_filters(&mut query);
        query.to_string(PostgresQueryBuilder)
    }

    /// Build an unpaged SELECT (sorted, no limit) for exports.
    pub fn build_all(&self) -> String {
        let mut query = self.base_select();
        self.add_sorts(&mut query);
        query.to_string(PostgresQueryBuilder)
    }

    fn base_select(&self) -> SelectStatement {
        let mut query = Query::select();
        query.column((Alias::new(self.table), Asterisk));
        query.from(Alias::new(self.table));
        self.add_filters(&mut query);
        query
    }

    /// Add WHERE conditions from filters.
    fn add_filters(&self, query: &mut SelectStatement) {
        for filter in &self.filters {
            if let Some(condition) = self.build_filter_condition(filter) {
                query.and_where(condition);
            }
        }
    }

    /// Build a single filter condition.
    fn build_filter_condition(&self, filter: &FieldFilter) -> Option<SimpleExpr> {
        let field_expr = self.field_expr(&filter.field);

        match &filter.operator {
            FilterOperator::Equals => Some(field_expr.eq(sea_value(&filter.value))),
            FilterOperator::NotEquals => Some(field_expr.ne(sea_value(&filter.value))),
            FilterOperator::Contains => {
                let value = filter.value.as_string()?;
                Some(field_expr.binary(
                    PgBinOper::ILike,
                    Expr::val(format!("%{}%", escape_like_wildcards(&value))),
                ))
            }
            FilterOperator::GreaterOrEqual => Some(field_expr.gte(sea_value(&filter.value))),
            FilterOperator::LessOrEqual => Some(field_expr.lte(sea_value(&filter.value))),
            // Full-text search using PostgreSQL tsvector
            FilterOperator::FullTextSearch => {
                let value = filter.value.as_string()?;
                if value.is_empty() {
                    return None;
                }
                // Sanitize: keep only alphanumeric + spaces, then join with &
                let sanitized: String = value
                    .chars()
                    .map(|c| {
                        if c.is_alphanumeric() || c == ' ' {
                            c
                        } else {
                            ' '
                        }
                    })
                    .collect();
                let terms: Vec<&str> = sanitized.split_whitespace().collect();
                if terms.is_empty() {
                    return None;
                }
                let tsquery = terms.join(" & ");
                // Use parameterized query to prevent SQL injection
                Some(Expr::cust_with_values(
                    format!("{}.search_vector @@ to_tsquery('english', $1)", self.table),
                    [tsquery],
                ))
            }
        }
    }

    /// Build expression for a column on the base table.
    fn field_expr(&self, field: &str) -> SimpleExpr {
        Expr::col((Alias::new(self.table), Alias::new(field))).into()
    }

    /// Add ORDER BY clauses: the resolved sort plus an `id` tie-break so
    /// equal sort values paginate deterministically.
    fn add_sorts(&self, query: &mut SelectStatement) {
        let order = match self.sort.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };

        query.order_by((Alias::new(self.table), Alias::new(self.sort.column)), order);

        if self.sort.column != "id" {
            query.order_by((Alias::new(self.table), Alias::new("id")), Order::Asc);
        }
    }
}

fn sea_value(value: &FilterValue) -> Value {
    match value {
        FilterValue::String(s) => s.clone().into(),
        FilterValue::Integer(i) => (*i).into(),
        FilterValue::Float(f) => (*f).into(),
        FilterValue::Boolean(b) => (*b).into(),
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
pub fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sort_created_desc() -> SortSpec {
        SortSpec {
            column: "created",
            direction: SortDirection::Desc,
        }
    }

    #[test]
    fn simple_query_build() {
        let mut filters = FilterSet::new();
        filters.equals_str("status", "pending");
        let builder = SelectBuilder::new("enquiry", filters, sort_created_desc());
        let sql = builder.build(PageWindow { page: 1, limit: 10 });

        assert!(sql.contains("FROM \"enquiry\""));
        assert!(sql.contains("\"status\" = 'pending'"));
        assert!(sql.contains("LIMIT 10"));
        assert!(sql.contains("OFFSET 0"));
        assert!(sql.contains("ORDER BY"));
    }

    #[test]
    fn count_query_build() {
        let mut filters = FilterSet::new();
        filters.equals_str("priority", "urgent");
        let builder = SelectBuilder::new("enquiry", filters, sort_created_desc());
        let sql = builder.build_count();

        assert!(sql.contains("COUNT(*)"));
        assert!(sql.contains("FROM \"enquiry\""));
        assert!(sql.contains("\"priority\" = 'urgent'"));
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("ORDER BY"));
    }

    #[test]
    fn pagination_offset() {
        let builder = SelectBuilder::new("enquiry", FilterSet::new(), sort_created_desc());
        assert!(builder.build(PageWindow { page: 1, limit: 10 }).contains("OFFSET 0"));
        assert!(builder.build(PageWindow { page: 2, limit: 10 }).contains("OFFSET 10"));
        assert!(builder.build(PageWindow { page: 3, limit: 25 }).contains("OFFSET 50"));
    }

    #[test]
    fn contains_uses_ilike() {
        let mut filters = FilterSet::new();
        filters.contains("city", Some("pune"));
        let builder = SelectBuilder::new("enquiry", filters, sort_created_desc());
        let sql = builder.build(PageWindow { page: 1, limit: 10 });

        assert!(sql.contains("ILIKE"), "should use ILIKE: {sql}");
        assert!(sql.contains("%pune%"));
    }

    #[test]
    fn like_wildcards_escaped() {
        let mut filters = FilterSet::new();
        filters.contains("city", Some("100%_done"));
        let builder = SelectBuilder::new("enquiry", filters, sort_created_desc());
        let sql = builder.build(PageWindow { page: 1, limit: 10 });

        assert!(
            sql.contains("100\\\\%\\\\_done") || sql.contains("100\\%\\_done"),
            "LIKE wildcards should be escaped: {sql}"
        );
        assert!(
            !sql.contains("%100%_done%"),
            "raw wildcard chars should NOT appear unescaped: {sql}"
        );
    }

    #[test]
    fn full_text_search_filter() {
        let mut filters = FilterSet::new();
        filters.full_text(Some("steel bracket"));
        let builder = SelectBuilder::new("product", filters, sort_created_desc());
        let sql = builder.build(PageWindow { page: 1, limit: 10 });

        assert!(
            sql.contains("search_vector @@ to_tsquery"),
            "should contain tsvector search: {sql}"
        );
        assert!(sql.contains("steel & bracket"), "should AND terms: {sql}");
    }

    #[test]
    fn full_text_search_sanitizes_special_chars() {
        let mut filters = FilterSet::new();
        filters.full_text(Some("bracket's | ! & (steel)"));
        let builder = SelectBuilder::new("product", filters, sort_created_desc());
        let sql = builder.build(PageWindow { page: 1, limit: 10 });

        assert!(sql.contains("search_vector @@ to_tsquery"));
        assert!(!sql.contains('|'), "pipe should be stripped: {sql}");
        assert!(!sql.contains('!'), "bang should be stripped: {sql}");
    }

    #[test]
    fn range_bounds_render_gte_lte() {
        let mut filters = FilterSet::new();
        filters.numeric_range("price", Some("10"), Some("250")).unwrap();
        let builder = SelectBuilder::new("product", filters, sort_created_desc());
        let sql = builder.build(PageWindow { page: 1, limit: 10 });

        assert!(sql.contains("\"price\" >= 10"));
        assert!(sql.contains("\"price\" <= 250"));
    }

    #[test]
    fn stock_status_translation_renders_quantity_range() {
        // out-of-stock: stock = 0
        let mut filters = FilterSet::new();
        filters.equals_i64("stock", 0);
        let builder = SelectBuilder::new("product", filters, sort_created_desc());
        assert!(builder.build_count().contains("\"stock\" = 0"));

        // low-stock: 1 <= stock <= 10
        let mut filters = FilterSet::new();
        filters.int_range("stock", Some(1), Some(10));
        let builder = SelectBuilder::new("product", filters, sort_created_desc());
        let sql = builder.build_count();
        assert!(sql.contains("\"stock\" >= 1"));
        assert!(sql.contains("\"stock\" <= 10"));

        // in-stock: stock >= 11
        let mut filters = FilterSet::new();
        filters.int_range("stock", Some(11), None);
        let builder = SelectBuilder::new("product", filters, sort_created_desc());
        assert!(builder.build_count().contains("\"stock\" >= 11"));
    }

    #[test]
    fn soft_delete_constraint_present() {
        let mut filters = FilterSet::new();
        filters.equals_bool("is_active", true);
        let builder = SelectBuilder::new("product", filters, sort_created_desc());

        assert!(builder.build(PageWindow { page: 1, limit: 10 }).contains("\"is_active\" = TRUE"));
        assert!(builder.build_count().contains("\"is_active\" = TRUE"));
    }

    #[test]
    fn id_tie_break_appended() {
        let builder = SelectBuilder::new("enquiry", FilterSet::new(), sort_created_desc());
        let sql = builder.build(PageWindow { page: 1, limit: 10 });

        let order_pos = sql.find("\"created\" DESC").unwrap();
        let id_pos = sql.find("\"id\" ASC").unwrap();
        assert!(id_pos > order_pos, "id tie-break should follow primary sort: {sql}");
    }

    #[test]
    fn build_all_has_no_limit() {
        let builder = SelectBuilder::new("enquiry", FilterSet::new(), sort_created_desc());
        let sql = builder.build_all();
        assert!(!sql.contains("LIMIT"));
        assert!(sql.contains("ORDER BY"));
    }

    #[test]
    fn not_equals_renders() {
        let mut filters = FilterSet::new();
        filters.not_equals_str("status", "completed");
        let builder = SelectBuilder::new("enquiry", filters, sort_created_desc());
        let sql = builder.build_all();
        assert!(sql.contains("\"status\" <> 'completed'"));
    }
}
