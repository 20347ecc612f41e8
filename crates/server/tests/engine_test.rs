//! Query engine integration tests.
//!
//! Exercises the public engine API end-to-end — raw parameters through the
//! filter builder, sort resolver, and pagination engine into generated SQL —
//! without requiring a live database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use mercato_server::query::QueryError;
use mercato_server::query::builder::SelectBuilder;
use mercato_server::query::filter::FilterSet;
use mercato_server::query::pagination::MAX_LIMIT;
use mercato_server::query::sort::SortableSet;
use mercato_server::query::types::{Page, PageWindow, SortDirection, SortSpec};

const ENQUIRY_SORTABLE: SortableSet = SortableSet {
    fields: &[
        ("createdAt", "created"),
        ("name", "name"),
        ("priority", "priority"),
    ],
};

fn created_desc() -> SortSpec {
    SortSpec {
        column: "created",
        direction: SortDirection::Desc,
    }
}

#[test]
fn full_product_listing_descriptor() {
    // A listing request combining every filter kind the catalog declares.
    let mut filters = FilterSet::new();
    filters.equals_bool("is_active", true);
    filters.full_text(Some("steel bracket"));
    filters.contains("category", Some("hardware"));
    filters.boolean("featured", Some("true"));
    filters.numeric_range("price", Some("10"), Some("500")).unwrap();
    filters.int_range("stock", Some(1), Some(10));

    let window = PageWindow::resolve(Some("2"), Some("20")).unwrap();
    let builder = SelectBuilder::new("product", filters, created_desc());

    let sql = builder.build(window);
    assert!(sql.contains("FROM \"product\""));
    assert!(sql.contains("\"is_active\" = TRUE"));
    assert!(sql.contains("search_vector @@ to_tsquery"));
    assert!(sql.contains("steel & bracket"));
    assert!(sql.contains("ILIKE"));
    assert!(sql.contains("%hardware%"));
    assert!(sql.contains("\"featured\" = TRUE"));
    assert!(sql.contains("\"price\" >= 10"));
    assert!(sql.contains("\"price\" <= 500"));
    assert!(sql.contains("\"stock\" >= 1"));
    assert!(sql.contains("\"stock\" <= 10"));
    assert!(sql.contains("ORDER BY \"product\".\"created\" DESC"));
    assert!(sql.contains("LIMIT 20"));
    assert!(sql.contains("OFFSET 20"));

    // The count query carries the same predicate but no pagination.
    let count_sql = builder.build_count();
    assert!(count_sql.contains("COUNT(*)"));
    assert!(count_sql.contains("\"is_active\" = TRUE"));
    assert!(count_sql.contains("\"price\" >= 10"));
    assert!(!count_sql.contains("LIMIT"));
    assert!(!count_sql.contains("OFFSET"));
}

#[test]
fn enquiry_listing_descriptor_with_dates() {
    let mut filters = FilterSet::new();
    filters
        .enumerated("status", Some("pending"), &["pending", "in-progress", "completed", "cancelled"])
        .unwrap();
    filters.contains("city", Some("pune"));
    filters
        .date_range("created", Some("2024-01-01"), Some("2024-06-30"))
        .unwrap();

    let sort = ENQUIRY_SORTABLE.resolve(Some("name"), Some("asc")).unwrap();
    let builder = SelectBuilder::new("enquiry", filters, sort);
    let sql = builder.build(PageWindow::resolve(None, None).unwrap());

    assert!(sql.contains("\"status\" = 'pending'"));
    assert!(sql.contains("%pune%"));
    assert!(sql.contains("\"created\" >= 1704067200"));
    assert!(sql.contains("ORDER BY \"enquiry\".\"name\" ASC"));
    // Deterministic pagination: id is always the secondary key.
    assert!(sql.contains("\"id\" ASC"));
    assert!(sql.contains("LIMIT 10"));
    assert!(sql.contains("OFFSET 0"));
}

#[test]
fn urgent_pagination_scenario() {
    // 25 enquiries exist, 12 urgent. Page 2 at 10 per page holds the last 2.
    let window = PageWindow::resolve(Some("2"), Some("10")).unwrap();
    assert_eq!(window.offset(), 10);

    let items: Vec<u8> = vec![0; 2];
    let page = Page::new(items, 12, window);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 12);
    assert_eq!(page.pages, 2);
    assert!(!page.has_next);
    assert!(page.has_prev);
}

#[test]
fn sentinel_all_equals_omission_in_sql() {
    let mut with_sentinel = FilterSet::new();
    with_sentinel
        .enumerated("status", Some("all"), &["pending", "completed"])
        .unwrap();
    with_sentinel.contains("city", Some("all"));

    let omitted = FilterSet::new();

    let window = PageWindow::resolve(None, None).unwrap();
    let a = SelectBuilder::new("enquiry", with_sentinel, created_desc()).build(window);
    let b = SelectBuilder::new("enquiry", omitted, created_desc()).build(window);
    assert_eq!(a, b);
}

#[test]
fn malformed_parameters_are_rejected() {
    assert!(matches!(
        PageWindow::resolve(Some("first"), None),
        Err(QueryError::InvalidPagination(_))
    ));
    assert!(matches!(
        PageWindow::resolve(Some("0"), Some("10")),
        Err(QueryError::InvalidPagination(_))
    ));
    assert!(matches!(
        ENQUIRY_SORTABLE.resolve(Some("password"), None),
        Err(QueryError::InvalidSortField(_))
    ));

    let mut filters = FilterSet::new();
    assert!(matches!(
        filters.enumerated("status", Some("done"), &["pending"]),
        Err(QueryError::InvalidFilter(_))
    ));
    assert!(matches!(
        filters.numeric_range("price", Some("cheap"), None),
        Err(QueryError::InvalidFilter(_))
    ));
    assert!(matches!(
        filters.date_range("created", Some("tomorrow"), None),
        Err(QueryError::InvalidFilter(_))
    ));
}

#[test]
fn oversized_limit_is_capped() {
    let window = PageWindow::resolve(Some("1"), Some("100000")).unwrap();
    assert_eq!(window.limit, MAX_LIMIT);

    let builder = SelectBuilder::new("enquiry", FilterSet::new(), created_desc());
    let sql = builder.build(window);
    assert!(sql.contains(&format!("LIMIT {MAX_LIMIT}")));
}

#[test]
fn identical_parameters_build_identical_queries() {
    let build = || {
        let mut filters = FilterSet::new();
        filters.contains("state", Some("Maharashtra"));
        let window = PageWindow::resolve(Some("3"), Some("15")).unwrap();
        SelectBuilder::new("enquiry", filters, created_desc()).build(window)
    };
    assert_eq!(build(), build());
}
