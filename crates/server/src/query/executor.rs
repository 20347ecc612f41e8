//! Query executor.
//!
//! Runs the count and page queries for a built select inside a single
//! transaction so a statement timeout bounds both calls. The two statements
//! are not a consistent snapshot; a concurrent write between them is an
//! accepted race.

use sqlx::PgPool;
use sqlx::postgres::PgRow;

use super::builder::SelectBuilder;
use super::types::{Page, PageWindow};

/// Execute `builder` for one page window, returning the page plus the
/// pagination-independent total.
pub async fn fetch_page<T>(
    pool: &PgPool,
    builder: &SelectBuilder,
    window: PageWindow,
    timeout_secs: u64,
) -> Result<Page<T>, sqlx::Error>
where
    T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
{
    let mut tx = pool.begin().await?;

    // SET LOCAL applies for the duration of the transaction only.
    sqlx::query(&format!("SET LOCAL statement_timeout = '{timeout_secs}s'"))
        .execute(&mut *tx)
        .await?;

    let total: i64 = sqlx::query_scalar(&builder.build_count())
        .fetch_one(&mut *tx)
        .await?;

    let items: Vec<T> = sqlx::query_as(&builder.build(window))
        .fetch_all(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Page::new(items, total as u64, window))
}

/// Execute `builder` without pagination (sorted, unbounded), for exports
/// and fixed reports.
pub async fn fetch_all<T>(
    pool: &PgPool,
    builder: &SelectBuilder,
    timeout_secs: u64,
) -> Result<Vec<T>, sqlx::Error>
where
    T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
{
    let mut tx = pool.begin().await?;

    sqlx::query(&format!("SET LOCAL statement_timeout = '{timeout_secs}s'"))
        .execute(&mut *tx)
        .await?;

    let items: Vec<T> = sqlx::query_as(&builder.build_all())
        .fetch_all(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(items)
}
