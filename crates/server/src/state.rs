//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::Config;
use crate::db;
use crate::services::{EnquiryService, ProductService};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Product catalog service.
    products: ProductService,

    /// Enquiry pipeline service.
    enquiries: EnquiryService,
}

impl AppState {
    /// Create new application state with database connections.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;

        let products = ProductService::new(db.clone(), config.query_timeout_secs);
        let enquiries = EnquiryService::new(db.clone(), config.query_timeout_secs);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                db,
                products,
                enquiries,
            }),
        })
    }

    /// Get the database pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Get the product service.
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }

    /// Get the enquiry service.
    pub fn enquiries(&self) -> &EnquiryService {
        &self.inner.enquiries
    }

    /// Check if PostgreSQL is healthy.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }
}
