//! Product service.
//!
//! Engine facade for the catalog: declares which parameters filter and sort
//! products, and composes the query engine for listings and the stats report.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::domain::{LOW_STOCK_THRESHOLD, StockStatus};
use crate::error::{AppError, AppResult};
use crate::models::product::{self, CreateProduct, Product, UpdateProduct};
use crate::query::QueryError;
use crate::query::builder::SelectBuilder;
use crate::query::executor;
use crate::query::filter::{FilterSet, effective};
use crate::query::sort::SortableSet;
use crate::query::types::{CountBucket, Page, PageWindow};

const TABLE: &str = "product";

/// Fields products may be sorted by; first entry is the default.
const SORTABLE: SortableSet = SortableSet {
    fields: &[
        ("createdAt", "created"),
        ("updatedAt", "changed"),
        ("name", "name"),
        ("price", "price"),
        ("stock", "stock"),
        ("category", "category"),
        ("featured", "featured"),
        ("rating", "rating_average"),
    ],
};

/// Raw listing parameters, names preserved from the public API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub featured: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<String>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<String>,
    #[serde(rename = "stockStatus")]
    pub stock_status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

/// Product statistics report.
#[derive(Debug, Clone, Serialize)]
pub struct ProductStats {
    #[serde(rename = "totalProducts")]
    pub total_products: i64,
    #[serde(rename = "outOfStock")]
    pub out_of_stock: i64,
    #[serde(rename = "lowStock")]
    pub low_stock: i64,
    #[serde(rename = "featuredProducts")]
    pub featured_products: i64,
    pub categories: Vec<CountBucket>,
}

/// Service for catalog operations.
#[derive(Clone)]
pub struct ProductService {
    pool: PgPool,
    query_timeout: u64,
}

impl ProductService {
    pub fn new(pool: PgPool, query_timeout: u64) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// List active products matching the given parameters.
    pub async fn list(&self, params: &ProductListParams) -> AppResult<Page<Product>> {
        let window = PageWindow::resolve(params.page.as_deref(), params.limit.as_deref())?;
        let sort = SORTABLE.resolve(params.sort_by.as_deref(), params.sort_order.as_deref())?;
        let filters = Self::build_filters(params)?;

        let builder = SelectBuilder::new(TABLE, filters, sort);
        let page = executor::fetch_page(&self.pool, &builder, window, self.query_timeout).await?;

        Ok(page)
    }

    /// Translate listing parameters into the product filter predicate.
    ///
    /// Listings only ever see active records; the soft-delete constraint is
    /// part of the schema, not a caller choice.
    fn build_filters(params: &ProductListParams) -> Result<FilterSet, QueryError> {
        let mut filters = FilterSet::new();
        filters.equals_bool("is_active", true);
        filters.full_text(params.search.as_deref());
        filters.contains("category", params.category.as_deref());
        filters.boolean("featured", params.featured.as_deref());
        filters.numeric_range(
            "price",
            params.min_price.as_deref(),
            params.max_price.as_deref(),
        )?;
        Self::stock_status_filter(&mut filters, params.stock_status.as_deref())?;
        Ok(filters)
    }

    /// Translate the derived stock-status value into a stock-quantity range.
    fn stock_status_filter(
        filters: &mut FilterSet,
        raw: Option<&str>,
    ) -> Result<(), QueryError> {
        let Some(value) = effective(raw) else {
            return Ok(());
        };

        match StockStatus::parse(value) {
            Some(StockStatus::OutOfStock) => filters.equals_i64("stock", 0),
            Some(StockStatus::LowStock) => {
                filters.int_range("stock", Some(1), Some(i64::from(LOW_STOCK_THRESHOLD)));
            }
            Some(StockStatus::InStock) => {
                filters.int_range("stock", Some(i64::from(LOW_STOCK_THRESHOLD) + 1), None);
            }
            None => {
                return Err(QueryError::InvalidFilter(format!(
                    "'{value}' is not a valid stockStatus (expected one of: {})",
                    StockStatus::VALUES.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Fetch one active product.
    pub async fn get(&self, id: Uuid) -> AppResult<Product> {
        Product::find_active_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Create a product from validated input.
    pub async fn create(&self, input: &CreateProduct) -> AppResult<Product> {
        let errors = product::validate_new(input);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let created = Product::create(&self.pool, input).await?;
        info!(product_id = %created.id, category = %created.category, "product created");
        Ok(created)
    }

    /// Partially update a product; only provided fields change.
    pub async fn update(&self, id: Uuid, input: &UpdateProduct) -> AppResult<Product> {
        let current = Product::find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound)?;

        let errors = product::validate_update(&current, input);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let updated = Product::update(&self.pool, id, input)
            .await?
            .ok_or(AppError::NotFound)?;
        info!(product_id = %updated.id, "product updated");
        Ok(updated)
    }

    /// Soft-delete a product, returning the deactivated record.
    pub async fn delete(&self, id: Uuid) -> AppResult<Product> {
        let deleted = Product::soft_delete(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound)?;
        info!(product_id = %deleted.id, "product deactivated");
        Ok(deleted)
    }

    /// Set the stock quantity.
    pub async fn set_stock(&self, id: Uuid, stock: Option<i32>) -> AppResult<Product> {
        let stock = match stock {
            Some(s) if s >= 0 => s,
            _ => {
                return Err(AppError::BadRequest(
                    "Valid stock quantity is required".to_string(),
                ));
            }
        };

        let updated = Product::set_stock(&self.pool, id, stock)
            .await?
            .ok_or(AppError::NotFound)?;
        info!(product_id = %updated.id, stock, "stock updated");
        Ok(updated)
    }

    /// Record a rating between 1 and 5.
    pub async fn add_rating(&self, id: Uuid, rating: Option<f64>) -> AppResult<Product> {
        let rating = match rating {
            Some(r) if (1.0..=5.0).contains(&r) => r,
            _ => {
                return Err(AppError::BadRequest(
                    "Rating must be between 1 and 5".to_string(),
                ));
            }
        };

        let updated = Product::add_rating(&self.pool, id, rating)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(updated)
    }

    /// Catalog statistics over active products.
    pub async fn stats(&self) -> AppResult<ProductStats> {
        let total_products = Product::count_active(&self.pool).await?;
        let out_of_stock = Product::count_out_of_stock(&self.pool).await?;
        let low_stock = Product::count_low_stock(&self.pool).await?;
        let featured_products = Product::count_featured(&self.pool).await?;
        let categories = Product::category_rollup(&self.pool).await?;

        Ok(ProductStats {
            total_products,
            out_of_stock,
            low_stock,
            featured_products,
            categories,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::query::types::{FilterOperator, FilterValue, SortDirection};

    #[test]
    fn listing_always_constrains_to_active() {
        let filters = ProductService::build_filters(&ProductListParams::default()).unwrap();
        let filters = filters.into_filters();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].field, "is_active");
        assert_eq!(filters[0].value, FilterValue::Boolean(true));
    }

    #[test]
    fn stock_status_boundaries_translate_to_ranges() {
        let params = ProductListParams {
            stock_status: Some("out-of-stock".to_string()),
            ..Default::default()
        };
        let filters = ProductService::build_filters(&params).unwrap().into_filters();
        let stock: Vec<_> = filters.iter().filter(|f| f.field == "stock").collect();
        assert_eq!(stock.len(), 1);
        assert_eq!(stock[0].value, FilterValue::Integer(0));

        let params = ProductListParams {
            stock_status: Some("low-stock".to_string()),
            ..Default::default()
        };
        let filters = ProductService::build_filters(&params).unwrap().into_filters();
        let stock: Vec<_> = filters.iter().filter(|f| f.field == "stock").collect();
        assert_eq!(stock.len(), 2);
        assert_eq!(stock[0].operator, FilterOperator::GreaterOrEqual);
        assert_eq!(stock[0].value, FilterValue::Integer(1));
        assert_eq!(stock[1].operator, FilterOperator::LessOrEqual);
        assert_eq!(stock[1].value, FilterValue::Integer(10));

        let params = ProductListParams {
            stock_status: Some("in-stock".to_string()),
            ..Default::default()
        };
        let filters = ProductService::build_filters(&params).unwrap().into_filters();
        let stock: Vec<_> = filters.iter().filter(|f| f.field == "stock").collect();
        assert_eq!(stock.len(), 1);
        assert_eq!(stock[0].operator, FilterOperator::GreaterOrEqual);
        assert_eq!(stock[0].value, FilterValue::Integer(11));
    }

    #[test]
    fn invalid_stock_status_rejected() {
        let params = ProductListParams {
            stock_status: Some("backordered".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            ProductService::build_filters(&params),
            Err(QueryError::InvalidFilter(_))
        ));
    }

    #[test]
    fn stock_status_all_is_no_constraint() {
        let params = ProductListParams {
            stock_status: Some("all".to_string()),
            ..Default::default()
        };
        let filters = ProductService::build_filters(&params).unwrap().into_filters();
        assert!(filters.iter().all(|f| f.field != "stock"));
    }

    #[test]
    fn price_bounds_parse() {
        let params = ProductListParams {
            min_price: Some("10.5".to_string()),
            max_price: Some("99".to_string()),
            ..Default::default()
        };
        let filters = ProductService::build_filters(&params).unwrap().into_filters();
        assert_eq!(filters.iter().filter(|f| f.field == "price").count(), 2);

        let params = ProductListParams {
            min_price: Some("cheap".to_string()),
            ..Default::default()
        };
        assert!(ProductService::build_filters(&params).is_err());
    }

    #[test]
    fn sortable_set_resolves_rating() {
        let spec = SORTABLE.resolve(Some("rating"), Some("desc")).unwrap();
        assert_eq!(spec.column, "rating_average");
        assert_eq!(spec.direction, SortDirection::Desc);
    }
}
