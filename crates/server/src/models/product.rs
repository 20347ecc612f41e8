//! Product model and CRUD operations.
//!
//! Products are soft-deleted: `is_active` is flipped off and the record is
//! excluded from reads, never physically removed.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{URL_RE, now};
use crate::query::types::CountBucket;

const COLUMNS: &str = "id, name, description, price, category, image, stock, featured, \
     rating_average, rating_count, is_active, created, changed";

/// Product record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    pub name: String,

    pub description: String,

    pub price: f64,

    pub category: String,

    /// Image URL.
    pub image: String,

    /// Stock quantity on hand.
    pub stock: i32,

    /// Featured on the storefront.
    pub featured: bool,

    /// Running average rating (0 when unrated).
    pub rating_average: f64,

    /// Number of ratings received.
    pub rating_count: i32,

    /// Soft-delete flag; inactive products are hidden from all reads.
    pub is_active: bool,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

/// Input for creating a product.
///
/// Fields are optional so validation can report every missing field at once.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
}

/// Input for updating a product; only provided fields change.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
}

/// Validate input for a new product, returning field-level messages.
pub fn validate_new(input: &CreateProduct) -> Vec<String> {
    field_errors(
        input.name.as_deref().unwrap_or("").trim(),
        input.description.as_deref().unwrap_or("").trim(),
        input.price,
        input.category.as_deref().unwrap_or("").trim(),
        input.image.as_deref().unwrap_or("").trim(),
        input.stock,
    )
}

/// Validate an update merged over the current record.
pub fn validate_update(current: &Product, input: &UpdateProduct) -> Vec<String> {
    field_errors(
        input.name.as_deref().unwrap_or(&current.name).trim(),
        input
            .description
            .as_deref()
            .unwrap_or(&current.description)
            .trim(),
        Some(input.price.unwrap_or(current.price)),
        input.category.as_deref().unwrap_or(&current.category).trim(),
        input.image.as_deref().unwrap_or(&current.image).trim(),
        Some(input.stock.unwrap_or(current.stock)),
    )
}

fn field_errors(
    name: &str,
    description: &str,
    price: Option<f64>,
    category: &str,
    image: &str,
    stock: Option<i32>,
) -> Vec<String> {
    let mut errors = Vec::new();

    if name.is_empty() {
        errors.push("Product name is required".to_string());
    } else if name.len() > 100 {
        errors.push("Product name cannot exceed 100 characters".to_string());
    }

    if description.is_empty() {
        errors.push("Product description is required".to_string());
    } else if description.len() > 1000 {
        errors.push("Description cannot exceed 1000 characters".to_string());
    }

    match price {
        None => errors.push("Product price is required".to_string()),
        Some(p) if p < 0.0 => errors.push("Price cannot be negative".to_string()),
        Some(_) => {}
    }

    if category.is_empty() {
        errors.push("Product category is required".to_string());
    }

    if image.is_empty() {
        errors.push("Product image URL is required".to_string());
    } else if !URL_RE.is_match(image) {
        errors.push("Please provide a valid image URL".to_string());
    }

    if let Some(s) = stock
        && s < 0
    {
        errors.push("Stock cannot be negative".to_string());
    }

    errors
}

impl Product {
    /// Derived stock status for API responses.
    pub fn stock_status(&self) -> crate::domain::StockStatus {
        crate::domain::StockStatus::from_stock(self.stock)
    }

    /// Find a product by ID regardless of active state.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch product by id")?;

        Ok(product)
    }

    /// Find an active product by ID.
    pub async fn find_active_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {COLUMNS} FROM product WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch product by id")?;

        Ok(product)
    }

    /// Create a new product. Input must already be validated.
    pub async fn create(pool: &PgPool, input: &CreateProduct) -> Result<Self> {
        let id = Uuid::now_v7();
        let now = now();

        sqlx::query(
            r#"
            INSERT INTO product (id, name, description, price, category, image, stock, featured, rating_average, rating_count, is_active, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, 0, TRUE, $9, $10)
            "#,
        )
        .bind(id)
        .bind(input.name.as_deref().unwrap_or("").trim())
        .bind(input.description.as_deref().unwrap_or("").trim())
        .bind(input.price.unwrap_or(0.0))
        .bind(input.category.as_deref().unwrap_or("").trim())
        .bind(input.image.as_deref().unwrap_or("").trim())
        .bind(input.stock.unwrap_or(0))
        .bind(input.featured.unwrap_or(false))
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("failed to insert product")?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("failed to fetch created product"))
    }

    /// Update a product, merging provided fields over current values.
    pub async fn update(pool: &PgPool, id: Uuid, input: &UpdateProduct) -> Result<Option<Self>> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let name = input.name.clone().unwrap_or(current.name);
        let description = input.description.clone().unwrap_or(current.description);
        let price = input.price.unwrap_or(current.price);
        let category = input.category.clone().unwrap_or(current.category);
        let image = input.image.clone().unwrap_or(current.image);
        let stock = input.stock.unwrap_or(current.stock);
        let featured = input.featured.unwrap_or(current.featured);

        sqlx::query(
            r#"
            UPDATE product SET
                name = $1,
                description = $2,
                price = $3,
                category = $4,
                image = $5,
                stock = $6,
                featured = $7,
                changed = $8
            WHERE id = $9
            "#,
        )
        .bind(name.trim())
        .bind(description.trim())
        .bind(price)
        .bind(category.trim())
        .bind(image.trim())
        .bind(stock)
        .bind(featured)
        .bind(now())
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update product")?;

        Self::find_by_id(pool, id).await
    }

    /// Soft-delete a product, returning the deactivated record.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let result = sqlx::query("UPDATE product SET is_active = FALSE, changed = $1 WHERE id = $2")
            .bind(now())
            .bind(id)
            .execute(pool)
            .await
            .context("failed to soft-delete product")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_by_id(pool, id).await
    }

    /// Set the stock quantity.
    pub async fn set_stock(pool: &PgPool, id: Uuid, stock: i32) -> Result<Option<Self>> {
        let result = sqlx::query("UPDATE product SET stock = $1, changed = $2 WHERE id = $3")
            .bind(stock)
            .bind(now())
            .bind(id)
            .execute(pool)
            .await
            .context("failed to update stock")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_by_id(pool, id).await
    }

    /// Fold a new rating into the running average.
    pub async fn add_rating(pool: &PgPool, id: Uuid, rating: f64) -> Result<Option<Self>> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let (average, count) = apply_rating(current.rating_average, current.rating_count, rating);

        sqlx::query(
            "UPDATE product SET rating_average = $1, rating_count = $2, changed = $3 WHERE id = $4",
        )
        .bind(average)
        .bind(count)
        .bind(now())
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update ratings")?;

        Self::find_by_id(pool, id).await
    }

    /// Count active products.
    pub async fn count_active(pool: &PgPool) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE is_active = TRUE")
                .fetch_one(pool)
                .await
                .context("failed to count products")?;

        Ok(count)
    }

    /// Count active products with zero stock.
    pub async fn count_out_of_stock(pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM product WHERE is_active = TRUE AND stock = 0",
        )
        .fetch_one(pool)
        .await
        .context("failed to count out-of-stock products")?;

        Ok(count)
    }

    /// Count active products at or below the low-stock threshold.
    pub async fn count_low_stock(pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM product WHERE is_active = TRUE AND stock > 0 AND stock <= $1",
        )
        .bind(crate::domain::LOW_STOCK_THRESHOLD)
        .fetch_one(pool)
        .await
        .context("failed to count low-stock products")?;

        Ok(count)
    }

    /// Count active featured products.
    pub async fn count_featured(pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM product WHERE is_active = TRUE AND featured = TRUE",
        )
        .fetch_one(pool)
        .await
        .context("failed to count featured products")?;

        Ok(count)
    }

    /// Per-category counts over active products, most populous first.
    pub async fn category_rollup(pool: &PgPool) -> Result<Vec<CountBucket>> {
        let buckets = sqlx::query_as::<_, CountBucket>(
            r#"
            SELECT category AS key, COUNT(*) AS count
            FROM product
            WHERE is_active = TRUE
            GROUP BY category
            ORDER BY count DESC, key ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .context("failed to aggregate categories")?;

        Ok(buckets)
    }
}

/// Fold one rating into a running (average, count) pair.
pub fn apply_rating(average: f64, count: i32, rating: f64) -> (f64, i32) {
    let total = average * f64::from(count) + rating;
    let count = count + 1;
    (total / f64::from(count), count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn valid_input() -> CreateProduct {
        CreateProduct {
            name: Some("Steel Bracket".to_string()),
            description: Some("Galvanized steel shelf bracket".to_string()),
            price: Some(249.0),
            category: Some("hardware".to_string()),
            image: Some("https://cdn.example.com/bracket.jpg".to_string()),
            stock: Some(25),
            featured: None,
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(validate_new(&valid_input()).is_empty());
    }

    #[test]
    fn missing_fields_collected_together() {
        let input = CreateProduct {
            name: None,
            description: None,
            price: None,
            category: None,
            image: None,
            stock: None,
            featured: None,
        };
        let errors = validate_new(&input);
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| e.contains("name is required")));
        assert!(errors.iter().any(|e| e.contains("price is required")));
    }

    #[test]
    fn negative_price_rejected() {
        let mut input = valid_input();
        input.price = Some(-1.0);
        let errors = validate_new(&input);
        assert!(errors.iter().any(|e| e.contains("Price cannot be negative")));
    }

    #[test]
    fn non_http_image_rejected() {
        let mut input = valid_input();
        input.image = Some("ftp://cdn.example.com/bracket.jpg".to_string());
        let errors = validate_new(&input);
        assert!(errors.iter().any(|e| e.contains("valid image URL")));
    }

    #[test]
    fn negative_stock_rejected() {
        let mut input = valid_input();
        input.stock = Some(-3);
        let errors = validate_new(&input);
        assert!(errors.iter().any(|e| e.contains("Stock cannot be negative")));
    }

    #[test]
    fn rating_running_average() {
        let (avg, count) = apply_rating(0.0, 0, 4.0);
        assert_eq!((avg, count), (4.0, 1));

        let (avg, count) = apply_rating(avg, count, 5.0);
        assert_eq!(count, 2);
        assert!((avg - 4.5).abs() < f64::EPSILON);

        let (avg, count) = apply_rating(avg, count, 3.0);
        assert_eq!(count, 3);
        assert!((avg - 4.0).abs() < f64::EPSILON);
    }
}
