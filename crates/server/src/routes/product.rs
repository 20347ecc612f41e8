//! Product route handlers.
//!
//! CRUD, stock and rating updates, and the catalog stats report.

use axum::http::StatusCode;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{PaginationMeta, parse_id};
use crate::error::AppResult;
use crate::models::{CreateProduct, Product, UpdateProduct};
use crate::services::product::{ProductListParams, ProductStats};
use crate::state::AppState;

/// Paginated product listing.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub pagination: PaginationMeta,
}

/// Request for setting the stock quantity.
#[derive(Debug, Deserialize)]
pub struct StockUpdateRequest {
    pub stock: Option<i32>,
}

/// Request for adding a rating.
#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: Option<f64>,
}

/// Create the product router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/stats/overview", get(stats_overview))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/products/{id}/stock", put(update_stock))
        .route("/api/products/{id}/rating", post(add_rating))
}

/// List products with filtering, search, and pagination.
///
/// GET /api/products?search=&category=&featured=&minPrice=&maxPrice=&stockStatus=&page=&limit=&sortBy=&sortOrder=
async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> AppResult<Json<ProductListResponse>> {
    let page = state.products().list(&params).await?;
    let pagination = PaginationMeta::from(&page);

    Ok(Json(ProductListResponse {
        products: page.items,
        pagination,
    }))
}

/// Get a single active product.
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let product = state.products().get(parse_id(&id)?).await?;
    Ok(Json(product))
}

/// Create a new product.
async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let product = state.products().create(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Product created successfully",
            "product": product,
        })),
    ))
}

/// Update a product; only provided fields change.
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateProduct>,
) -> AppResult<Json<serde_json::Value>> {
    let product = state.products().update(parse_id(&id)?, &request).await?;

    Ok(Json(json!({
        "message": "Product updated successfully",
        "product": product,
    })))
}

/// Soft-delete a product.
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let product = state.products().delete(parse_id(&id)?).await?;

    Ok(Json(json!({
        "message": "Product deleted successfully",
        "product": product,
    })))
}

/// Set the stock quantity; the response includes the derived stock status.
async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StockUpdateRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let product = state
        .products()
        .set_stock(parse_id(&id)?, request.stock)
        .await?;
    let stock_status = product.stock_status();

    Ok(Json(json!({
        "message": "Stock updated successfully",
        "product": product,
        "stockStatus": stock_status,
    })))
}

/// Add a rating between 1 and 5.
async fn add_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RatingRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let product = state
        .products()
        .add_rating(parse_id(&id)?, request.rating)
        .await?;

    Ok(Json(json!({
        "message": "Rating added successfully",
        "product": product,
    })))
}

/// Catalog statistics over active products.
async fn stats_overview(State(state): State<AppState>) -> AppResult<Json<ProductStats>> {
    let stats = state.products().stats().await?;
    Ok(Json(stats))
}
