use axum::{
    extract::{Path, State},
    Json,
};
use contracts::domain::a001_product::{Product, ProductId};
use contracts::domain::common::AggregateId;

use crate::api::{ApiError, AppState};

/// GET /api/products
pub async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.products.list_all().await?))
}

/// GET /api/products/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product_id = ProductId::from_string(&id)
        .map_err(|e| ApiError::BadRequest(format!("invalid id '{}': {}", id, e)))?;
    state
        .products
        .get_by_id(product_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("product {} not found", id)))
}
