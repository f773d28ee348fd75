use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use super::collect_multipart;
use crate::db::models::ProductWithCategories;
use crate::error::ApiError;
use crate::services::ProductService;
use crate::state::AppState;
use crate::validation::forms::{ProductCreate, ProductUpdate};

/// POST /products - multipart: fields plus up to 10 images
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductWithCategories>), ApiError> {
    let (fields, files) = collect_multipart(multipart).await?;
    let form = ProductCreate::from_fields(&fields)?;

    let product = ProductService::new(&state).create(form, &files).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductWithCategories>>, ApiError> {
    let products = ProductService::new(&state).list().await?;
    Ok(Json(products))
}

/// GET /products/:id
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductWithCategories>, ApiError> {
    let product = ProductService::new(&state).get(id).await?;
    Ok(Json(product))
}

/// PUT /products/:id - multipart, partial update
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ProductWithCategories>, ApiError> {
    let (fields, files) = collect_multipart(multipart).await?;
    let form = ProductUpdate::from_fields(&fields)?;

    let product = ProductService::new(&state).update(id, form, &files).await?;
    Ok(Json(product))
}

/// DELETE /products/:id
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let body = ProductService::new(&state).delete(id).await?;
    Ok(Json(body))
}

/// POST /products/:id/categories/:category_id
pub async fn link(
    State(state): State<AppState>,
    Path((id, category_id)): Path<(i64, i64)>,
) -> Result<Json<ProductWithCategories>, ApiError> {
    let product = ProductService::new(&state)
        .link_category(id, category_id)
        .await?;
    Ok(Json(product))
}

/// DELETE /products/:id/categories/:category_id
pub async fn unlink(
    State(state): State<AppState>,
    Path((id, category_id)): Path<(i64, i64)>,
) -> Result<Json<ProductWithCategories>, ApiError> {
    let product = ProductService::new(&state)
        .unlink_category(id, category_id)
        .await?;
    Ok(Json(product))
}
