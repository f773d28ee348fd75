use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use super::collect_multipart;
use crate::db::models::Category;
use crate::error::ApiError;
use crate::services::CategoryService;
use crate::state::AppState;
use crate::validation::forms::{CategoryCreate, CategoryUpdate};

/// POST /categories - multipart: name, description, image?
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let (fields, files) = collect_multipart(multipart).await?;
    let form = CategoryCreate::from_fields(&fields)?;

    let category = CategoryService::new(&state)
        .create(form, files.first())
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /categories
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = CategoryService::new(&state).list().await?;
    Ok(Json(categories))
}

/// GET /categories/:id
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, ApiError> {
    let category = CategoryService::new(&state).get(id).await?;
    Ok(Json(category))
}

/// PUT /categories/:id - multipart, partial update
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Category>, ApiError> {
    let (fields, files) = collect_multipart(multipart).await?;
    let form = CategoryUpdate::from_fields(&fields)?;

    let category = CategoryService::new(&state)
        .update(id, form, files.first())
        .await?;

    Ok(Json(category))
}

/// DELETE /categories/:id
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let body = CategoryService::new(&state).delete(id).await?;
    Ok(Json(body))
}
