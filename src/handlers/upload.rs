use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use super::collect_multipart;
use crate::error::ApiError;
use crate::media::OwnerKind;
use crate::state::AppState;

/// POST /upload/categories - standalone image upload helper returning an
/// absolute URL (for editors that need a URL before the entity exists)
pub async fn category_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (_, files) = collect_multipart(multipart).await?;
    let file = files
        .first()
        .ok_or_else(|| ApiError::bad_request("No image file supplied"))?;

    let url = state.media.store(OwnerKind::Categories, file).await?;
    let absolute = format!("{}{}", state.config.server.public_base_url, url);

    Ok((StatusCode::CREATED, Json(json!({ "url": absolute }))))
}
