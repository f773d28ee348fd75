use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::auth_service::{LoginResponse, UserInfo};
use crate::services::AuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// POST /auth/login - JSON credentials in, bearer token out
pub async fn login(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let response = AuthService::new(&state)
        .login(&creds.username, &creds.password)
        .await?;
    Ok(Json(response))
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<(StatusCode, Json<UserInfo>), ApiError> {
    let user = AuthService::new(&state)
        .register(&creds.username, &creds.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /auth/me - requires a valid bearer token
pub async fn me(Extension(user): Extension<AuthUser>) -> Json<Value> {
    Json(json!({
        "userId": user.user_id,
        "username": user.username,
    }))
}
