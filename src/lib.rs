pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod services;
pub mod state;
pub mod validation;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::state::AppState;

/// Assemble the full router: catalog routes, auth routes, the standalone
/// upload helper and static serving of stored images.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.media.max_file_bytes
        * (state.config.media.max_files_per_product + 2);
    let uploads_dir = state.config.media.upload_dir.clone();

    Router::new()
        .route("/health", get(health))
        .merge(category_routes())
        .merge(product_routes())
        .merge(auth_routes(state.clone()))
        .merge(upload_routes())
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&state.config.security.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Restrict CORS to the configured origins; an empty list or a `*` entry
/// falls back to the permissive layer.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn category_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::categories;

    Router::new()
        .route("/categories", post(categories::create).get(categories::list))
        .route(
            "/categories/:id",
            get(categories::get_one)
                .put(categories::update)
                .delete(categories::remove),
        )
}

fn product_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::products;

    Router::new()
        .route("/products", post(products::create).get(products::list))
        .route(
            "/products/:id",
            get(products::get_one)
                .put(products::update)
                .delete(products::remove),
        )
        .route(
            "/products/:id/categories/:category_id",
            post(products::link).delete(products::unlink),
        )
}

fn auth_routes(state: AppState) -> Router<AppState> {
    use axum::routing::post;
    use handlers::auth;

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .merge(protected)
}

fn upload_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::upload;

    Router::new().route("/upload/categories", post(upload::category_image))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok",
            })),
        ),
        Err(e) => {
            // The connection error can carry host/credential details; keep it
            // server-side
            tracing::warn!(error = %e, "health check: database unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable",
                })),
            )
        }
    }
}
