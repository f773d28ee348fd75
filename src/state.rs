use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::TokenSigner;
use crate::config::AppConfig;
use crate::media::MediaStore;

/// Application context built once in `main` and passed to every handler.
/// Replaces ambient globals with an explicit lifecycle: the pool and media
/// store are opened at startup and dropped at shutdown.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: PgPool,
    pub media: MediaStore,
    pub tokens: TokenSigner,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        let media = MediaStore::new(
            config.media.upload_dir.clone(),
            config.media.max_file_bytes,
            config.media.max_files_per_product,
        );
        let tokens = TokenSigner::new(
            &config.security.jwt_secret,
            config.security.jwt_expiry_hours,
        );

        Self { config: Arc::new(config), pool, media, tokens }
    }
}
