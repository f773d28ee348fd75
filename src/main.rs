use anyhow::Context;

use catalog_api::config::{AppConfig, Environment};
use catalog_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_api=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!("starting catalog-api in {:?} mode", config.environment);

    if config.environment == Environment::Production {
        if config.security.jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must be set in production");
        }
        if config.database.url.is_empty() {
            anyhow::bail!("DATABASE_URL must be set in production");
        }
    }

    let pool = match catalog_api::db::connect_pool(&config.database) {
        Ok(pool) => pool,
        Err(e) => {
            // Lazy pool creation only fails on a malformed/missing URL
            anyhow::bail!("database configuration error: {}", e);
        }
    };

    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(()) => tracing::info!("migrations applied"),
        Err(e) => tracing::warn!("skipping migrations, database unavailable: {}", e),
    }

    tokio::fs::create_dir_all(&config.media.upload_dir)
        .await
        .with_context(|| format!("creating upload dir {:?}", config.media.upload_dir))?;

    let port = config.server.port;
    let state = AppState::new(config, pool);
    let router = catalog_api::app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("catalog-api listening on http://{}", bind_addr);
    axum::serve(listener, router).await.context("server")?;

    Ok(())
}
