// Typed access to the relational store.

pub mod categories;
pub mod models;
pub mod products;
pub mod users;

pub use categories::CategoryRepo;
pub use products::ProductRepo;
pub use users::UserRepo;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseConfig;

/// Errors surfaced by the persistence gateway. Unique-constraint violations
/// are distinguished so the boundary can map them to 409 Conflict.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    UniqueViolation(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Postgres unique_violation
const UNIQUE_VIOLATION_CODE: &str = "23505";

/// Map an insert/update error, turning a unique-constraint violation into
/// its own variant with a client-facing message.
pub(crate) fn map_constraint_err(err: sqlx::Error, conflict_message: String) -> DbError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION_CODE) {
            return DbError::UniqueViolation(conflict_message);
        }
    }
    DbError::Sqlx(err)
}

/// Create the connection pool. Connects lazily so the server can start (and
/// report degraded health) while the database is unreachable; acquire is
/// bounded so outages surface as errors rather than hangs.
pub fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_lazy(&config.url)?;

    Ok(pool)
}

/// Pings the pool to verify connectivity
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
