//! Database connection pooling utilities

use crate::config::DatabaseConfig;
use crate::error::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Type alias for the database pool
pub type DbPool = PgPool;

/// Create a new database connection pool
///
/// # Errors
///
/// Returns an error if the pool cannot be created or if the connection fails
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(180))
        .max_lifetime(Duration::from_secs(900))
        .connect(&config.connection_url())
        .await?;

    tracing::info!(
        "Database connection pool created with {} max connections",
        config.max_connections
    );

    Ok(pool)
}

/// Apply the embedded schema migrations (the `users` table)
///
/// # Errors
///
/// Returns an error if a migration fails to apply
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Check database connection health
///
/// # Errors
///
/// Returns an error if the connection check fails
pub async fn check_health(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
