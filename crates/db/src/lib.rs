//! Measurement store backed by PostgreSQL.
//!
//! Pool construction, migrations, a reachability check, and the
//! [`repositories::MeasurementRepo`] query layer.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub mod config;
pub mod health;
pub mod models;
pub mod repositories;

pub use config::DbConfig;
pub use health::DbHealthCheck;

pub type DbPool = sqlx::PgPool;

/// How long a caller may wait for a pooled connection.
///
/// Kept well below the shortest sensible heartbeat period so a stuck
/// database shows up as a failed health check rather than a stalled tick.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

/// Create a connection pool from explicit connect options.
pub async fn create_pool(
    options: PgConnectOptions,
    max_connections: u32,
) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
}

/// Create a connection pool from a database URL.
pub async fn create_pool_from_url(
    database_url: &str,
    max_connections: u32,
) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
