//! PostgreSQL persistence for users, lots, and parking sessions.
//!
//! - [`repositories`] -- plain reads and writes, one unit struct per table.
//! - [`ledger`] -- the transactional Enter/Exit state machine and the lot
//!   occupancy ledger it drives.
//! - [`bootstrap`] -- one-time startup normalization and seeding.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod bootstrap;
pub mod error;
pub mod ledger;
pub mod models;
pub mod repositories;

pub use error::LedgerError;

pub type DbPool = sqlx::PgPool;

/// Default maximum pool size.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Run a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
