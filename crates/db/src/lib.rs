//! Storage layer for the club service.
//!
//! - [`models`] -- row types and create / revision DTOs for the five tables.
//! - [`classify`] -- translation of native driver errors into [`StorageError`].
//! - [`accessor`] -- the transaction-bound [`ClubAccessor`] and its
//!   Postgres and recording implementations.
//! - [`manager`] -- [`AccessorManager`], which opens one accessor per request.

use sqlx::postgres::PgPoolOptions;

pub mod accessor;
pub mod classify;
pub mod error;
pub mod manager;
pub mod models;

pub use accessor::{AccessResult, ClubAccessor};
pub use error::StorageError;
pub use manager::AccessorManager;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations in `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
