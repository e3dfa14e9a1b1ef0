//! Persistence layer: SQLite connection setup, schema management, row
//! models, counter reconciliation and the dynamic item query.
//!
//! The embedded SQLite database is accessed through `sqlx::SqlitePool`,
//! which is the plain storage handle injected into every service.

pub mod counters;
pub mod item_query;
pub mod models;
pub mod schema;

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Opens a connection pool for `database_url`.
///
/// In-memory databases (`sqlite::memory:`) live inside a single connection,
/// so the pool is pinned to one connection that is never recycled.
///
/// # Errors
///
/// Returns the driver error if the URL is invalid or the database cannot
/// be opened.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    connect_timeout_secs: u64,
) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let pool_options = SqlitePoolOptions::new()
        .acquire_timeout(Duration::from_secs(connect_timeout_secs));
    let pool_options = if in_memory {
        pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(max_connections.max(1))
    };

    let pool = pool_options.connect_with(options).await?;
    tracing::info!(in_memory, "database pool ready");
    Ok(pool)
}

/// Opens a fresh in-memory database with the full schema applied.
///
/// # Errors
///
/// Returns the driver error if the schema cannot be created.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let pool = connect("sqlite::memory:", 1, 5).await?;
    schema::ensure_schema(&pool).await?;
    Ok(pool)
}
