//! # Postgres storage
//!
//! Posts live in one table keyed by `BIGSERIAL` id with a `BIGINT[]`
//! materialized path. Array comparison in Postgres is lexicographic, so
//! `ORDER BY path` is a depth-first walk and path ranges are index scans.

mod posts;
mod sql;
mod threads;

use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub use posts::PgPostRepository;
pub use threads::PgThreadGateway;

/// Schema migrations embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

pub async fn connect(options: &DatabaseOptions) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(options.max_connections)
        .acquire_timeout(options.acquire_timeout)
        .connect(&options.url)
        .await?;
    info!(max_connections = options.max_connections, "connected to postgres");
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    info!("migrations applied");
    Ok(())
}
