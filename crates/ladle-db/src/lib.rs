pub mod ports;

mod activity;
mod follows;
mod notifications;
mod preferences;
mod users;

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use thiserror::Error;
use tracing::info;

use ladle_types::api::DbPoolStats;

/// Errors surfaced by the repository ports.
///
/// `Duplicate` is split out so services can map a unique-key violation
/// (duplicate username) to a conflict instead of a generic 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key")]
    Duplicate,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Database(e),
        }
    }
}

/// Connection settings for the PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct DbOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub pool_size: u32,
    pub min_idle: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

/// PostgreSQL access point. Cheap to clone; all state lives in the pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    max_connections: u32,
}

impl Database {
    /// Open the pool and run pending migrations.
    pub async fn connect(opts: &DbOptions) -> Result<Self, sqlx::Error> {
        let connect = PgConnectOptions::new()
            .host(&opts.host)
            .port(opts.port)
            .username(&opts.user)
            .password(&opts.password)
            .database(&opts.database);

        let pool = PgPoolOptions::new()
            .max_connections(opts.pool_size)
            .min_connections(opts.min_idle)
            .acquire_timeout(opts.acquire_timeout)
            .idle_timeout(opts.idle_timeout)
            .connect_with(connect)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        info!(
            "Database pool ready ({} max connections) at {}:{}/{}",
            opts.pool_size, opts.host, opts.port, opts.database
        );
        Ok(Self {
            pool,
            max_connections: opts.pool_size,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Cheap round-trip used by the readiness and health probes.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool_stats(&self) -> DbPoolStats {
        let size = self.pool.size();
        let idle = self.pool.num_idle() as u32;
        DbPoolStats {
            active_connections: size.saturating_sub(idle),
            max_connections: self.max_connections,
        }
    }
}
