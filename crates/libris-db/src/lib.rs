//! # Libris DB
//!
//! Connection pool, embedded migrations and the two persistent stores of the auth
//! service:
//!
//! - [`UserStore`]: the credential store
//! - [`RefreshTokenStore`]: refresh token rows, including the atomic [`RefreshTokenStore::rotate`]
//!
//! Both traits are object safe so the service holds them as `Arc<dyn ...>`. The
//! Postgres implementations are used in production; the in-memory ones (feature
//! `test-utils`) back unit and router tests.

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod refresh_tokens;
pub mod users;

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use libris_config::DatabaseConfig;

pub use error::StoreError;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::{MemoryRefreshTokenStore, MemoryUserStore};
pub use refresh_tokens::{PgRefreshTokenStore, RefreshTokenStore};
pub use users::{PgUserStore, UserStore};

// Re-export PgPool for convenience
pub use sqlx::PgPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Opens the PostgreSQL pool described by `config`.
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    info!(max_connections = config.max_connections, "Database pool ready");
    Ok(pool)
}

/// Applies pending migrations from `./migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
