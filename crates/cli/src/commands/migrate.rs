//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! cb-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for the
//!   storefront (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Storefront migrations: `crates/sync/migrations/`
//!
//! ```text
//! migrations/
//! └── 20261019000001_create_storefront_products.sql
//! ```

use thiserror::Error;

use catalog_bridge_sync::config::{ConfigError, storefront_database_url_from_env};
use catalog_bridge_sync::storefront::create_pool;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing, the database is
/// unreachable, or a migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    let database_url = storefront_database_url_from_env()?;

    tracing::info!("Connecting to storefront database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../sync/migrations").run(&pool).await?;

    tracing::info!("Storefront migrations complete");
    Ok(())
}
