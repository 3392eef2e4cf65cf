//! PostgreSQL pool setup and schema migrations.
//!
//! The schema lives in the workspace `migrations/` directory and is
//! embedded at compile time, so a deployed binary never needs the SQL
//! files on disk.

use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use checkpoint_core::config::DatabaseConfig;
use checkpoint_core::error::{AppError, ErrorKind};
use checkpoint_core::result::AppResult;

/// The check-in ledger schema.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Open a pool against the ledger database, applying pending migrations
/// first when `run_migrations` is set.
pub async fn open(config: &DatabaseConfig) -> AppResult<PgPool> {
    if config.url.trim().is_empty() {
        return Err(AppError::configuration(
            "database.url is required for the postgres backend",
        ));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .connect(&config.url)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageUnavailable,
                "Ledger database is unreachable",
                e,
            )
        })?;

    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Ledger database pool ready"
    );

    if config.run_migrations {
        migrate(&pool).await?;
    }
    Ok(pool)
}

/// Apply every migration the database has not seen yet.
pub async fn migrate(pool: &PgPool) -> AppResult<()> {
    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::StorageUnavailable,
            "Failed to apply ledger schema migrations",
            e,
        )
    })?;

    let latest = MIGRATOR.iter().map(|m| m.version).max();
    info!(schema_version = ?latest, "Ledger schema is current");
    Ok(())
}
