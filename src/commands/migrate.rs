//! Database migration command.

use checkpoint_core::config::{AppConfig, StorageBackend};
use checkpoint_core::error::AppError;
use checkpoint_database::pool;

use crate::output;

/// Apply all pending migrations to the configured PostgreSQL database
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    if config.database.backend != StorageBackend::Postgres {
        return Err(AppError::configuration(
            "Migrations need database.backend = \"postgres\"",
        ));
    }

    let mut database = config.database.clone();
    database.run_migrations = true;

    println!("Running database migrations...");
    let pool = pool::open(&database).await?;
    pool.close().await;
    output::print_success("All migrations applied successfully.");
    Ok(())
}
