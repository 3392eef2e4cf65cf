//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod database;
pub mod directory;
pub mod logging;
pub mod points;
pub mod qr;

use serde::{Deserialize, Serialize};

pub use self::database::{DatabaseConfig, StorageBackend};
pub use self::directory::{DirectoryConfig, SeedUser};
pub use self::logging::LoggingConfig;
pub use self::points::PointsConfig;
pub use self::qr::QrConfig;

use crate::error::AppError;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "CHECKPOINT";

/// Root application configuration.
///
/// Every section has defaults, so an empty file (or no file at all)
/// yields a working in-memory setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ledger storage settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// In-memory user directory seed.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// QR token settings.
    #[serde(default)]
    pub qr: QrConfig,
    /// Points award settings.
    #[serde(default)]
    pub points: PointsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Merges the base file with an optional environment overlay
    /// (`config/{env}.toml`) and environment variables prefixed with
    /// `CHECKPOINT__`, e.g. `CHECKPOINT__DATABASE__URL`.
    pub fn load(path: &str, env: Option<&str>) -> Result<Self, AppError> {
        let mut builder =
            config::Config::builder().add_source(config::File::with_name(path).required(false));

        if let Some(env) = env {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the ledger misbehave.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.qr.ttl_seconds == 0 {
            return Err(AppError::configuration("qr.ttl_seconds must be positive"));
        }
        if self.points.default_reward <= 0 {
            return Err(AppError::configuration(
                "points.default_reward must be positive",
            ));
        }
        if self.database.backend == StorageBackend::Postgres && self.database.url.is_empty() {
            return Err(AppError::configuration(
                "database.url is required for the postgres backend",
            ));
        }
        Ok(())
    }
}
