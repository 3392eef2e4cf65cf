//! CLI command definitions and dispatch.

pub mod config;
pub mod issue;
pub mod ledger;
pub mod migrate;
pub mod scan;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::warn;

use checkpoint_core::config::{AppConfig, StorageBackend};
use checkpoint_core::error::AppError;
use checkpoint_database::dispatch;
use checkpoint_service::Services;

use crate::output::OutputFormat;

/// Shown after the option list of `--help`.
const STORAGE_NOTE: &str = "\
Storage:
  With the default `database.backend = \"memory\"` every invocation starts
  from an empty ledger, so `balance`, `history` and `roster` never see the
  check-ins recorded by an earlier `scan`. Set `database.backend =
  \"postgres\"` (or CHECKPOINT__DATABASE__BACKEND=postgres) and run
  `checkpoint migrate` once to keep state between invocations.";

/// Checkpoint: QR check-in and loyalty points ledger
#[derive(Debug, Parser)]
#[command(name = "checkpoint", version, about, long_about = None, after_help = STORAGE_NOTE)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Issue a QR token
    Issue(issue::IssueArgs),
    /// Process a scanned token
    Scan(scan::ScanArgs),
    /// Show a user's balance and tier
    Balance(ledger::BalanceArgs),
    /// Show a user's points transactions
    History(ledger::HistoryArgs),
    /// List check-ins for an event
    Roster(ledger::RosterArgs),
    /// Apply database migrations
    Migrate,
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<ExitCode, AppError> {
        match &self.command {
            Commands::Issue(args) => issue::execute(args, &config, self.format).await?,
            Commands::Scan(args) => return scan::execute(args, &config, self.format).await,
            Commands::Balance(args) => ledger::balance(args, &config, self.format).await?,
            Commands::History(args) => ledger::history(args, &config, self.format).await?,
            Commands::Roster(args) => ledger::roster(args, &config, self.format).await?,
            Commands::Migrate => migrate::execute(&config).await?,
            Commands::Config(args) => config::execute(args, &config, &self.config, self.format)?,
        }
        Ok(ExitCode::SUCCESS)
    }
}

/// Helper: load configuration from file, with the overlay named by
/// `CHECKPOINT_ENV` when set
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    let env = std::env::var("CHECKPOINT_ENV").ok();
    AppConfig::load(config_path, env.as_deref())
}

/// Helper: connect the configured backends and wire the services
pub async fn build_services(config: &AppConfig) -> Result<Services, AppError> {
    if config.database.backend == StorageBackend::Memory {
        warn!("In-memory backend: ledger state is discarded when this command exits");
    }
    let (store, directory) = dispatch::connect(config).await?;
    Ok(Services::new(config, Arc::new(store), Arc::new(directory)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_help_explains_memory_backend() {
        let help = Cli::command().render_help().to_string();
        assert!(help.contains("every invocation starts"));
        assert!(help.contains("checkpoint migrate"));
    }

    #[test]
    fn test_scan_requires_organizer() {
        let parsed = Cli::try_parse_from(["checkpoint", "scan", "TOKEN"]);
        assert!(parsed.is_err());

        let parsed =
            Cli::try_parse_from(["checkpoint", "scan", "TOKEN", "--organizer", "org", "-e", "E"]);
        assert!(matches!(parsed.map(|cli| cli.command), Ok(Commands::Scan(_))));
    }
}
