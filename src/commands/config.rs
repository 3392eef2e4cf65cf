//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use checkpoint_core::config::AppConfig;
use checkpoint_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
}

/// Execute config commands
pub fn execute(
    args: &ConfigArgs,
    config: &AppConfig,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut shown = config.clone();
            shown.database.url = mask_password(&shown.database.url);

            let rows = vec![
                ("Source", config_path.to_string()),
                ("Backend", format!("{:?}", shown.database.backend)),
                ("Database", shown.database.url.clone()),
                ("Seeded users", shown.directory.users.len().to_string()),
                ("QR TTL", format!("{}s", shown.qr.ttl_seconds)),
                ("Max clock skew", format!("{}s", shown.qr.max_clock_skew_seconds)),
                ("Default reward", shown.points.default_reward.to_string()),
                ("Log level", shown.logging.level.clone()),
                ("Log format", shown.logging.format.clone()),
            ];
            output::print_record(&shown, &rows, format);
        }
    }

    Ok(())
}

/// Hide the password portion of a database URL.
fn mask_password(url: &str) -> String {
    let Some(at) = url.rfind('@') else {
        return url.to_string();
    };
    let credentials_start = url.find("://").map(|p| p + 3).unwrap_or(0);
    match url[..at].rfind(':') {
        Some(colon) if colon >= credentials_start => {
            format!("{}:****@{}", &url[..colon], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
