//! Scan processing command.

use std::process::ExitCode;

use clap::Args;

use checkpoint_core::config::AppConfig;
use checkpoint_core::error::AppError;
use checkpoint_core::types::{EventId, UserId};
use checkpoint_service::{EventContext, ScanRequest, ScanResult};

use crate::output::{self, OutputFormat};

/// Arguments for the scan command
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Token read from the QR code or typed in
    pub token: String,

    /// Organizer performing the scan
    #[arg(short, long)]
    pub organizer: String,

    /// Event being checked into (required for profile codes)
    #[arg(short, long)]
    pub event: Option<String>,

    /// Points to award, overriding the code's own reward
    #[arg(short, long, requires = "event")]
    pub points: Option<i64>,
}

/// Exit status for a scan that was rejected but may succeed on retry.
/// Matches `EX_TEMPFAIL` from sysexits.
const EXIT_RETRYABLE: u8 = 75;

/// Execute the scan command. A rejected scan still prints its result but
/// exits non-zero.
pub async fn execute(
    args: &ScanArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<ExitCode, AppError> {
    let services = super::build_services(config).await?;

    let request = ScanRequest {
        token: args.token.clone(),
        organizer_id: UserId::new(args.organizer.as_str()),
        event: args.event.as_ref().map(|event_id| EventContext {
            event_id: EventId::new(event_id.as_str()),
            points_reward: args.points,
        }),
    };

    let result = services.scans.scan(&request).await;

    match &result {
        ScanResult::Success(success) => {
            let mut rows = vec![
                ("User", format!("{} ({})", success.display_name, success.user_id)),
                ("Event", success.event_id.to_string()),
                ("Points awarded", success.points_awarded.to_string()),
                ("Balance", success.new_balance.to_string()),
                ("Tier", success.tier.to_string()),
            ];
            if let Some(remaining) = success.points_to_next_tier {
                rows.push(("To next tier", remaining.to_string()));
            }
            output::print_record(&result, &rows, format);
            if format == OutputFormat::Table {
                if success.tier_changed {
                    output::print_success(&format!(
                        "Promoted from {} to {}",
                        success.previous_tier, success.tier
                    ));
                } else {
                    output::print_success("Checked in");
                }
            }
        }
        ScanResult::Failure(failure) => match format {
            OutputFormat::Json => output::print_json(&result, "{}"),
            OutputFormat::Table if failure.retryable => {
                output::print_warning(&failure.reason);
            }
            OutputFormat::Table => output::print_error(&failure.reason),
        },
    }

    Ok(ExitCode::from(exit_status(&result)))
}

/// 0 on success, 75 for a retryable failure, 1 otherwise.
fn exit_status(result: &ScanResult) -> u8 {
    match result.failure() {
        None => 0,
        Some(failure) if failure.retryable => EXIT_RETRYABLE,
        Some(_) => 1,
    }
}
