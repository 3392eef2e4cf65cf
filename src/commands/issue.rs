//! QR token issuance commands.

use std::sync::Arc;

use clap::{Args, Subcommand};

use checkpoint_core::config::AppConfig;
use checkpoint_core::error::AppError;
use checkpoint_core::types::{EventId, SystemClock, UserId, VoucherId};
use checkpoint_service::{IssuedCode, QrCodec, QrIssuer};

use crate::output::{self, OutputFormat};

/// Arguments for issue commands
#[derive(Debug, Args)]
pub struct IssueArgs {
    /// Payload kind
    #[command(subcommand)]
    pub command: IssueCommand,
}

/// Issue subcommands
#[derive(Debug, Subcommand)]
pub enum IssueCommand {
    /// A profile code; the organizer picks the event when scanning
    Profile {
        /// Subject user id
        user: String,
    },
    /// A code bound to one event
    Event {
        /// Subject user id
        user: String,
        /// Event id
        event: String,
        /// Points to award on check-in
        #[arg(short, long)]
        points: Option<i64>,
    },
    /// A voucher code
    Voucher {
        /// Subject user id
        user: String,
        /// Voucher id
        voucher: String,
    },
}

/// Execute issue commands
pub async fn execute(
    args: &IssueArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let issuer = QrIssuer::new(QrCodec::new(&config.qr), Arc::new(SystemClock));

    let code = match &args.command {
        IssueCommand::Profile { user } => issuer.issue_profile(&UserId::new(user.as_str()))?,
        IssueCommand::Event {
            user,
            event,
            points,
        } => issuer.issue_event_checkin(
            &UserId::new(user.as_str()),
            &EventId::new(event.as_str()),
            *points,
        )?,
        IssueCommand::Voucher { user, voucher } => issuer.issue_voucher(
            &UserId::new(user.as_str()),
            &VoucherId::new(voucher.as_str()),
        )?,
    };

    output::print_record(&code, &rows(&code, config), format);
    Ok(())
}

fn rows(code: &IssuedCode, config: &AppConfig) -> Vec<(&'static str, String)> {
    let payload = &code.payload;
    let mut rows = vec![
        ("Payload", payload.id.to_string()),
        ("Kind", payload.kind.to_string()),
        ("User", payload.subject_user_id.to_string()),
    ];
    if let Some(event_id) = &payload.event_id {
        rows.push(("Event", event_id.to_string()));
    }
    if let Some(voucher_id) = &payload.voucher_id {
        rows.push(("Voucher", voucher_id.to_string()));
    }
    if let Some(points) = payload.points {
        rows.push(("Points", points.to_string()));
    }
    rows.push(("Issued", payload.issued_at.to_rfc3339()));
    rows.push(("Valid for", format!("{}s", config.qr.ttl_seconds)));
    rows.push(("Token", code.token.clone()));
    rows
}
