//! Balance, history, and roster commands.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use checkpoint_core::config::AppConfig;
use checkpoint_core::error::AppError;
use checkpoint_core::types::{EventId, UserId};
use checkpoint_entity::points::{Tier, points_to_next_tier, tier_for};

use crate::output::{self, OutputFormat};

/// Arguments for the balance command
#[derive(Debug, Args)]
pub struct BalanceArgs {
    /// User id
    pub user: String,

    /// Recompute the balance from the transaction log
    #[arg(long)]
    pub verify: bool,
}

/// Arguments for the history command
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// User id
    pub user: String,
}

/// Arguments for the roster command
#[derive(Debug, Args)]
pub struct RosterArgs {
    /// Event id
    pub event: String,
}

#[derive(Debug, Serialize)]
struct BalanceView {
    user_id: UserId,
    balance: i64,
    tier: Tier,
    points_to_next_tier: Option<i64>,
}

/// Transaction display row for table output
#[derive(Debug, Serialize, Tabled)]
struct TransactionRow {
    /// Sequence number
    #[tabled(rename = "#")]
    sequence: i64,
    /// Points delta
    delta: i64,
    /// Reason
    reason: String,
    /// Reference
    reference: String,
    /// Balance after
    balance: i64,
    /// Recorded at
    recorded_at: String,
}

/// Check-in display row for table output
#[derive(Debug, Serialize, Tabled)]
struct CheckInRow {
    /// User ID
    user: String,
    /// Points awarded
    points: i64,
    /// Scanned by
    scanned_by: String,
    /// Recorded at
    recorded_at: String,
}

/// Show a user's balance and tier
pub async fn balance(
    args: &BalanceArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::build_services(config).await?;
    let user_id = UserId::new(args.user.as_str());

    let balance = services.points.get_balance(&user_id).await?;
    let view = BalanceView {
        user_id,
        balance,
        tier: tier_for(balance),
        points_to_next_tier: points_to_next_tier(balance),
    };

    let mut rows = vec![
        ("User", view.user_id.to_string()),
        ("Balance", view.balance.to_string()),
        ("Tier", view.tier.to_string()),
    ];
    if let Some(remaining) = view.points_to_next_tier {
        rows.push(("To next tier", remaining.to_string()));
    }
    output::print_record(&view, &rows, format);

    if args.verify {
        let audit = services.points.verify_account(&view.user_id).await?;
        match format {
            OutputFormat::Json => output::print_json(&audit, "{}"),
            OutputFormat::Table if audit.is_consistent() => {
                output::print_success(&format!(
                    "Ledger consistent across {} transactions",
                    audit.transaction_count
                ));
            }
            OutputFormat::Table => output::print_warning(&format!(
                "Ledger drift: stored {} but transactions sum to {}",
                audit.materialized_balance, audit.recomputed_balance
            )),
        }
    }

    Ok(())
}

/// Show a user's points transactions
pub async fn history(
    args: &HistoryArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::build_services(config).await?;
    let transactions = services
        .points
        .history(&UserId::new(args.user.as_str()))
        .await?;

    let rows: Vec<TransactionRow> = transactions
        .iter()
        .map(|t| TransactionRow {
            sequence: t.sequence,
            delta: t.delta,
            reason: t.reason_type.to_string(),
            reference: t.reference_id.clone().unwrap_or_default(),
            balance: t.resulting_balance,
            recorded_at: t.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    output::print_list(&rows, format);
    Ok(())
}

/// List check-ins for an event
pub async fn roster(
    args: &RosterArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::build_services(config).await?;
    let records = services
        .check_ins
        .list_check_ins(&EventId::new(args.event.as_str()))
        .await?;

    let rows: Vec<CheckInRow> = records
        .iter()
        .map(|r| CheckInRow {
            user: r.user_id.to_string(),
            points: r.points_awarded,
            scanned_by: r.scanned_by.to_string(),
            recorded_at: r.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    output::print_list(&rows, format);
    Ok(())
}
