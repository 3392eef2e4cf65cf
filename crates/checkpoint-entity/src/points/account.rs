//! Materialized points account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use checkpoint_core::types::UserId;

use super::tier::{Tier, tier_for};

/// Per-user balance aggregate.
///
/// This is the only mutable record in the ledger, and it changes only as
/// a side effect of appending a transaction. The tier is derived on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserPointsAccount {
    /// Account owner.
    pub user_id: UserId,
    /// Sum of all transaction deltas.
    pub current_balance: i64,
    /// Number of transactions applied; equals the last `sequence`.
    pub transaction_count: i64,
    /// When the last transaction was applied.
    pub updated_at: DateTime<Utc>,
}

impl UserPointsAccount {
    /// An account with no transactions yet.
    pub fn empty(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            current_balance: 0,
            transaction_count: 0,
            updated_at: now,
        }
    }

    /// Loyalty tier for the current balance.
    pub fn tier(&self) -> Tier {
        tier_for(self.current_balance)
    }
}
