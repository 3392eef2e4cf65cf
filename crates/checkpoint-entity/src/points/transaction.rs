//! Points transaction model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use checkpoint_core::types::{TransactionId, UserId};

use super::reason::ReasonType;

/// One immutable entry in a user's points log.
///
/// For a given user, entries ordered by `sequence` satisfy
/// `resulting_balance[n] == resulting_balance[n - 1] + delta[n]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PointsTransaction {
    /// Unique transaction identifier.
    pub id: TransactionId,
    /// Account owner.
    pub user_id: UserId,
    /// Position in the user's log, starting at 1.
    pub sequence: i64,
    /// Signed balance change.
    pub delta: i64,
    /// Why the change happened.
    pub reason_type: ReasonType,
    /// What the change refers to (an event ID for attendance).
    pub reference_id: Option<String>,
    /// When the entry was committed.
    pub recorded_at: DateTime<Utc>,
    /// Balance immediately after applying `delta`.
    pub resulting_balance: i64,
}

impl PointsTransaction {
    /// Balance immediately before this entry was applied.
    pub fn previous_balance(&self) -> i64 {
        self.resulting_balance - self.delta
    }
}
