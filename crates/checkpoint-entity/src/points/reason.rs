//! Points transaction reason enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a points transaction was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "points_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReasonType {
    /// Credit for a recorded event check-in.
    EventAttendance,
    /// Credit attached to a voucher.
    VoucherRedeem,
    /// Credit granted by an operator.
    ManualAward,
}

impl ReasonType {
    /// Return the reason as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventAttendance => "event_attendance",
            Self::VoucherRedeem => "voucher_redeem",
            Self::ManualAward => "manual_award",
        }
    }
}

impl fmt::Display for ReasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
