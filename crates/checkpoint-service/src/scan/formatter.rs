//! Turns scan outcomes into caller-facing results.
//!
//! Failure reasons come from a fixed table keyed on [`ErrorKind`]; the
//! error's own message never reaches the caller.

use serde::{Deserialize, Serialize};

use checkpoint_core::error::{AppError, ErrorKind};
use checkpoint_core::types::{CheckInId, EventId, PayloadId, UserId};
use checkpoint_entity::points::{Tier, points_to_next_tier, tier_for};
use checkpoint_entity::qr::QrPayload;
use checkpoint_entity::user::UserProfile;

use crate::checkin::CheckInReceipt;

/// Outcome of one scan, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanResult {
    /// The check-in was recorded and points were awarded.
    Success(ScanSuccess),
    /// Nothing was recorded.
    Failure(ScanFailure),
}

impl ScanResult {
    /// Whether the scan recorded a check-in.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The success body, if any.
    pub fn success(&self) -> Option<&ScanSuccess> {
        match self {
            Self::Success(success) => Some(success),
            Self::Failure(_) => None,
        }
    }

    /// The failure body, if any.
    pub fn failure(&self) -> Option<&ScanFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

/// A recorded check-in as shown to the organizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSuccess {
    pub user_id: UserId,
    pub display_name: String,
    pub event_id: EventId,
    pub check_in_id: CheckInId,
    pub payload_id: PayloadId,
    pub points_awarded: i64,
    pub new_balance: i64,
    pub tier: Tier,
    pub previous_tier: Tier,
    /// Whether this check-in moved the user into a new tier.
    pub tier_changed: bool,
    /// `None` at the top tier.
    pub points_to_next_tier: Option<i64>,
}

/// Category of a failed scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanFailureKind {
    MalformedPayload,
    ExpiredPayload,
    AlreadyCheckedIn,
    UnknownUser,
    UnsupportedPayload,
    EventMismatch,
    StorageUnavailable,
    Internal,
}

impl ScanFailureKind {
    /// Fixed human-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedPayload => "Invalid QR code",
            Self::ExpiredPayload => "QR code expired",
            Self::AlreadyCheckedIn => "Already checked in",
            Self::UnknownUser => "User not found",
            Self::UnsupportedPayload => "This QR code cannot be used for check-in",
            Self::EventMismatch => "QR code is for a different event",
            Self::StorageUnavailable => "Service temporarily unavailable, please try again",
            Self::Internal => "Check-in failed",
        }
    }

    /// Whether the organizer may retry the same scan.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable)
    }
}

impl From<ErrorKind> for ScanFailureKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::MalformedPayload => Self::MalformedPayload,
            ErrorKind::ExpiredPayload => Self::ExpiredPayload,
            ErrorKind::AlreadyCheckedIn => Self::AlreadyCheckedIn,
            ErrorKind::UnknownUser => Self::UnknownUser,
            ErrorKind::UnsupportedPayload => Self::UnsupportedPayload,
            ErrorKind::EventMismatch => Self::EventMismatch,
            ErrorKind::StorageUnavailable => Self::StorageUnavailable,
            ErrorKind::Validation
            | ErrorKind::Configuration
            | ErrorKind::Serialization
            | ErrorKind::Internal => Self::Internal,
        }
    }
}

/// A rejected scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub kind: ScanFailureKind,
    pub reason: String,
    pub retryable: bool,
}

/// Compose the success result for a recorded check-in.
pub fn format_result(payload: &QrPayload, user: &UserProfile, receipt: &CheckInReceipt) -> ScanResult {
    let new_balance = receipt.account.current_balance;
    let tier = tier_for(new_balance);
    let previous_tier = tier_for(receipt.transaction.previous_balance());

    ScanResult::Success(ScanSuccess {
        user_id: user.id.clone(),
        display_name: user.display_name.clone(),
        event_id: receipt.record.event_id.clone(),
        check_in_id: receipt.record.id,
        payload_id: payload.id.clone(),
        points_awarded: receipt.transaction.delta,
        new_balance,
        tier,
        previous_tier,
        tier_changed: tier != previous_tier,
        points_to_next_tier: points_to_next_tier(new_balance),
    })
}

/// Compose the failure result for any error raised while scanning.
pub fn format_failure(error: &AppError) -> ScanResult {
    let kind = ScanFailureKind::from(error.kind);
    ScanResult::Failure(ScanFailure {
        kind,
        reason: kind.reason().to_string(),
        retryable: kind.is_retryable(),
    })
}
