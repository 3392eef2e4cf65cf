//! Scan orchestration: token in, formatted result out.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use checkpoint_core::error::AppError;
use checkpoint_core::result::AppResult;
use checkpoint_core::types::{EventId, UserId};
use checkpoint_database::store::UserDirectory;
use checkpoint_entity::qr::{PayloadKind, QrPayload};

use super::formatter::{ScanResult, format_failure, format_result};
use crate::checkin::CheckInLedger;
use crate::qr::QrCodec;

/// The event an organizer is scanning for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    pub event_id: EventId,
    /// Overrides any reward carried in the payload.
    pub points_reward: Option<i64>,
}

/// One scan as submitted by an organizer's device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Raw token, camera-read or typed in.
    pub token: String,
    pub organizer_id: UserId,
    pub event: Option<EventContext>,
}

/// Progress of a single scan attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    Scanned,
    Decoded,
    Validated,
    LedgerChecked,
    Recorded,
    PointsAwarded,
    Formatted,
}

impl ScanStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scanned => "scanned",
            Self::Decoded => "decoded",
            Self::Validated => "validated",
            Self::LedgerChecked => "ledger_checked",
            Self::Recorded => "recorded",
            Self::PointsAwarded => "points_awarded",
            Self::Formatted => "formatted",
        }
    }
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the stage reached so failures can be logged with it.
#[derive(Debug)]
struct ScanAttempt<'a> {
    organizer_id: &'a UserId,
    stage: ScanStage,
}

impl<'a> ScanAttempt<'a> {
    fn start(organizer_id: &'a UserId) -> Self {
        debug!(organizer_id = %organizer_id, stage = %ScanStage::Scanned, "Scan started");
        Self {
            organizer_id,
            stage: ScanStage::Scanned,
        }
    }

    fn advance(&mut self, stage: ScanStage) {
        debug!(
            organizer_id = %self.organizer_id,
            from = %self.stage,
            stage = %stage,
            "Scan stage reached"
        );
        self.stage = stage;
    }
}

/// Decodes a scanned token, records the check-in, and formats the outcome.
#[derive(Debug, Clone)]
pub struct ScanService {
    codec: QrCodec,
    check_ins: Arc<CheckInLedger>,
    directory: Arc<dyn UserDirectory>,
    default_reward: i64,
}

impl ScanService {
    /// Creates a new scan service.
    pub fn new(
        codec: QrCodec,
        check_ins: Arc<CheckInLedger>,
        directory: Arc<dyn UserDirectory>,
        default_reward: i64,
    ) -> Self {
        Self {
            codec,
            check_ins,
            directory,
            default_reward,
        }
    }

    /// Process one scan. Never fails; errors become
    /// [`ScanResult::Failure`].
    pub async fn scan(&self, request: &ScanRequest) -> ScanResult {
        let mut attempt = ScanAttempt::start(&request.organizer_id);

        let outcome = self.run(request, &mut attempt).await;
        let failed_at = attempt.stage;
        attempt.advance(ScanStage::Formatted);

        match outcome {
            Ok(result) => result,
            Err(error) => {
                if error.is_retryable() {
                    warn!(
                        organizer_id = %request.organizer_id,
                        stage = %failed_at,
                        kind = %error.kind,
                        error = %error,
                        "Scan failed, storage unavailable"
                    );
                } else {
                    info!(
                        organizer_id = %request.organizer_id,
                        stage = %failed_at,
                        kind = %error.kind,
                        error = %error,
                        "Scan rejected"
                    );
                }
                format_failure(&error)
            }
        }
    }

    async fn run(&self, request: &ScanRequest, attempt: &mut ScanAttempt<'_>) -> AppResult<ScanResult> {
        let payload = self.codec.parse(&request.token)?;
        attempt.advance(ScanStage::Decoded);

        self.codec.validate_at(&payload, self.check_ins.points().clock().now())?;
        attempt.advance(ScanStage::Validated);

        let event_id = resolve_event(&payload, request.event.as_ref())?;
        let points = self.resolve_points(&payload, request.event.as_ref())?;

        let user = self
            .directory
            .find_user(&payload.subject_user_id)
            .await?
            .ok_or_else(|| {
                AppError::unknown_user(format!("User '{}' not found", payload.subject_user_id))
            })?;

        // Fast path only; the unit of work below is what enforces uniqueness.
        if self
            .check_ins
            .has_checked_in(&user.id, &event_id)
            .await?
        {
            return Err(AppError::already_checked_in(format!(
                "User '{}' is already checked in to event '{event_id}'",
                user.id
            )));
        }
        attempt.advance(ScanStage::LedgerChecked);

        let receipt = self
            .check_ins
            .record_check_in(&user.id, &event_id, points, &request.organizer_id)
            .await?;
        attempt.advance(ScanStage::Recorded);
        attempt.advance(ScanStage::PointsAwarded);

        info!(
            organizer_id = %request.organizer_id,
            user_id = %user.id,
            event_id = %event_id,
            payload_id = %payload.id,
            points,
            balance = receipt.account.current_balance,
            "Scan succeeded"
        );

        Ok(format_result(&payload, &user, &receipt))
    }

    fn resolve_points(&self, payload: &QrPayload, event: Option<&EventContext>) -> AppResult<i64> {
        let points = event
            .and_then(|event| event.points_reward)
            .or(payload.points)
            .unwrap_or(self.default_reward);
        if points <= 0 {
            return Err(AppError::validation(format!(
                "Check-in points must be positive, got {points}"
            )));
        }
        Ok(points)
    }
}

fn resolve_event(payload: &QrPayload, event: Option<&EventContext>) -> AppResult<EventId> {
    match payload.kind {
        PayloadKind::EventCheckin => {
            let bound = payload.event_id.clone().ok_or_else(|| {
                AppError::malformed_payload("Event check-in payload has no event id")
            })?;
            match event {
                Some(event) if event.event_id != bound => Err(AppError::event_mismatch(format!(
                    "Payload is for event '{bound}', scanning for '{}'",
                    event.event_id
                ))),
                _ => Ok(bound),
            }
        }
        PayloadKind::Profile => event
            .map(|event| event.event_id.clone())
            .filter(|event_id| !event_id.is_blank())
            .ok_or_else(|| AppError::validation("Profile scans need the organizer's event")),
        PayloadKind::Voucher => Err(AppError::unsupported_payload(
            "Voucher payloads cannot be used for check-in",
        )),
    }
}
