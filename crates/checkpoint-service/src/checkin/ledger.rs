//! Check-in ledger: at most one attendance record per user and event.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use checkpoint_core::error::AppError;
use checkpoint_core::result::AppResult;
use checkpoint_core::types::{EventId, UserId};
use checkpoint_database::store::LedgerStore;
use checkpoint_entity::checkin::CheckInRecord;
use checkpoint_entity::points::{PointsTransaction, ReasonType, UserPointsAccount};

use crate::points::PointsLedger;

/// Everything a successful check-in wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckInReceipt {
    /// The attendance record.
    pub record: CheckInRecord,
    /// The paired attendance credit.
    pub transaction: PointsTransaction,
    /// The account after the credit.
    pub account: UserPointsAccount,
}

/// Records attendance and awards its points in one unit of work.
#[derive(Debug, Clone)]
pub struct CheckInLedger {
    store: Arc<dyn LedgerStore>,
    points: Arc<PointsLedger>,
}

impl CheckInLedger {
    /// Creates a check-in ledger writing through the points ledger's store.
    pub fn new(points: Arc<PointsLedger>) -> Self {
        Self {
            store: points.store(),
            points,
        }
    }

    /// The points ledger credits are appended to.
    pub fn points(&self) -> &PointsLedger {
        &self.points
    }

    /// Whether a committed check-in exists for the pair.
    pub async fn has_checked_in(&self, user_id: &UserId, event_id: &EventId) -> AppResult<bool> {
        Ok(self.store.find_check_in(user_id, event_id).await?.is_some())
    }

    /// The committed check-in for the pair, if any.
    pub async fn find_check_in(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> AppResult<Option<CheckInRecord>> {
        self.store.find_check_in(user_id, event_id).await
    }

    /// Record attendance and credit `points` to the user.
    ///
    /// The uniqueness check, the record insert, and the points append run
    /// in a single unit of work holding the user's ledger lock. Of any
    /// number of concurrent calls for the same pair, exactly one succeeds
    /// and the rest fail with `AlreadyCheckedIn`. If any step fails,
    /// nothing is written.
    pub async fn record_check_in(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        points: i64,
        organizer_id: &UserId,
    ) -> AppResult<CheckInReceipt> {
        if user_id.is_blank() || event_id.is_blank() || organizer_id.is_blank() {
            return Err(AppError::validation(
                "User, event, and organizer ids are required",
            ));
        }
        if points <= 0 {
            return Err(AppError::validation(format!(
                "Check-in points must be positive, got {points}"
            )));
        }

        let mut unit = self.store.begin(user_id).await?;

        let record = CheckInRecord::new(
            user_id.clone(),
            event_id.clone(),
            points,
            organizer_id.clone(),
            self.points.clock().now(),
        );

        if !unit.insert_check_in(&record).await? {
            warn!(
                user_id = %user_id,
                event_id = %event_id,
                organizer_id = %organizer_id,
                "Duplicate check-in rejected"
            );
            return Err(AppError::already_checked_in(format!(
                "User '{user_id}' is already checked in to event '{event_id}'"
            )));
        }

        let (transaction, account) = self
            .points
            .append_in_unit(
                &mut *unit,
                points,
                ReasonType::EventAttendance,
                Some(event_id.to_string()),
            )
            .await?;

        unit.commit().await?;

        info!(
            user_id = %user_id,
            event_id = %event_id,
            organizer_id = %organizer_id,
            points,
            balance = account.current_balance,
            "Check-in recorded"
        );

        Ok(CheckInReceipt {
            record,
            transaction,
            account,
        })
    }

    /// All check-ins for an event, oldest first.
    pub async fn list_check_ins(&self, event_id: &EventId) -> AppResult<Vec<CheckInRecord>> {
        self.store.list_check_ins(event_id).await
    }
}
