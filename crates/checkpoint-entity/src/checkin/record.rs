//! Check-in record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use checkpoint_core::types::{CheckInId, EventId, UserId};

/// Proof that a user attended an event.
///
/// At most one record exists per `(user_id, event_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CheckInRecord {
    /// Unique record identifier.
    pub id: CheckInId,
    /// The attendee.
    pub user_id: UserId,
    /// The attended event.
    pub event_id: EventId,
    /// Points credited for this attendance.
    pub points_awarded: i64,
    /// The organizer who scanned the code.
    pub scanned_by: UserId,
    /// When the check-in was committed.
    pub recorded_at: DateTime<Utc>,
}

impl CheckInRecord {
    /// Build a new record with a fresh identifier.
    pub fn new(
        user_id: UserId,
        event_id: EventId,
        points_awarded: i64,
        scanned_by: UserId,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CheckInId::new(),
            user_id,
            event_id,
            points_awarded,
            scanned_by,
            recorded_at,
        }
    }
}
