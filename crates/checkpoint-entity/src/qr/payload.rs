//! QR payload model.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use checkpoint_core::types::{EventId, PayloadId, UserId, VoucherId};

use super::kind::PayloadKind;

/// The structured content of a scannable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    /// Unique per generation.
    pub id: PayloadId,
    /// The user the code belongs to.
    pub subject_user_id: UserId,
    /// What the code is for.
    pub kind: PayloadKind,
    /// Issue time, millisecond precision.
    pub issued_at: DateTime<Utc>,
    /// Event, for `event_checkin` codes.
    pub event_id: Option<EventId>,
    /// Voucher, for `voucher` codes.
    pub voucher_id: Option<VoucherId>,
    /// Suggested points for the check-in.
    pub points: Option<i64>,
}

impl QrPayload {
    /// A bare payload of the given kind. `issued_at` is truncated to
    /// whole milliseconds.
    pub fn new(
        id: PayloadId,
        subject_user_id: UserId,
        kind: PayloadKind,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            subject_user_id,
            kind,
            issued_at: truncate_to_millis(issued_at),
            event_id: None,
            voucher_id: None,
            points: None,
        }
    }

    /// A user's profile code.
    pub fn profile(id: PayloadId, user_id: UserId, issued_at: DateTime<Utc>) -> Self {
        Self::new(id, user_id, PayloadKind::Profile, issued_at)
    }

    /// A code bound to one event.
    pub fn event_checkin(
        id: PayloadId,
        user_id: UserId,
        event_id: EventId,
        points: Option<i64>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Some(event_id),
            points,
            ..Self::new(id, user_id, PayloadKind::EventCheckin, issued_at)
        }
    }

    /// A code bound to a voucher.
    pub fn voucher(
        id: PayloadId,
        user_id: UserId,
        voucher_id: VoucherId,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            voucher_id: Some(voucher_id),
            ..Self::new(id, user_id, PayloadKind::Voucher, issued_at)
        }
    }

    /// Time elapsed since issue. Negative if `issued_at` lies after `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.issued_at
    }

    /// Whether the payload has reached `ttl` at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match TimeDelta::from_std(ttl) {
            Ok(ttl) => self.age_at(now) >= ttl,
            // A TTL too large to represent never elapses.
            Err(_) => false,
        }
    }
}

/// Drop sub-millisecond precision so the value survives an epoch-ms round trip.
pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}
