//! QR token codec.
//!
//! A token is the payload serialized as compact JSON with the field names
//! `id, userId, type, timestamp, eventId, voucherId, points`, then encoded
//! as URL-safe base64. Tokens typed in by hand and tokens read by a camera
//! go through the same path. Tokens are not signed.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use checkpoint_core::config::QrConfig;
use checkpoint_core::error::AppError;
use checkpoint_core::result::AppResult;
use checkpoint_core::types::{Clock, EventId, PayloadId, SystemClock, UserId, VoucherId};
use checkpoint_entity::qr::{PayloadKind, QrPayload};

/// Emits unpadded tokens, accepts padded and unpadded input.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Wire form. Every field is optional here so that absence can be
/// reported as a malformed payload rather than a serde error.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePayload {
    id: Option<String>,
    user_id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    voucher_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    points: Option<i64>,
}

impl From<&QrPayload> for WirePayload {
    fn from(payload: &QrPayload) -> Self {
        Self {
            id: Some(payload.id.to_string()),
            user_id: Some(payload.subject_user_id.to_string()),
            kind: Some(payload.kind.as_str().to_string()),
            timestamp: Some(payload.issued_at.timestamp_millis()),
            event_id: payload.event_id.as_ref().map(ToString::to_string),
            voucher_id: payload.voucher_id.as_ref().map(ToString::to_string),
            points: payload.points,
        }
    }
}

/// Generate a payload identifier for `user_id`.
///
/// The UUIDv7 suffix combines a millisecond timestamp, a per-process
/// monotonic counter, and random bits from the OS generator.
pub fn generate_id(user_id: &UserId) -> PayloadId {
    PayloadId::new(format!("{}-{}", user_id, Uuid::now_v7().simple()))
}

/// Encodes payloads to tokens and decodes tokens back, enforcing expiry.
#[derive(Debug, Clone)]
pub struct QrCodec {
    ttl: Duration,
    max_clock_skew: Duration,
    clock: Arc<dyn Clock>,
}

impl QrCodec {
    /// Creates a codec using the wall clock.
    pub fn new(config: &QrConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a codec with an explicit time source.
    pub fn with_clock(config: &QrConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: config.ttl(),
            max_clock_skew: config.max_clock_skew(),
            clock,
        }
    }

    /// Serialize a payload into a token. Identical payloads yield
    /// identical tokens.
    ///
    /// Payloads that [`parse`](Self::parse) would reject are refused here,
    /// so every emitted token decodes back to the same payload.
    pub fn encode(&self, payload: &QrPayload) -> AppResult<String> {
        validate_structure(payload)?;
        let json = serde_json::to_vec(&WirePayload::from(payload))?;
        Ok(TOKEN_ENGINE.encode(json))
    }

    /// Decode and validate a token against the current time.
    pub fn decode(&self, token: &str) -> AppResult<QrPayload> {
        self.decode_at(token, self.clock.now())
    }

    /// Decode and validate a token against `now`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> AppResult<QrPayload> {
        let payload = self.parse(token)?;
        self.validate_at(&payload, now)?;
        Ok(payload)
    }

    /// Structural decoding only; no expiry check.
    pub fn parse(&self, token: &str) -> AppResult<QrPayload> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::malformed_payload("Token is empty"));
        }

        let bytes = TOKEN_ENGINE
            .decode(token)
            .map_err(|e| AppError::malformed_payload(format!("Token is not valid base64: {e}")))?;

        let wire: WirePayload = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::malformed_payload(format!("Token is not valid JSON: {e}")))?;

        let id = required_text(wire.id, "id")?;
        let user_id = required_text(wire.user_id, "userId")?;
        let kind: PayloadKind = required_text(wire.kind, "type")?.parse()?;
        let timestamp = wire
            .timestamp
            .ok_or_else(|| AppError::malformed_payload("Missing field 'timestamp'"))?;
        let issued_at = DateTime::from_timestamp_millis(timestamp).ok_or_else(|| {
            AppError::malformed_payload(format!("Timestamp {timestamp} is out of range"))
        })?;

        let payload = QrPayload {
            id: PayloadId::new(id),
            subject_user_id: UserId::new(user_id),
            kind,
            issued_at,
            event_id: wire.event_id.map(EventId::new),
            voucher_id: wire.voucher_id.map(VoucherId::new),
            points: wire.points,
        };
        validate_structure(&payload)?;
        Ok(payload)
    }

    /// Check the payload's issue time against `now`.
    pub fn validate_at(&self, payload: &QrPayload, now: DateTime<Utc>) -> AppResult<()> {
        let age = payload.age_at(now);

        if let Ok(skew) = TimeDelta::from_std(self.max_clock_skew) {
            if -age > skew {
                return Err(AppError::malformed_payload(format!(
                    "Payload issued {}s in the future",
                    (-age).num_seconds()
                )));
            }
        }

        if payload.is_expired_at(now, self.ttl) {
            return Err(AppError::expired_payload(format!(
                "Payload issued {}s ago exceeds the {}s validity window",
                age.num_seconds(),
                self.ttl.as_secs()
            )));
        }

        Ok(())
    }
}

/// Shape rules shared by [`QrCodec::encode`] and [`QrCodec::parse`].
fn validate_structure(payload: &QrPayload) -> AppResult<()> {
    ensure_text(payload.id.as_str(), "id")?;
    ensure_text(payload.subject_user_id.as_str(), "userId")?;
    if let Some(event_id) = &payload.event_id {
        ensure_text(event_id.as_str(), "eventId")?;
    }
    if let Some(voucher_id) = &payload.voucher_id {
        ensure_text(voucher_id.as_str(), "voucherId")?;
    }

    if let Some(points) = payload.points {
        if points < 0 {
            return Err(AppError::malformed_payload(format!(
                "Points must not be negative, got {points}"
            )));
        }
    }

    // The wire carries epoch milliseconds only.
    if payload.issued_at.timestamp_subsec_nanos() % 1_000_000 != 0 {
        return Err(AppError::malformed_payload(
            "Issue time has sub-millisecond precision",
        ));
    }

    Ok(())
}

fn ensure_text(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::malformed_payload(format!("Field '{field}' is blank")));
    }
    Ok(())
}

fn required_text(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::malformed_payload(format!("Missing field '{field}'")))
}
