//! QR code issuance.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use checkpoint_core::error::AppError;
use checkpoint_core::result::AppResult;
use checkpoint_core::types::{Clock, EventId, UserId, VoucherId};
use checkpoint_entity::qr::QrPayload;

use super::codec::{QrCodec, generate_id};

/// A freshly generated payload and its token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCode {
    /// The structured payload.
    pub payload: QrPayload,
    /// The string to render as a QR code or type in by hand.
    pub token: String,
}

/// Builds new payloads with unique identifiers and encodes them.
#[derive(Debug, Clone)]
pub struct QrIssuer {
    codec: QrCodec,
    clock: Arc<dyn Clock>,
}

impl QrIssuer {
    /// Creates a new issuer.
    pub fn new(codec: QrCodec, clock: Arc<dyn Clock>) -> Self {
        Self { codec, clock }
    }

    /// A code identifying the user; the scanning organizer picks the event.
    pub fn issue_profile(&self, user_id: &UserId) -> AppResult<IssuedCode> {
        require_present(user_id.as_str(), "user id")?;
        let payload = QrPayload::profile(generate_id(user_id), user_id.clone(), self.clock.now());
        self.finish(payload)
    }

    /// A code bound to one event, optionally carrying its points reward.
    pub fn issue_event_checkin(
        &self,
        user_id: &UserId,
        event_id: &EventId,
        points: Option<i64>,
    ) -> AppResult<IssuedCode> {
        require_present(user_id.as_str(), "user id")?;
        require_present(event_id.as_str(), "event id")?;
        if let Some(points) = points {
            if points <= 0 {
                return Err(AppError::validation(format!(
                    "Points reward must be positive, got {points}"
                )));
            }
        }

        let payload = QrPayload::event_checkin(
            generate_id(user_id),
            user_id.clone(),
            event_id.clone(),
            points,
            self.clock.now(),
        );
        self.finish(payload)
    }

    /// A code bound to a voucher.
    pub fn issue_voucher(&self, user_id: &UserId, voucher_id: &VoucherId) -> AppResult<IssuedCode> {
        require_present(user_id.as_str(), "user id")?;
        require_present(voucher_id.as_str(), "voucher id")?;
        let payload = QrPayload::voucher(
            generate_id(user_id),
            user_id.clone(),
            voucher_id.clone(),
            self.clock.now(),
        );
        self.finish(payload)
    }

    fn finish(&self, payload: QrPayload) -> AppResult<IssuedCode> {
        let token = self.codec.encode(&payload)?;
        info!(
            payload_id = %payload.id,
            user_id = %payload.subject_user_id,
            kind = %payload.kind,
            "QR code issued"
        );
        Ok(IssuedCode { payload, token })
    }
}

fn require_present(value: &str, what: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("A {what} is required")));
    }
    Ok(())
}
