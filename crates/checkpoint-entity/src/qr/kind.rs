//! QR payload kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a QR code asks the scanner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// A user's personal code; the organizer supplies the event.
    Profile,
    /// A code bound to one event.
    EventCheckin,
    /// A code bound to a voucher.
    Voucher,
}

impl PayloadKind {
    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::EventCheckin => "event_checkin",
            Self::Voucher => "voucher",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadKind {
    type Err = checkpoint_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(Self::Profile),
            "event_checkin" => Ok(Self::EventCheckin),
            "voucher" => Ok(Self::Voucher),
            _ => Err(checkpoint_core::AppError::malformed_payload(format!(
                "Unknown payload type: '{s}'"
            ))),
        }
    }
}
