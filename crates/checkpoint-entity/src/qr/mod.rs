//! QR payload entities.

pub mod kind;
pub mod payload;

pub use kind::PayloadKind;
pub use payload::QrPayload;
