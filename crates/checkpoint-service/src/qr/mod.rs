//! QR payload encoding, decoding, and issuance.

pub mod codec;
pub mod issuer;

pub use codec::{QrCodec, generate_id};
pub use issuer::{IssuedCode, QrIssuer};
