//! Idempotent check-in ledger.

pub mod ledger;

pub use ledger::{CheckInLedger, CheckInReceipt};
