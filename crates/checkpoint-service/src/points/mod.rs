//! Append-only points ledger.

pub mod ledger;

pub use ledger::{LedgerAudit, PointsLedger};
