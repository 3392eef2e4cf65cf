//! Points ledger entities.

pub mod account;
pub mod reason;
pub mod tier;
pub mod transaction;

pub use account::UserPointsAccount;
pub use reason::ReasonType;
pub use tier::{Tier, points_to_next_tier, tier_for};
pub use transaction::PointsTransaction;
