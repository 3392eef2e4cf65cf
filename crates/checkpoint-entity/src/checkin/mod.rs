//! Check-in entities.

pub mod record;

pub use record::CheckInRecord;
