//! # checkpoint-entity
//!
//! Domain records for Checkpoint. Every struct in this crate is either a
//! database row or a value object. Persisted records additionally derive
//! `sqlx::FromRow`. Everything except [`points::UserPointsAccount`] is
//! immutable once written.

pub mod checkin;
pub mod points;
pub mod qr;
pub mod user;
