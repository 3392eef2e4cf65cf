//! # checkpoint-core
//!
//! Core crate for Checkpoint. Contains configuration schemas, typed
//! identifiers, the clock abstraction, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Checkpoint crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
