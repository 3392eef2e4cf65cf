//! Convenience result type alias for Checkpoint.

use crate::error::AppError;

/// A specialized `Result` type for Checkpoint operations.
pub type AppResult<T> = Result<T, AppError>;
