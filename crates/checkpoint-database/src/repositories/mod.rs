//! PostgreSQL implementations of the storage traits.

pub mod ledger;
pub mod user;

pub use ledger::PgLedgerStore;
pub use user::PgUserDirectory;

use checkpoint_core::error::{AppError, ErrorKind};

/// Partial unique index allowing one attendance credit per event.
const ATTENDANCE_ONCE: &str = "idx_points_attendance_once";

/// Classify a driver error.
///
/// A unique violation is a fact about the data, so retrying cannot help.
/// The attendance index reports a duplicate check-in. Any other violation
/// means the ledger disagrees with itself. Everything else is treated as
/// the database being unavailable.
pub(crate) fn storage_error(context: &'static str, error: sqlx::Error) -> AppError {
    let unique_constraint = error
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .map(|db| db.constraint().unwrap_or_default().to_string());

    match unique_constraint {
        Some(constraint) if constraint == ATTENDANCE_ONCE => {
            AppError::with_source(ErrorKind::AlreadyCheckedIn, "Already checked in", error)
        }
        Some(constraint) => AppError::with_source(
            ErrorKind::Internal,
            format!("{context}: unique constraint '{constraint}' violated"),
            error,
        ),
        None => AppError::with_source(ErrorKind::StorageUnavailable, context, error),
    }
}
