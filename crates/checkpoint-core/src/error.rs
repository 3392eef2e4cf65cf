//! Unified application error types for Checkpoint.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The [`ErrorKind`] is the
//! discriminant callers match on; the message is for logs only.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The QR token could not be parsed or is missing required fields.
    MalformedPayload,
    /// The QR token is older than the configured time-to-live.
    ExpiredPayload,
    /// The user already has a check-in for this event.
    AlreadyCheckedIn,
    /// The payload's subject user could not be resolved.
    UnknownUser,
    /// The payload kind cannot be used for check-in.
    UnsupportedPayload,
    /// The payload names a different event than the one being scanned for.
    EventMismatch,
    /// The storage backend failed or could not be reached. Safe to retry.
    StorageUnavailable,
    /// Input validation failed.
    Validation,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Return the kind as an upper-case code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedPayload => "MALFORMED_PAYLOAD",
            Self::ExpiredPayload => "EXPIRED_PAYLOAD",
            Self::AlreadyCheckedIn => "ALREADY_CHECKED_IN",
            Self::UnknownUser => "UNKNOWN_USER",
            Self::UnsupportedPayload => "UNSUPPORTED_PAYLOAD",
            Self::EventMismatch => "EVENT_MISMATCH",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::Validation => "VALIDATION",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unified application error used throughout Checkpoint.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a malformed-payload error.
    pub fn malformed_payload(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedPayload, message)
    }

    /// Create an expired-payload error.
    pub fn expired_payload(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExpiredPayload, message)
    }

    /// Create an already-checked-in error.
    pub fn already_checked_in(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyCheckedIn, message)
    }

    /// Create an unknown-user error.
    pub fn unknown_user(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownUser, message)
    }

    /// Create an unsupported-payload error.
    pub fn unsupported_payload(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedPayload, message)
    }

    /// Create an event-mismatch error.
    pub fn event_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EventMismatch, message)
    }

    /// Create a storage-unavailable error.
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageUnavailable, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether the whole operation may be retried as-is.
    ///
    /// Only transient storage failures qualify; every other kind is a
    /// property of the input and will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::StorageUnavailable
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::with_source(
            ErrorKind::StorageUnavailable,
            format!("Database error: {err}"),
            err,
        )
    }
}
