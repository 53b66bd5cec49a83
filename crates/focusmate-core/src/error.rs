//! Core error types for focusmate-core.
//!
//! Engine-internal failures (malformed patterns, unparsable URLs) are
//! recovered locally with a safe default and never surface here; these
//! types cover storage and validation failures that callers must handle.

use thiserror::Error;

/// Core error type for focusmate-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Rule validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read a key from the backing store
    #[error("Failed to read '{key}': {message}")]
    ReadFailed { key: String, message: String },

    /// Failed to write a key to the backing store
    #[error("Failed to write '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// IO errors from file-backed stores
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted value did not deserialize
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Field-level validation errors for user-authored rules.
///
/// Reported to the caller as-is; a rule failing validation is never
/// silently corrected or dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Domain specifier is empty
    #[error("Domain is required")]
    MissingDomain,

    /// Domain specifier is not a valid exact/wildcard/regex pattern
    #[error("Invalid domain pattern: '{pattern}'")]
    InvalidPattern { pattern: String },

    /// Time limit must be a positive duration
    #[error("Time limit must be greater than 0")]
    InvalidTimeLimit,

    /// Schedule has no days selected
    #[error("At least one day must be selected for the schedule")]
    EmptyScheduleDays,

    /// Schedule has no time ranges
    #[error("At least one time range must be added for the schedule")]
    EmptyTimeRanges,

    /// A time string is not in HH:MM format
    #[error("Invalid time '{value}', expected HH:MM")]
    InvalidTimeFormat { value: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
