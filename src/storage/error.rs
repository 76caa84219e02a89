//! Storage-specific error types.
//!
//! All aggregate queries return [`StorageError`] on failure. "No matching rows"
//! is never an error; queries return an empty mapping instead.

use thiserror::Error;

/// Errors that can occur while querying the annotation store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database operation failed (sqlx error).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid connection string.
    #[error("invalid connection string: {0}")]
    InvalidUrl(String),
}
