//! Sink error types.

use thiserror::Error;

/// Errors that can occur while persisting points.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Transport failure (connection refused, timeout, ...).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("request rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the server.
        body: String,
    },

    /// A query statement (SHOW/CREATE DATABASE) reported an error.
    #[error("query error: {0}")]
    Query(String),

    /// Invalid sink configuration.
    #[error("config error: {0}")]
    Config(String),
}
