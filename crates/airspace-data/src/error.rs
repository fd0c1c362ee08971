//! Error types for fetch and cache operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while fetching the dataset or tracking its freshness.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote endpoint answered with a non-success status
    #[error("HTTP error: {url} returned {status}")]
    Http {
        /// URL that was requested
        url: String,
        /// Status code returned by the server
        status: u16,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored or reported timestamp could not be interpreted
    #[error("Timestamp error: {0}")]
    Timestamp(String),
}
