//! Error types for filter operations.

use thiserror::Error;

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors that can occur while loading, filtering or writing datasets.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Raw dataset is not well-formed JSON
    #[error("Malformed raw dataset: {0}")]
    Parse(#[source] serde_json::Error),

    /// Required top-level key is absent
    #[error("The GeoJSON data should have a '{key}' key containing the features list")]
    MissingKey {
        /// Name of the missing key
        key: &'static str,
    },

    /// Required top-level key holds something other than a list
    #[error("The GeoJSON '{key}' key should hold a list, found {found}")]
    NotAList {
        /// Name of the offending key
        key: &'static str,
        /// JSON type that was found instead
        found: &'static str,
    },

    /// No usable relevant area was configured
    #[error("At least one relevant area is required")]
    NoRelevantAreas,

    /// Processed dataset could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
