use crate::ions::KeyError;
use crate::search::SearchError;

/// Errors that can occur while scoring hit bundles
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    /// Malformed or duplicate signature key
    #[error("Key error: {0}")]
    KeyError(#[from] KeyError),

    /// Error loading a hit bundle
    #[error("Bundle error: {0}")]
    SearchError(#[from] SearchError),

    /// I/O error while writing scores
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error serializing/deserializing JSON
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Invalid scoring configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
