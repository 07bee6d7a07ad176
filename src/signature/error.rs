use crate::formula::FormulaError;

/// Errors that can occur while ingesting records or generating signatures
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// I/O error while reading or writing a catalog
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error serializing/deserializing JSON
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Error parsing or evaluating a formula
    #[error("Formula error: {0}")]
    FormulaError(#[from] FormulaError),

    /// A compound record without a usable neutral formula
    #[error("Compound record has no neutral formula: {0}")]
    MissingFormula(String),

    /// A record that is not a JSON object or lacks required fields
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// The number of reaction combinations exceeds the configured ceiling
    #[error(
        "{reactions} reactions to depth {depth} would produce more than {ceiling} combinations"
    )]
    TooManyCombinations {
        /// Number of reactions
        reactions: usize,
        /// Requested reaction depth
        depth: usize,
        /// Configured ceiling
        ceiling: u64,
    },

    /// Generation was requested on a generator without compounds
    #[error("No compounds loaded; the generator was built from signatures")]
    NoCompounds,

    /// Invalid generator configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
