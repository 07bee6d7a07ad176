use crate::formula::FormulaError;

/// Errors that can occur while parsing a signature key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// No `$` between parent and ion relation
    #[error("signature key '{0}' has no '$' separator")]
    MissingSeparator(String),

    /// Empty parent identifier
    #[error("signature key '{0}' has an empty parent")]
    EmptyParent(String),

    /// No `;` before the isotope order index
    #[error("signature key '{0}' has no ';<order>' suffix")]
    MissingOrder(String),

    /// The order index is not an unsigned integer
    #[error("signature key '{key}' has an invalid order index '{order}'")]
    InvalidOrder {
        /// The offending key
        key: String,
        /// The order text
        order: String,
    },

    /// Empty or malformed adduct
    #[error("signature key '{0}' has an empty or malformed adduct")]
    InvalidAdduct(String),

    /// Empty isotope delta, i.e. `,()`
    #[error("signature key '{0}' has an empty isotope delta")]
    EmptyIsotope(String),

    /// Two keys denote the same ion
    #[error("duplicate signature key '{0}'")]
    Duplicate(String),
}

/// Errors that can occur while expanding signatures into ions
#[derive(Debug, thiserror::Error)]
pub enum IonError {
    /// Malformed signature key
    #[error("Key error: {0}")]
    KeyError(#[from] KeyError),

    /// Formula error during isotopologue enumeration
    #[error("Formula error: {0}")]
    FormulaError(#[from] FormulaError),

    /// The adduct is not in the built-in table
    #[error("Unknown adduct: {0}")]
    UnknownAdduct(String),

    /// Invalid ion configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
