/// Errors that can occur while parsing or evaluating a formula
#[derive(Debug, thiserror::Error)]
pub enum FormulaError {
    /// The formula string was empty
    #[error("empty formula")]
    Empty,

    /// A character that is not part of the formula grammar
    #[error("unexpected character '{character}' at position {position} in formula '{formula}'")]
    UnexpectedCharacter {
        /// The offending formula
        formula: String,
        /// The character found
        character: char,
        /// Zero-based character position
        position: usize,
    },

    /// A parenthesised group was not closed
    #[error("unbalanced parenthesis in formula '{0}'")]
    UnbalancedParenthesis(String),

    /// An element count did not fit in an integer
    #[error("invalid count '{count}' in formula '{formula}'")]
    InvalidCount {
        /// The offending formula
        formula: String,
        /// The count text
        count: String,
    },

    /// The element is not in the isotope table
    #[error("unknown element: {0}")]
    UnknownElement(String),

    /// A negative count where a physical molecule was expected
    #[error("negative count {count} for element {element}")]
    NegativeCount {
        /// Element symbol
        element: String,
        /// The offending count
        count: i64,
    },

    /// A count too large for isotope enumeration
    #[error("count {count} for element {element} is too large for isotope enumeration")]
    CountOutOfRange {
        /// Element symbol
        element: String,
        /// The offending count
        count: i64,
    },
}
