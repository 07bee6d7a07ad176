/// Errors that can occur while aggregating scan hits
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// I/O error while reading scans or writing a bundle
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error serializing/deserializing JSON
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Error reading an mzML scan source
    #[cfg(feature = "mzml")]
    #[error("mzML error: {0}")]
    MzMLError(#[from] crate::mzml::MzMLError),

    /// A scan whose m/z and intensity arrays differ in length
    #[error("Scan {scan} has {mz} m/z values but {intensity} intensities")]
    ArrayLengthMismatch {
        /// Scan index
        scan: usize,
        /// m/z array length
        mz: usize,
        /// Intensity array length
        intensity: usize,
    },

    /// Invalid search configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
