//! # mzML scan source
//!
//! Streaming reader for the HUPO-PSI mzML format, reduced to what scan
//! searching needs. The document is pulled event by event with quick-xml, so
//! files of any size are processed in constant memory per spectrum.
//!
//! ```text
//! mzML
//! └── run
//!     └── spectrumList
//!         └── spectrum*
//!             ├── cvParam*            (ms level, polarity)
//!             ├── scanList/scan       (scan start time)
//!             ├── precursorList       (ignored)
//!             └── binaryDataArrayList
//!                 └── binaryDataArray* (encoding cvParams + base64 binary)
//! ```
//!
//! [`MzMLScanReader`] implements [`crate::search::ScanSource`] and yields MS1
//! scans only.

mod binary;
mod cv_params;
mod error;
mod reader;


pub use binary::{ArrayEncoding, BinaryDecodeError, Compression, Precision};
pub use cv_params::{accessions, retention_time_seconds, CvParam};
pub use error::MzMLError;
pub use reader::{MzMLScanReader, SpectrumRecord};

/// Suffix of mzML files picked up from input directories.
pub const MZML_SUFFIX: &str = ".mzML";
