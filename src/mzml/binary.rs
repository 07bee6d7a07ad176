//! Decoding of mzML `<binary>` arrays.
//!
//! Arrays are Base64 text, optionally zlib-compressed, holding little-endian
//! 32- or 64-bit floats. Every array is widened to `f64`.

use std::io::{Cursor, Read};

use base64::prelude::*;
use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;

use super::cv_params::accessions;

/// Errors that can occur while decoding a binary array
#[derive(Debug, thiserror::Error)]
pub enum BinaryDecodeError {
    /// The text is not valid Base64
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// zlib inflation or byte reading failed
    #[error("Decompression error: {0}")]
    DecompressionError(#[from] std::io::Error),

    /// The byte count is not a multiple of the value width
    #[error("{bytes} bytes is not a whole number of {width}-byte values")]
    TruncatedValue {
        /// Decoded byte count
        bytes: usize,
        /// Bytes per value
        width: usize,
    },

    /// A compression scheme other than none or zlib
    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),
}

/// Value width of a binary array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// 32-bit float (MS:1000521)
    Float32,
    /// 64-bit float (MS:1000523)
    #[default]
    Float64,
}

impl Precision {
    fn width(self) -> usize {
        match self {
            Precision::Float32 => 4,
            Precision::Float64 => 8,
        }
    }
}

/// Compression of a binary array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Compression {
    /// No compression (MS:1000576)
    #[default]
    None,
    /// zlib (MS:1000574)
    Zlib,
    /// Anything else, e.g. MS-Numpress; carried so the error can name it
    Other(String),
}

/// Encoding of one `<binaryDataArray>`, built up from its cvParams.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayEncoding {
    /// Value width
    pub precision: Precision,
    /// Compression
    pub compression: Compression,
}

impl ArrayEncoding {
    /// Fold one cvParam accession into the encoding. Returns `false` when the
    /// accession is not an encoding term.
    pub fn apply(&mut self, accession: &str) -> bool {
        match accession {
            accessions::FLOAT_32 => self.precision = Precision::Float32,
            accessions::FLOAT_64 => self.precision = Precision::Float64,
            accessions::NO_COMPRESSION => self.compression = Compression::None,
            accessions::ZLIB_COMPRESSION => self.compression = Compression::Zlib,
            accessions::NUMPRESS_LINEAR | accessions::NUMPRESS_PIC | accessions::NUMPRESS_SLOF => {
                self.compression = Compression::Other(accession.to_string())
            }
            _ => return false,
        }
        true
    }

    /// Decode Base64 text into values.
    pub fn decode(&self, text: &str) -> Result<Vec<f64>, BinaryDecodeError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let raw = BASE64_STANDARD.decode(text)?;
        let bytes = match &self.compression {
            Compression::None => raw,
            Compression::Zlib => {
                let mut inflated = Vec::with_capacity(raw.len() * 2);
                ZlibDecoder::new(raw.as_slice()).read_to_end(&mut inflated)?;
                inflated
            }
            Compression::Other(accession) => {
                return Err(BinaryDecodeError::UnsupportedCompression(accession.clone()))
            }
        };

        let width = self.precision.width();
        if bytes.len() % width != 0 {
            return Err(BinaryDecodeError::TruncatedValue {
                bytes: bytes.len(),
                width,
            });
        }
        let count = bytes.len() / width;
        let mut cursor = Cursor::new(bytes);
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(match self.precision {
                Precision::Float32 => f64::from(cursor.read_f32::<LittleEndian>()?),
                Precision::Float64 => cursor.read_f64::<LittleEndian>()?,
            });
        }
        Ok(values)
    }
}
