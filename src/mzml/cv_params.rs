//! PSI-MS controlled vocabulary terms needed to read MS1 scans.

use quick_xml::events::BytesStart;

use super::MzMLError;

/// Accessions consulted while reading spectra.
pub mod accessions {
    /// MS level
    pub const MS_LEVEL: &str = "MS:1000511";
    /// Positive scan
    pub const POSITIVE_SCAN: &str = "MS:1000130";
    /// Negative scan
    pub const NEGATIVE_SCAN: &str = "MS:1000129";
    /// Scan start time
    pub const SCAN_START_TIME: &str = "MS:1000016";
    /// m/z array
    pub const MZ_ARRAY: &str = "MS:1000514";
    /// Intensity array
    pub const INTENSITY_ARRAY: &str = "MS:1000515";
    /// 32-bit float
    pub const FLOAT_32: &str = "MS:1000521";
    /// 64-bit float
    pub const FLOAT_64: &str = "MS:1000523";
    /// zlib compression
    pub const ZLIB_COMPRESSION: &str = "MS:1000574";
    /// No compression
    pub const NO_COMPRESSION: &str = "MS:1000576";
    /// MS-Numpress linear prediction
    pub const NUMPRESS_LINEAR: &str = "MS:1002312";
    /// MS-Numpress positive integer
    pub const NUMPRESS_PIC: &str = "MS:1002313";
    /// MS-Numpress short logged float
    pub const NUMPRESS_SLOF: &str = "MS:1002314";
    /// Unit: minute
    pub const UNIT_MINUTE: &str = "UO:0000031";
    /// Unit: millisecond
    pub const UNIT_MILLISECOND: &str = "UO:0000028";
}

/// The parts of a `<cvParam>` the reader uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CvParam {
    /// Accession, e.g. `MS:1000511`
    pub accession: String,
    /// Optional value
    pub value: Option<String>,
    /// Optional unit accession
    pub unit_accession: Option<String>,
}

impl CvParam {
    /// Read a `<cvParam>` element.
    pub fn from_element(e: &BytesStart) -> Result<Self, MzMLError> {
        Ok(Self {
            accession: attribute(e, "accession")?.unwrap_or_default(),
            value: attribute(e, "value")?,
            unit_accession: attribute(e, "unitAccession")?,
        })
    }

    /// The value as `f64`, if it parses.
    pub fn value_as_f64(&self) -> Option<f64> {
        self.value.as_deref()?.trim().parse().ok()
    }

    /// The value as `u8`, if it parses.
    pub fn value_as_u8(&self) -> Option<u8> {
        self.value.as_deref()?.trim().parse().ok()
    }
}

/// Look up an attribute value on an element.
pub fn attribute(e: &BytesStart, name: &str) -> Result<Option<String>, MzMLError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| MzMLError::XmlError(quick_xml::Error::from(err)))?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(std::str::from_utf8(&attr.value)?.to_string()));
        }
    }
    Ok(None)
}

/// Convert a retention time to seconds given its unit accession.
pub fn retention_time_seconds(value: f64, unit_accession: Option<&str>) -> f64 {
    match unit_accession {
        Some(accessions::UNIT_MINUTE) => value * 60.0,
        Some(accessions::UNIT_MILLISECOND) => value / 1000.0,
        _ => value,
    }
}
