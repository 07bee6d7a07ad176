use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::binary::ArrayEncoding;
use super::cv_params::{accessions, attribute, retention_time_seconds, CvParam};
use super::MzMLError;
use crate::search::{Polarity, Scan, ScanSource, SearchError};

const INPUT_BUFFER_SIZE: usize = 64 * 1024;

/// A decoded spectrum of any MS level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumRecord {
    /// `id` attribute
    pub id: String,
    /// MS level, when annotated
    pub ms_level: Option<u8>,
    /// Polarity, when annotated
    pub polarity: Option<Polarity>,
    /// Scan start time in seconds
    pub retention_time: Option<f64>,
    /// m/z array
    pub mz: Vec<f64>,
    /// Intensity array
    pub intensity: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayKind {
    Mz,
    Intensity,
    Other,
}

#[derive(Debug)]
struct ArrayContext {
    kind: ArrayKind,
    encoding: ArrayEncoding,
    text: String,
}

impl ArrayContext {
    fn new() -> Self {
        Self {
            kind: ArrayKind::Other,
            encoding: ArrayEncoding::default(),
            text: String::new(),
        }
    }

    fn apply(&mut self, param: &CvParam) {
        if self.encoding.apply(&param.accession) {
            return;
        }
        match param.accession.as_str() {
            accessions::MZ_ARRAY => self.kind = ArrayKind::Mz,
            accessions::INTENSITY_ARRAY => self.kind = ArrayKind::Intensity,
            _ => {}
        }
    }
}

/// Pull reader over the spectra of an mzML document.
///
/// Only what scan searching needs is decoded: MS level, polarity, scan start
/// time and the m/z and intensity arrays.
pub struct MzMLScanReader<R: BufRead> {
    reader: Reader<R>,
    spectra_read: usize,
    finished: bool,
}

impl MzMLScanReader<BufReader<File>> {
    /// Open an mzML file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MzMLError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::with_capacity(INPUT_BUFFER_SIZE, file)))
    }
}

impl<R: BufRead> MzMLScanReader<R> {
    /// Create a reader over any buffered source.
    pub fn new(reader: R) -> Self {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);
        Self {
            reader: xml_reader,
            spectra_read: 0,
            finished: false,
        }
    }

    /// Number of spectra read so far, of any MS level.
    pub fn spectra_read(&self) -> usize {
        self.spectra_read
    }

    /// Read the next spectrum.
    pub fn next_spectrum(&mut self) -> Result<Option<SpectrumRecord>, MzMLError> {
        if self.finished {
            return Ok(None);
        }
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(e) if e.name().as_ref() == b"spectrum" => {
                    let id = attribute(&e, "id")?.unwrap_or_default();
                    let spectrum = self.read_spectrum(id)?;
                    self.spectra_read += 1;
                    return Ok(Some(spectrum));
                }
                Event::End(e) if e.name().as_ref() == b"spectrumList" => {
                    self.finished = true;
                    return Ok(None);
                }
                Event::Eof => {
                    self.finished = true;
                    return Ok(None);
                }
                _ => {}
            }
            buf.clear();
        }
    }

    /// Read the next MS1 scan, skipping spectra of other levels.
    pub fn next_ms1(&mut self) -> Result<Option<Scan>, MzMLError> {
        while let Some(spectrum) = self.next_spectrum()? {
            if spectrum.ms_level != Some(1) {
                debug!("Skipping {} (ms level {:?})", spectrum.id, spectrum.ms_level);
                continue;
            }
            let retention_time = spectrum.retention_time.ok_or_else(|| {
                MzMLError::InvalidStructure(format!("spectrum {} has no scan start time", spectrum.id))
            })?;
            return Ok(Some(Scan {
                // scans not flagged positive are searched as negative
                polarity: spectrum.polarity.unwrap_or(Polarity::Negative),
                retention_time,
                mz: spectrum.mz,
                intensity: spectrum.intensity,
            }));
        }
        Ok(None)
    }

    fn read_spectrum(&mut self, id: String) -> Result<SpectrumRecord, MzMLError> {
        let mut spectrum = SpectrumRecord {
            id,
            ..Default::default()
        };
        let mut depth = 1usize;
        let mut in_precursor_list = false;
        let mut array: Option<ArrayContext> = None;
        let mut buf = Vec::new();

        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    depth += 1;
                    match e.name().as_ref() {
                        b"cvParam" => Self::apply_param(e, &mut spectrum, array.as_mut(), in_precursor_list)?,
                        b"precursorList" => in_precursor_list = true,
                        b"binaryDataArray" => array = Some(ArrayContext::new()),
                        _ => {}
                    }
                }
                Event::Empty(ref e) => {
                    if e.name().as_ref() == b"cvParam" {
                        Self::apply_param(e, &mut spectrum, array.as_mut(), in_precursor_list)?;
                    }
                }
                Event::Text(ref t) => {
                    if let Some(ctx) = array.as_mut() {
                        ctx.text.push_str(&t.unescape()?);
                    }
                }
                Event::End(ref e) => {
                    depth -= 1;
                    match e.name().as_ref() {
                        b"spectrum" if depth == 0 => break,
                        b"precursorList" => in_precursor_list = false,
                        b"binaryDataArray" => {
                            if let Some(ctx) = array.take() {
                                let values = match ctx.kind {
                                    ArrayKind::Other => Vec::new(),
                                    _ => ctx.encoding.decode(&ctx.text)?,
                                };
                                match ctx.kind {
                                    ArrayKind::Mz => spectrum.mz = values,
                                    ArrayKind::Intensity => spectrum.intensity = values,
                                    ArrayKind::Other => {}
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => {
                    return Err(MzMLError::InvalidStructure(format!(
                        "unexpected end of file inside spectrum {}",
                        spectrum.id
                    )));
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(spectrum)
    }

    fn apply_param(
        e: &BytesStart,
        spectrum: &mut SpectrumRecord,
        array: Option<&mut ArrayContext>,
        in_precursor_list: bool,
    ) -> Result<(), MzMLError> {
        let param = CvParam::from_element(e)?;
        if let Some(ctx) = array {
            ctx.apply(&param);
            return Ok(());
        }
        if in_precursor_list {
            return Ok(());
        }
        match param.accession.as_str() {
            accessions::MS_LEVEL => spectrum.ms_level = param.value_as_u8(),
            accessions::POSITIVE_SCAN => spectrum.polarity = Some(Polarity::Positive),
            accessions::NEGATIVE_SCAN => spectrum.polarity = Some(Polarity::Negative),
            accessions::SCAN_START_TIME => {
                spectrum.retention_time = param
                    .value_as_f64()
                    .map(|rt| retention_time_seconds(rt, param.unit_accession.as_deref()));
            }
            _ => {}
        }
        Ok(())
    }
}

impl<R: BufRead> ScanSource for MzMLScanReader<R> {
    fn next_scan(&mut self) -> Result<Option<Scan>, SearchError> {
        Ok(self.next_ms1()?)
    }
}
