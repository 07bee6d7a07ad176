//! # Scan hit aggregation
//!
//! Matches every peak of every MS1 scan against a [`MassSearch`]
//! implementation and collects, per signature key, the time series of hits
//! that the scorer consumes.
//!
//! The result is a [`HitBundle`], which is also the on-disk interchange format
//! between the `search` and `score` stages:
//!
//! ```json
//! {
//!   "sigmap": {"<key>": ["<signature uuid>", ...]},
//!   "sample": "run01.mzML",
//!   "max_scan": 1234,
//!   "hits": {"<key>": [[scan, intensity, mz, time], ...]},
//!   "signature_map": [{...signature...}],
//!   "mode": "pos"
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::ions::MassSearch;
use crate::signature::Signature;

pub use crate::ions::Polarity;
pub use error::SearchError;

mod error;


/// Default mass tolerance in parts per million.
pub const DEFAULT_MZ_TOLERANCE_PPM: f64 = 10.0;

/// Suffix of hit bundle files.
pub const BUNDLE_SUFFIX: &str = ".scans.json";

/// One MS1 scan as delivered by a [`ScanSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    /// Scan polarity
    pub polarity: Polarity,
    /// Retention time in seconds
    pub retention_time: f64,
    /// Peak m/z values
    pub mz: Vec<f64>,
    /// Peak intensities, parallel to `mz`
    pub intensity: Vec<f64>,
}

/// A sequential source of MS1 scans.
pub trait ScanSource {
    /// Read the next MS1 scan; `Ok(None)` at the end of the run.
    fn next_scan(&mut self) -> Result<Option<Scan>, SearchError>;
}

/// Scans held in memory.
#[derive(Debug, Clone)]
pub struct MemoryScans {
    scans: std::vec::IntoIter<Scan>,
}

impl From<Vec<Scan>> for MemoryScans {
    fn from(scans: Vec<Scan>) -> Self {
        Self {
            scans: scans.into_iter(),
        }
    }
}

impl ScanSource for MemoryScans {
    fn next_scan(&mut self) -> Result<Option<Scan>, SearchError> {
        Ok(self.scans.next())
    }
}

/// A matched peak: `[scan, intensity, mz, time]` on disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(usize, f64, f64, f64)", into = "(usize, f64, f64, f64)")]
pub struct ScanHit {
    /// MS1 scan index
    pub scan: usize,
    /// Peak intensity
    pub intensity: f64,
    /// Observed m/z
    pub mz: f64,
    /// Retention time in seconds
    pub time: f64,
}

impl From<(usize, f64, f64, f64)> for ScanHit {
    fn from((scan, intensity, mz, time): (usize, f64, f64, f64)) -> Self {
        Self {
            scan,
            intensity,
            mz,
            time,
        }
    }
}

impl From<ScanHit> for (usize, f64, f64, f64) {
    fn from(hit: ScanHit) -> Self {
        (hit.scan, hit.intensity, hit.mz, hit.time)
    }
}

/// Polarity summary of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionMode {
    /// Positive scans only
    #[serde(rename = "pos")]
    Positive,
    /// Negative scans only
    #[serde(rename = "neg")]
    Negative,
    /// Both polarities
    #[serde(rename = "multiple")]
    Multiple,
}

impl AcquisitionMode {
    fn from_polarities(polarities: &BTreeSet<Polarity>) -> Option<Self> {
        let mut iter = polarities.iter();
        match (iter.next(), iter.next()) {
            (None, _) => None,
            (Some(_), Some(_)) => Some(Self::Multiple),
            (Some(Polarity::Positive), None) => Some(Self::Positive),
            (Some(Polarity::Negative), None) => Some(Self::Negative),
        }
    }
}

/// Per-sample hit time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitBundle {
    /// Signature key to the signature ids that produce it
    pub sigmap: BTreeMap<String, Vec<String>>,
    /// Sample path
    pub sample: String,
    /// Index of the last MS1 scan
    pub max_scan: usize,
    /// Signature key to hits in scan order
    pub hits: BTreeMap<String, Vec<ScanHit>>,
    /// The searched signatures
    pub signature_map: Vec<Signature>,
    /// Polarity summary; `null` when no scans were read
    pub mode: Option<AcquisitionMode>,
}

impl HitBundle {
    /// A bundle with no hits, used when a sample could not be read.
    pub fn empty(sample: impl Into<String>, signatures: &[Signature]) -> Self {
        Self {
            sigmap: BTreeMap::new(),
            sample: sample.into(),
            max_scan: 0,
            hits: BTreeMap::new(),
            signature_map: signatures.to_vec(),
            mode: None,
        }
    }

    /// Load a bundle from JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SearchError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the bundle as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SearchError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Total number of hits over all keys.
    pub fn hit_count(&self) -> usize {
        self.hits.values().map(Vec::len).sum()
    }
}

/// `<dir>/<stem>.scans.json` for a sample file.
pub fn bundle_path(sample: &Path, output_dir: &Path) -> PathBuf {
    let stem = sample
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sample".to_string());
    output_dir.join(format!("{}{}", stem, BUNDLE_SUFFIX))
}

/// Search settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Mass tolerance in parts per million
    pub mz_tolerance_ppm: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mz_tolerance_ppm: DEFAULT_MZ_TOLERANCE_PPM,
        }
    }
}

impl SearchConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), SearchError> {
        if !(self.mz_tolerance_ppm > 0.0 && self.mz_tolerance_ppm.is_finite()) {
            return Err(SearchError::InvalidConfig(format!(
                "mz_tolerance_ppm must be positive, got {}",
                self.mz_tolerance_ppm
            )));
        }
        Ok(())
    }
}

/// Turns scans into a [`HitBundle`].
pub struct ScanHitAggregator<'a, M: MassSearch + ?Sized> {
    search: &'a M,
    signatures: &'a [Signature],
    config: SearchConfig,
}

impl<'a, M: MassSearch + ?Sized> ScanHitAggregator<'a, M> {
    /// Create an aggregator over a mass search and the signatures behind it.
    pub fn new(search: &'a M, signatures: &'a [Signature], config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            search,
            signatures,
            config,
        })
    }

    /// Aggregate a scan source. Read failures are logged and yield an empty
    /// bundle so a batch run can continue with the next sample.
    pub fn aggregate<S: ScanSource>(&self, sample: &str, source: S) -> HitBundle {
        match self.try_aggregate(sample, source) {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!("Failed to read {}: {}", sample, e);
                HitBundle::empty(sample, self.signatures)
            }
        }
    }

    /// Aggregate a scan source, propagating read failures.
    pub fn try_aggregate<S: ScanSource>(&self, sample: &str, mut source: S) -> Result<HitBundle, SearchError> {
        let mut hits: HashMap<String, Vec<ScanHit>> = HashMap::new();
        let mut sigmap: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut polarities = BTreeSet::new();
        let mut max_scan = 0;
        let mut scan_no = 0;

        while let Some(scan) = source.next_scan()? {
            if scan.mz.len() != scan.intensity.len() {
                return Err(SearchError::ArrayLengthMismatch {
                    scan: scan_no,
                    mz: scan.mz.len(),
                    intensity: scan.intensity.len(),
                });
            }
            polarities.insert(scan.polarity);
            max_scan = scan_no;

            for (&mz, &intensity) in scan.mz.iter().zip(scan.intensity.iter()) {
                for candidate in self.search.search(mz, scan.polarity, self.config.mz_tolerance_ppm) {
                    let key = candidate.key_text();
                    let hit = ScanHit {
                        scan: scan_no,
                        intensity,
                        mz,
                        time: scan.retention_time,
                    };
                    let series = hits.entry(key.clone()).or_default();
                    // one hit per key and scan, keeping the most intense peak
                    match series.last_mut() {
                        Some(last) if last.scan == scan_no => {
                            if hit.intensity > last.intensity {
                                *last = hit;
                            }
                        }
                        _ => series.push(hit),
                    }
                    sigmap
                        .entry(key)
                        .or_default()
                        .extend(candidate.compounds.iter().map(|c| c.uuid.clone()));
                }
            }
            scan_no += 1;
        }

        let bundle = HitBundle {
            sigmap: sigmap
                .into_iter()
                .map(|(key, uuids)| (key, uuids.into_iter().collect()))
                .collect(),
            sample: sample.to_string(),
            max_scan,
            hits: hits.into_iter().collect(),
            signature_map: self.signatures.to_vec(),
            mode: AcquisitionMode::from_polarities(&polarities),
        };
        info!(
            "{}: {} MS1 scans, {} keys, {} hits",
            sample,
            scan_no,
            bundle.hits.len(),
            bundle.hit_count()
        );
        debug!("{} acquisition mode {:?}", sample, bundle.mode);
        Ok(bundle)
    }

    /// Aggregate an mzML file.
    #[cfg(feature = "mzml")]
    pub fn aggregate_file(&self, path: &Path) -> HitBundle {
        let sample = path.to_string_lossy().into_owned();
        match crate::mzml::MzMLScanReader::open(path) {
            Ok(reader) => self.aggregate(&sample, reader),
            Err(e) => {
                warn!("Failed to open {}: {}", sample, e);
                HitBundle::empty(sample, self.signatures)
            }
        }
    }
}
