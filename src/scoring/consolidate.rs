//! Scored output and routing of region scores to signatures.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{ScoredRegion, ScoringError};
use crate::ions::SignatureKey;
use crate::search::{AcquisitionMode, BUNDLE_SUFFIX};
use crate::signature::Signature;

/// Suffix of score files.
pub const SCORES_SUFFIX: &str = ".scores.json";

/// A scored hit bundle.
///
/// Serialized as the bundle without `hits` plus `scores`. Once consolidated,
/// `sigmap` is gone and every signature carries its cumulative `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Signature key to signature ids; removed by consolidation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigmap: Option<BTreeMap<String, Vec<String>>>,
    /// Sample path
    pub sample: String,
    /// Index of the last MS1 scan
    pub max_scan: usize,
    /// Signatures, ranked by score after consolidation
    pub signature_map: Vec<Signature>,
    /// Polarity summary
    pub mode: Option<AcquisitionMode>,
    /// Monoisotopic key to scored regions
    pub scores: BTreeMap<String, Vec<ScoredRegion>>,
}

impl ScoreReport {
    /// True once scores have been routed to signatures.
    pub fn is_consolidated(&self) -> bool {
        self.sigmap.is_none()
    }

    /// Route region scores to signatures.
    ///
    /// Each positive region adds its score to every signature listed for its
    /// key. All signatures receive a score, 0 when nothing routed to them, and
    /// are ranked by descending score. A consolidated report is returned
    /// unchanged.
    pub fn consolidate(mut self) -> Result<Self, ScoringError> {
        let Some(sigmap) = self.sigmap.take() else {
            return Ok(self);
        };
        let mut routes: HashMap<SignatureKey, &[String]> = HashMap::with_capacity(sigmap.len());
        for (text, uuids) in &sigmap {
            routes.insert(SignatureKey::parse(text)?, uuids.as_slice());
        }

        let mut totals: HashMap<&str, f64> = HashMap::new();
        for (text, regions) in &self.scores {
            let key = SignatureKey::parse(text)?;
            let Some(uuids) = routes.get(&key) else {
                debug!("No signatures routed from {}", text);
                continue;
            };
            let score: f64 = regions.iter().map(|r| r.score).filter(|s| *s > 0.0).sum();
            for uuid in *uuids {
                *totals.entry(uuid.as_str()).or_insert(0.0) += score;
            }
        }

        for signature in &mut self.signature_map {
            let uuid = signature.uuid.to_string();
            signature.score = Some(totals.get(uuid.as_str()).copied().unwrap_or(0.0));
        }
        self.signature_map
            .sort_by(|a, b| b.score.unwrap_or(0.0).total_cmp(&a.score.unwrap_or(0.0)));
        Ok(self)
    }

    /// Load a report from JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScoringError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the report as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ScoringError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// `<dir>/<stem>.scores.json` for a hit bundle, where `<stem>` drops the
/// `.scans.json` suffix.
pub fn scores_path(bundle: &Path, output_dir: &Path) -> PathBuf {
    let name = bundle
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match name.strip_suffix(BUNDLE_SUFFIX) {
        Some(stem) => stem.to_string(),
        None => bundle
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample".to_string()),
    };
    output_dir.join(format!("{}{}", stem, SCORES_SUFFIX))
}
