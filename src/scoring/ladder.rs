//! Hit digestion and isotope ladder reconstruction.

use std::collections::{BTreeMap, HashSet};

use log::debug;

use crate::ions::{KeyError, SignatureKey};
use crate::search::ScanHit;

/// Hits of one key, indexed by scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RungSeries {
    points: BTreeMap<usize, ScanHit>,
}

impl RungSeries {
    /// Keep hits above `scan_cutoff`; a later hit on the same scan replaces an
    /// earlier one.
    pub fn digest(hits: &[ScanHit], scan_cutoff: f64) -> Self {
        Self {
            points: hits
                .iter()
                .filter(|hit| hit.intensity > scan_cutoff)
                .map(|hit| (hit.scan, *hit))
                .collect(),
        }
    }

    /// Number of distinct scans with a hit.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no hit survived digestion.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Scans with a hit, ascending.
    pub fn scans(&self) -> Vec<usize> {
        self.points.keys().copied().collect()
    }

    /// Hit at `scan`.
    pub fn get(&self, scan: usize) -> Option<&ScanHit> {
        self.points.get(&scan)
    }

    /// Intensity at `scan`, 0 when absent.
    pub fn intensity(&self, scan: usize) -> f64 {
        self.points.get(&scan).map_or(0.0, |hit| hit.intensity)
    }

    /// Mean m/z over all hits; 0 when empty.
    pub fn mean_mz(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.values().map(|hit| hit.mz).sum::<f64>() / self.points.len() as f64
    }
}

/// Digest a bundle's hit map into parsed keys.
///
/// Two key texts that parse to the same key are rejected.
pub fn digest_hits(
    hits: &BTreeMap<String, Vec<ScanHit>>,
    scan_cutoff: f64,
) -> Result<BTreeMap<SignatureKey, RungSeries>, KeyError> {
    let mut digested = BTreeMap::new();
    for (text, series) in hits {
        let key = SignatureKey::parse(text)?;
        if digested.contains_key(&key) {
            return Err(KeyError::Duplicate(text.clone()));
        }
        digested.insert(key, RungSeries::digest(series, scan_cutoff));
    }
    Ok(digested)
}

/// Keys of one parent and adduct, `rungs[i].order == i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureLadder {
    /// Rungs in ascending order, starting at the monoisotopic key
    pub rungs: Vec<SignatureKey>,
}

impl SignatureLadder {
    /// The monoisotopic key.
    pub fn rung_zero(&self) -> &SignatureKey {
        &self.rungs[0]
    }

    /// Text of the monoisotopic key; scores are reported under it.
    pub fn id(&self) -> String {
        self.rung_zero().to_string()
    }
}

/// Group keys into ladders.
///
/// Each ladder runs from order 0 up to the first missing order; parents
/// without an order-0 key are discarded. Two keys on the same rung of the
/// same ladder are rejected.
pub fn build_ladders<'a, I>(keys: I) -> Result<Vec<SignatureLadder>, KeyError>
where
    I: IntoIterator<Item = &'a SignatureKey>,
{
    let mut groups: BTreeMap<(&str, &str), BTreeMap<usize, &SignatureKey>> = BTreeMap::new();
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert((key.parent.as_str(), key.adduct.as_str(), key.order)) {
            return Err(KeyError::Duplicate(key.to_string()));
        }
        groups
            .entry((key.parent.as_str(), key.adduct.as_str()))
            .or_default()
            .insert(key.order, key);
    }

    let mut ladders = Vec::with_capacity(groups.len());
    for ((parent, adduct), rungs) in groups {
        let rungs: Vec<SignatureKey> = rungs
            .values()
            .enumerate()
            .take_while(|(i, key)| key.order == *i)
            .map(|(_, key)| (*key).clone())
            .collect();
        if rungs.is_empty() {
            debug!("Discarding {}${}: no monoisotopic key", parent, adduct);
            continue;
        }
        ladders.push(SignatureLadder { rungs });
    }
    Ok(ladders)
}
