//! # Scan-level scoring
//!
//! Turns a [`HitBundle`](crate::search::HitBundle) into evidence per isotope
//! ladder:
//!
//! 1. hits at or below the scan cutoff are dropped and keys are parsed;
//! 2. keys sharing parent and adduct form a ladder, rung `i` holding order `i`;
//! 3. each rung's scans are grouped into gap-tolerant runs;
//! 4. every choice of one run per rung is scored from run rarity, rung-0
//!    signal-to-noise and rank correlation of each rung against rung 0;
//! 5. the best choice per `(left_base, apex, right_base)` is kept.
//!
//! [`ScoreReport::consolidate`] then sums region scores per signature.

mod clusterer;
mod consolidate;
mod error;
mod ladder;
mod scorer;
pub mod stats;

#[cfg(test)]
mod tests;

pub use clusterer::{consecutive_scans, DEFAULT_MAX_GAP, DEFAULT_MIN_GROUP_SIZE};
pub use consolidate::{scores_path, ScoreReport, SCORES_SUFFIX};
pub use error::ScoringError;
pub use ladder::{build_ladders, digest_hits, RungSeries, SignatureLadder};
pub use scorer::{ScanScorer, ScoredRegion};

/// Default rung-0 signal-to-noise cutoff.
pub const DEFAULT_SNR_CUTOFF: f64 = 2.5;

/// Default intensity cutoff for hits.
pub const DEFAULT_SCAN_CUTOFF: f64 = 0.0;

/// Scoring settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Rung 0 passes when `max > snr_cutoff × min`
    pub snr_cutoff: f64,
    /// Hits with intensity at or below this are ignored
    pub scan_cutoff: f64,
    /// Missing scans tolerated inside a run
    pub max_gap: usize,
    /// Minimum run length
    pub min_group_size: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            snr_cutoff: DEFAULT_SNR_CUTOFF,
            scan_cutoff: DEFAULT_SCAN_CUTOFF,
            max_gap: DEFAULT_MAX_GAP,
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
        }
    }
}

impl ScoringConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ScoringError> {
        if !(self.snr_cutoff > 0.0 && self.snr_cutoff.is_finite()) {
            return Err(ScoringError::InvalidConfig(format!(
                "snr_cutoff must be positive, got {}",
                self.snr_cutoff
            )));
        }
        if !(self.scan_cutoff >= 0.0 && self.scan_cutoff.is_finite()) {
            return Err(ScoringError::InvalidConfig(format!(
                "scan_cutoff must be non-negative, got {}",
                self.scan_cutoff
            )));
        }
        if self.min_group_size == 0 {
            return Err(ScoringError::InvalidConfig("min_group_size must be at least 1".into()));
        }
        Ok(())
    }
}
