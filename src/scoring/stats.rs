//! Per-rung statistics: run rarity, signal-to-noise and rank correlation.

use statrs::statistics::{Data, OrderStatistics, RankTieBreaker, Statistics};

/// Probability that a run of `run_length` consecutive hits arises by chance
/// when `hit_count` hits are spread over `max_scan` scans:
/// `Π_{k=0}^{run_length-2} (hit_count-1-k) / (max_scan-1-k)`.
///
/// A non-positive denominator makes the run uninformative (probability 1),
/// and the result is capped at 1.
pub fn rarity(run_length: usize, hit_count: usize, max_scan: usize) -> f64 {
    let hit_count = hit_count as f64;
    let max_scan = max_scan as f64;
    let mut p = 1.0;
    for k in 0..run_length.saturating_sub(1) {
        let k = k as f64;
        let denominator = max_scan - 1.0 - k;
        if denominator <= 0.0 {
            return 1.0;
        }
        p *= (hit_count - 1.0 - k) / denominator;
    }
    p.clamp(0.0, 1.0)
}

/// `max > cutoff × min`; false for an empty series.
pub fn snr_passes(intensities: &[f64], cutoff: f64) -> bool {
    if intensities.is_empty() {
        return false;
    }
    Statistics::max(intensities) > Statistics::min(intensities) * cutoff
}

/// Ranks starting at 1, ties receiving the mean of their positions.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut data = Data::new(values.to_vec());
    data.ranks(RankTieBreaker::Average)
}

/// Spearman rank correlation. NaN when either series is constant or the
/// series are shorter than two or of unequal length.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let spread = x.std_dev() * y.std_dev();
    // 0/0 for constant input stays NaN through the clamp
    (x.covariance(y) / spread).clamp(-1.0, 1.0)
}
