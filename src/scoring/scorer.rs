use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use log::{debug, info};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use super::clusterer::consecutive_scans;
use super::ladder::{build_ladders, digest_hits, RungSeries, SignatureLadder};
use super::stats::{rarity, snr_passes, spearman};
use super::{ScoreReport, ScoringConfig, ScoringError};
use crate::ions::SignatureKey;
use crate::search::HitBundle;

/// Rung correlations at or below this are treated as no evidence.
const MIN_CORRELATION: f64 = 0.5;

/// Evidence for one ladder over one time region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredRegion {
    /// Retention time of the first rung-0 scan
    pub left_base: f64,
    /// Retention time of the most intense rung-0 scan
    pub apex: f64,
    /// Retention time of the last rung-0 scan
    pub right_base: f64,
    /// Summed rung evidence
    pub score: f64,
    /// Rung-0 run length
    pub scans: usize,
    /// Rung-0 detection frequency over the run
    pub freq: f64,
    /// Summed intensity of the correlated rungs
    pub integral: f64,
    /// Mean rung-0 m/z
    pub mz: f64,
}

type Boundary = (OrderedFloat<f64>, OrderedFloat<f64>, OrderedFloat<f64>);

struct Rung<'a> {
    series: &'a RungSeries,
    runs: Vec<Vec<usize>>,
}

/// Scores hit bundles.
///
/// A scorer memoizes run rarities and is meant to be owned by one worker.
#[derive(Debug, Clone)]
pub struct ScanScorer {
    config: ScoringConfig,
    rarity_cache: HashMap<(usize, usize, usize), f64>,
}

impl ScanScorer {
    /// Create a scorer, validating the configuration.
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        Ok(Self {
            config,
            rarity_cache: HashMap::new(),
        })
    }

    /// The scoring configuration.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score every ladder of a bundle.
    ///
    /// The report carries the bundle without its hits; scores are keyed by
    /// the monoisotopic key of each ladder and only ladders with positive
    /// evidence appear.
    pub fn score_bundle(&mut self, bundle: &HitBundle) -> Result<ScoreReport, ScoringError> {
        let digested = digest_hits(&bundle.hits, self.config.scan_cutoff)?;
        let ladders = build_ladders(digested.keys())?;

        let mut scores = BTreeMap::new();
        for ladder in &ladders {
            let regions = self.score_ladder(ladder, &digested, bundle.max_scan);
            if !regions.is_empty() {
                debug!("{}: {} scored regions", ladder.id(), regions.len());
                scores.insert(ladder.id(), regions);
            }
        }
        info!(
            "{}: {} ladders, {} with evidence",
            bundle.sample,
            ladders.len(),
            scores.len()
        );

        Ok(ScoreReport {
            sigmap: Some(bundle.sigmap.clone()),
            sample: bundle.sample.clone(),
            max_scan: bundle.max_scan,
            signature_map: bundle.signature_map.clone(),
            mode: bundle.mode,
            scores,
        })
    }

    /// Score one ladder, returning the best positive region per
    /// `(left_base, apex, right_base)` in boundary order.
    pub fn score_ladder(
        &mut self,
        ladder: &SignatureLadder,
        digested: &BTreeMap<SignatureKey, RungSeries>,
        max_scan: usize,
    ) -> Vec<ScoredRegion> {
        let mut rungs = Vec::with_capacity(ladder.rungs.len());
        for key in &ladder.rungs {
            let Some(series) = digested.get(key) else {
                break;
            };
            let runs = consecutive_scans(&series.scans(), self.config.max_gap, self.config.min_group_size);
            if runs.is_empty() {
                break;
            }
            rungs.push(Rung { series, runs });
        }
        let Some(base) = rungs.first() else {
            return Vec::new();
        };
        let base_series = base.series;
        let mz = base_series.mean_mz();
        let freq = if max_scan == 0 {
            0.0
        } else {
            base_series.len() as f64 / max_scan as f64
        };

        let mut best: BTreeMap<Boundary, ScoredRegion> = BTreeMap::new();
        for choice in rungs.iter().map(|rung| 0..rung.runs.len()).multi_cartesian_product() {
            let runs: Vec<&[usize]> = choice
                .iter()
                .zip(&rungs)
                .map(|(&i, rung)| rung.runs[i].as_slice())
                .collect();
            // a ladder cannot widen as it climbs
            if runs.windows(2).any(|pair| pair[1].len() > pair[0].len()) {
                continue;
            }

            let base_run = runs[0];
            let (Some(first), Some(last)) = (base_run.first(), base_run.last()) else {
                continue;
            };
            let left_base = base_series.get(*first).map_or(0.0, |hit| hit.time);
            let right_base = base_series.get(*last).map_or(0.0, |hit| hit.time);
            let mut apex_hit = base_series.get(*first);
            for scan in base_run {
                let hit = base_series.get(*scan);
                if let (Some(hit), Some(apex)) = (hit, apex_hit) {
                    if hit.intensity > apex.intensity {
                        apex_hit = Some(hit);
                    }
                }
            }
            let apex = apex_hit.map_or(0.0, |hit| hit.time);

            let (score, integral) = self.score_runs(&rungs, &runs, max_scan);
            if score <= 0.0 {
                continue;
            }
            let boundary = (OrderedFloat(left_base), OrderedFloat(apex), OrderedFloat(right_base));
            if best.get(&boundary).is_some_and(|region| region.score >= score) {
                continue;
            }
            best.insert(
                boundary,
                ScoredRegion {
                    left_base,
                    apex,
                    right_base,
                    score,
                    scans: base_run.len(),
                    freq,
                    integral,
                    mz,
                },
            );
        }
        best.into_values().collect()
    }

    fn score_runs(&mut self, rungs: &[Rung<'_>], runs: &[&[usize]], max_scan: usize) -> (f64, f64) {
        let base_run = runs[0];
        let base_intensities: Vec<f64> = base_run.iter().map(|&s| rungs[0].series.intensity(s)).collect();
        if !snr_passes(&base_intensities, self.config.snr_cutoff) {
            return (0.0, 0.0);
        }

        let mut score = 0.0;
        let mut integral = 0.0;
        for (rung, run) in rungs.iter().zip(runs) {
            let p = self.rarity(run.len(), rung.series.len(), max_scan);
            let aligned: Vec<f64> = base_run
                .iter()
                .map(|s| {
                    if run.binary_search(s).is_ok() {
                        rung.series.intensity(*s)
                    } else {
                        0.0
                    }
                })
                .collect();
            let mut corr = spearman(&aligned, &base_intensities);
            if corr.is_nan() || corr <= MIN_CORRELATION {
                corr = 0.0;
            }
            score += (1.0 - p) * corr;
            if corr != 0.0 {
                integral += run.iter().map(|&s| rung.series.intensity(s)).sum::<f64>();
            }
        }
        (score, integral)
    }

    fn rarity(&mut self, run_length: usize, hit_count: usize, max_scan: usize) -> f64 {
        *self
            .rarity_cache
            .entry((run_length, hit_count, max_scan))
            .or_insert_with(|| rarity(run_length, hit_count, max_scan))
    }
}
