use super::*;
use crate::ions::{KeyError, SignatureKey};
use crate::search::{AcquisitionMode, HitBundle, ScanHit};
use serde_json::Map;
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::tempdir;
use uuid::Uuid;

const MONO: &str = "X_199.000000$M+H[1+];0";
const C13: &str = "X_199.000000$M+H[1+],(C13);1";

fn hits(scans: &[usize], intensities: &[f64], mz: f64) -> Vec<ScanHit> {
    scans
        .iter()
        .zip(intensities)
        .map(|(&scan, &intensity)| ScanHit {
            scan,
            intensity,
            mz,
            time: scan as f64 * 0.5,
        })
        .collect()
}

fn signature() -> crate::signature::Signature {
    crate::signature::Signature {
        uuid: Uuid::new_v4(),
        parent: None,
        neutral_formula: "CH4".into(),
        neutral_formula_mass: 16.0313,
        reactions: String::new(),
        score: None,
        extra: Map::new(),
    }
}

fn bundle(hit_map: Vec<(&str, Vec<ScanHit>)>, max_scan: usize) -> HitBundle {
    HitBundle {
        sigmap: BTreeMap::new(),
        sample: "run.mzML".into(),
        max_scan,
        hits: hit_map.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        signature_map: Vec::new(),
        mode: Some(AcquisitionMode::Positive),
    }
}

fn worked_example() -> HitBundle {
    bundle(
        vec![(MONO, hits(&[10, 11, 12, 13, 14], &[100.0, 400.0, 1000.0, 300.0, 50.0], 200.0))],
        1000,
    )
}

#[test]
fn test_clusterer_examples() {
    assert_eq!(consecutive_scans(&[1, 2, 3, 10], 2, 2), vec![vec![1, 2, 3]]);
    assert_eq!(consecutive_scans(&[1, 2, 4, 5], 2, 2), vec![vec![1, 2, 4, 5]]);
    assert!(consecutive_scans(&[5], 2, 2).is_empty());
    assert_eq!(consecutive_scans(&[1, 1, 2, 2, 3], 2, 2), vec![vec![1, 2, 3]]);
    assert_eq!(consecutive_scans(&[1, 5, 6], 2, 2), vec![vec![5, 6]]);
    assert_eq!(consecutive_scans(&[1, 5, 6], 0, 1), vec![vec![1], vec![5, 6]]);
    assert!(consecutive_scans(&[], 2, 2).is_empty());
}

#[test]
fn test_single_rung_worked_example() {
    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    let report = scorer.score_bundle(&worked_example()).unwrap();

    let regions = &report.scores[MONO];
    assert_eq!(regions.len(), 1);
    let region = regions[0];
    let p = (4.0 / 999.0) * (3.0 / 998.0) * (2.0 / 997.0) * (1.0 / 996.0);
    assert!((region.score - (1.0 - p)).abs() < 1e-12);
    assert_eq!(region.left_base, 5.0);
    assert_eq!(region.apex, 6.0);
    assert_eq!(region.right_base, 7.0);
    assert_eq!(region.scans, 5);
    assert!((region.freq - 0.005).abs() < 1e-12);
    assert_eq!(region.integral, 1850.0);
    assert_eq!(region.mz, 200.0);
}

#[test]
fn test_snr_failure_scores_zero() {
    let flat = bundle(vec![(MONO, hits(&[1, 2, 3, 4], &[100.0; 4], 200.0))], 100);
    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    let report = scorer.score_bundle(&flat).unwrap();
    assert!(report.scores.is_empty());
}

#[test]
fn test_scoring_is_idempotent() {
    let input = worked_example();
    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    let first = scorer.score_bundle(&input).unwrap();
    let second = scorer.score_bundle(&input).unwrap();
    assert_eq!(first, second);

    let mut fresh = ScanScorer::new(ScoringConfig::default()).unwrap();
    assert_eq!(fresh.score_bundle(&input).unwrap(), first);
}

#[test]
fn test_scan_cutoff_drops_weak_hits() {
    let config = ScoringConfig {
        scan_cutoff: 250.0,
        ..Default::default()
    };
    let mut scorer = ScanScorer::new(config).unwrap();
    let report = scorer.score_bundle(&worked_example()).unwrap();
    // only scans 11, 12, 13 survive
    let region = report.scores[MONO][0];
    assert_eq!(region.scans, 3);
    assert_eq!(region.left_base, 5.5);
    assert_eq!(region.right_base, 6.5);
    assert_eq!(region.integral, 1700.0);
}

#[test]
fn test_correlated_isotope_rung_adds_evidence() {
    let input = bundle(
        vec![
            (MONO, hits(&[10, 11, 12, 13, 14], &[100.0, 400.0, 1000.0, 300.0, 50.0], 200.0)),
            (C13, hits(&[10, 11, 12, 13, 14], &[10.0, 40.0, 100.0, 30.0, 5.0], 201.0)),
        ],
        1000,
    );
    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    let report = scorer.score_bundle(&input).unwrap();
    let region = report.scores[MONO][0];
    let p = (4.0 / 999.0) * (3.0 / 998.0) * (2.0 / 997.0) * (1.0 / 996.0);
    assert!((region.score - 2.0 * (1.0 - p)).abs() < 1e-12);
    assert_eq!(region.integral, 1850.0 + 185.0);
    assert_eq!(region.mz, 200.0);
    assert!(!report.scores.contains_key(C13));
}

#[test]
fn test_anticorrelated_rung_contributes_nothing() {
    let input = bundle(
        vec![
            (MONO, hits(&[10, 11, 12, 13, 14], &[100.0, 400.0, 1000.0, 300.0, 50.0], 200.0)),
            (C13, hits(&[10, 11, 12, 13, 14], &[100.0, 40.0, 10.0, 30.0, 500.0], 201.0)),
        ],
        1000,
    );
    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    let region = scorer.score_bundle(&input).unwrap().scores[MONO][0];
    let p = (4.0 / 999.0) * (3.0 / 998.0) * (2.0 / 997.0) * (1.0 / 996.0);
    assert!((region.score - (1.0 - p)).abs() < 1e-12);
    assert_eq!(region.integral, 1850.0);
}

#[test]
fn test_wider_isotope_run_skips_combination() {
    // the isotope run is longer than the monoisotopic one
    let input = bundle(
        vec![
            (MONO, hits(&[10, 11, 12], &[100.0, 1000.0, 100.0], 200.0)),
            (C13, hits(&[9, 10, 11, 12, 13], &[1.0, 10.0, 100.0, 10.0, 1.0], 201.0)),
        ],
        1000,
    );
    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    assert!(scorer.score_bundle(&input).unwrap().scores.is_empty());
}

/// A five-scan run plus 45 isolated hits, 50 hits in a 1000-scan file.
fn run_among_isolated_hits(run_intensities: &[f64]) -> HitBundle {
    let mut scans: Vec<usize> = (10..15).collect();
    let mut intensities = run_intensities.to_vec();
    scans.extend((0..45).map(|k| 100 + 10 * k));
    intensities.extend(std::iter::repeat(10.0).take(45));
    bundle(vec![(MONO, hits(&scans, &intensities, 200.0))], 1000)
}

#[test]
fn test_constant_run_among_isolated_hits_fails_snr() {
    let input = run_among_isolated_hits(&[500.0; 5]);
    let digested = digest_hits(&input.hits, 0.0).unwrap();
    let ladders = build_ladders(digested.keys()).unwrap();
    assert_eq!(ladders.len(), 1);
    assert_eq!(digested[&ladders[0].rungs[0]].len(), 50);

    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    assert_eq!(scorer.config().snr_cutoff, 2.5);
    assert!(scorer.score_ladder(&ladders[0], &digested, 1000).is_empty());
    assert!(scorer.score_bundle(&input).unwrap().scores.is_empty());
}

#[test]
fn test_rarity_uses_all_rung_hits_not_run_length() {
    let input = run_among_isolated_hits(&[100.0, 400.0, 1000.0, 300.0, 50.0]);
    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    let report = scorer.score_bundle(&input).unwrap();

    let regions = &report.scores[MONO];
    assert_eq!(regions.len(), 1);
    let region = regions[0];
    let p = (49.0 / 999.0) * (48.0 / 998.0) * (47.0 / 997.0) * (46.0 / 996.0);
    assert!((region.score - (1.0 - p)).abs() < 1e-12, "score = {}", region.score);
    assert_eq!(region.scans, 5);
    assert!((region.freq - 0.05).abs() < 1e-12);
    assert_eq!(region.integral, 1850.0);
    assert_eq!(region.apex, 6.0);
}

#[test]
fn test_ladder_without_monoisotopic_rung_is_discarded() {
    let input = bundle(
        vec![(C13, hits(&[10, 11, 12, 13, 14], &[100.0, 400.0, 1000.0, 300.0, 50.0], 201.0))],
        1000,
    );
    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    assert!(scorer.score_bundle(&input).unwrap().scores.is_empty());
}

#[test]
fn test_best_region_per_boundary_and_separate_runs() {
    let input = bundle(
        vec![(
            MONO,
            hits(
                &[10, 11, 12, 50, 51, 52],
                &[100.0, 1000.0, 100.0, 50.0, 500.0, 50.0],
                200.0,
            ),
        )],
        1000,
    );
    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    let report = scorer.score_bundle(&input).unwrap();
    let regions = &report.scores[MONO];
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].apex, 5.5);
    assert_eq!(regions[1].apex, 25.5);
    assert!((regions[0].freq - 0.006).abs() < 1e-12);
}

#[test]
fn test_zero_max_scan_degenerates() {
    let input = bundle(vec![(MONO, hits(&[0, 1, 2], &[1.0, 10.0, 1.0], 200.0))], 0);
    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    // rarity 1 leaves no evidence
    assert!(scorer.score_bundle(&input).unwrap().scores.is_empty());
}

#[test]
fn test_duplicate_and_malformed_keys_are_fatal() {
    let same_rung = bundle(
        vec![
            ("X$M+H[1+],(C13);1", hits(&[1, 2], &[1.0, 2.0], 1.0)),
            ("X$M+H[1+],(H2);1", hits(&[1, 2], &[1.0, 2.0], 1.0)),
        ],
        10,
    );
    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    assert!(matches!(
        scorer.score_bundle(&same_rung),
        Err(ScoringError::KeyError(KeyError::Duplicate(_)))
    ));

    let same_key = bundle(
        vec![
            ("X$M+H[1+];1", hits(&[1, 2], &[1.0, 2.0], 1.0)),
            ("X$M+H[1+];01", hits(&[1, 2], &[1.0, 2.0], 1.0)),
        ],
        10,
    );
    assert!(matches!(
        scorer.score_bundle(&same_key),
        Err(ScoringError::KeyError(KeyError::Duplicate(_)))
    ));

    let malformed = bundle(vec![("no-separator", hits(&[1, 2], &[1.0, 2.0], 1.0))], 10);
    assert!(matches!(scorer.score_bundle(&malformed), Err(ScoringError::KeyError(_))));
}

#[test]
fn test_build_ladders_stops_at_first_gap() {
    let keys: Vec<SignatureKey> = ["P$A;0", "P$A,(C13);1", "P$A,(C13,H2);3", "Q$A;1"]
        .iter()
        .map(|k| SignatureKey::parse(k).unwrap())
        .collect();
    let ladders = build_ladders(&keys).unwrap();
    assert_eq!(ladders.len(), 1);
    assert_eq!(ladders[0].rungs.len(), 2);
    assert_eq!(ladders[0].id(), "P$A;0");
}

#[test]
fn test_config_validation() {
    assert!(ScoringConfig::default().validate().is_ok());
    let bad = [
        ScoringConfig { snr_cutoff: 0.0, ..Default::default() },
        ScoringConfig { snr_cutoff: -2.5, ..Default::default() },
        ScoringConfig { scan_cutoff: -1.0, ..Default::default() },
        ScoringConfig { min_group_size: 0, ..Default::default() },
    ];
    for config in bad {
        assert!(matches!(config.validate(), Err(ScoringError::InvalidConfig(_))));
        assert!(ScanScorer::new(config).is_err());
    }
}

#[test]
fn test_consolidation_routes_scores() {
    let matched = signature();
    let shared = signature();
    let unmatched = signature();

    let mut input = bundle(
        vec![
            (MONO, hits(&[10, 11, 12, 13, 14], &[100.0, 400.0, 1000.0, 300.0, 50.0], 200.0)),
            ("Y_1.000000$M+H[1+];0", hits(&[20, 21, 22], &[10.0, 100.0, 10.0], 300.0)),
        ],
        1000,
    );
    input.sigmap.insert(MONO.into(), vec![matched.uuid.to_string(), shared.uuid.to_string()]);
    input
        .sigmap
        .insert("Y_1.000000$M+H[1+];0".into(), vec![shared.uuid.to_string()]);
    input.signature_map = vec![unmatched.clone(), matched.clone(), shared.clone()];

    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    let report = scorer.score_bundle(&input).unwrap();
    assert!(!report.is_consolidated());
    let x = report.scores[MONO][0].score;
    let y = report.scores["Y_1.000000$M+H[1+];0"][0].score;

    let consolidated = report.consolidate().unwrap();
    assert!(consolidated.is_consolidated());
    let ranked: Vec<(Uuid, f64)> = consolidated
        .signature_map
        .iter()
        .map(|s| (s.uuid, s.score.unwrap()))
        .collect();
    assert_eq!(ranked[0], (shared.uuid, x + y));
    assert_eq!(ranked[1], (matched.uuid, x));
    assert_eq!(ranked[2], (unmatched.uuid, 0.0));

    let again = consolidated.clone().consolidate().unwrap();
    assert_eq!(again, consolidated);
}

#[test]
fn test_report_json_shape() {
    let mut input = worked_example();
    input.sigmap.insert(MONO.into(), vec!["a".into()]);
    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    let report = scorer.score_bundle(&input).unwrap();

    let value = serde_json::to_value(&report).unwrap();
    assert!(value.get("hits").is_none());
    assert!(value.get("sigmap").is_some());
    let region = &value["scores"][MONO][0];
    for field in ["left_base", "apex", "right_base", "score", "scans", "freq", "integral", "mz"] {
        assert!(region.get(field).is_some(), "missing {}", field);
    }

    let consolidated = serde_json::to_value(report.consolidate().unwrap()).unwrap();
    assert!(consolidated.get("sigmap").is_none());
}

#[test]
fn test_report_roundtrip_and_path() {
    let dir = tempdir().unwrap();
    let path = scores_path(Path::new("/tmp/run01.scans.json"), dir.path());
    assert_eq!(path, dir.path().join("run01.scores.json"));
    assert_eq!(
        scores_path(Path::new("other.json"), dir.path()),
        dir.path().join("other.scores.json")
    );

    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    let report = scorer.score_bundle(&worked_example()).unwrap();
    report.save(&path).unwrap();
    let loaded = ScoreReport::load(&path).unwrap();
    assert_eq!(loaded.sample, report.sample);
    assert_eq!(loaded.sigmap, report.sigmap);
    assert_eq!(loaded.mode, report.mode);
    let (a, b) = (loaded.scores[MONO][0], report.scores[MONO][0]);
    assert!((a.score - b.score).abs() < 1e-12);
    assert_eq!((a.scans, a.apex, a.integral), (b.scans, b.apex, b.integral));
}
