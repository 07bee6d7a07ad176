//! End-to-end pipeline test: catalog generation, ion indexing, mzML search,
//! scoring and consolidation.

#![cfg(feature = "mzml")]

use base64::Engine;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use xenoscan::ions::{interim_id, Adduct, IonConfig, IonIndex, Polarity};
use xenoscan::scoring::{scores_path, ScanScorer, ScoreReport, ScoringConfig};
use xenoscan::search::{bundle_path, HitBundle, ScanHitAggregator, SearchConfig};
use xenoscan::signature::{
    load_compounds, load_reactions, CatalogMetadata, GeneratorConfig, SignatureCatalog, SignatureGenerator,
};

const SCAN_COUNT: usize = 40;
const PEAK_SCANS: std::ops::Range<usize> = 15..22;
const PROFILE: [f64; 7] = [100.0, 800.0, 3000.0, 9000.0, 2500.0, 700.0, 90.0];

fn encode(values: &[f64]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn write_mzml(path: &Path, mono_mz: f64, c13_mz: f64) {
    let mut spectra = String::new();
    for scan in 0..SCAN_COUNT {
        let mut mz = vec![150.0 + scan as f64 * 0.01, 612.3];
        let mut intensity = vec![50.0, 75.0];
        if PEAK_SCANS.contains(&scan) {
            let apex = PROFILE[scan - PEAK_SCANS.start];
            mz.extend([mono_mz, c13_mz]);
            intensity.extend([apex, apex * 0.2]);
        }
        spectra.push_str(&format!(
            r#"      <spectrum index="{index}" id="scan={id}" defaultArrayLength="{len}">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="1"/>
        <cvParam cvRef="MS" accession="MS:1000130" name="positive scan"/>
        <scanList count="1">
          <scan>
            <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="{rt}" unitCvRef="UO" unitAccession="UO:0000010" unitName="second"/>
          </scan>
        </scanList>
        <binaryDataArrayList count="2">
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000514" name="m/z array"/>
            <binary>{mz}</binary>
          </binaryDataArray>
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000515" name="intensity array"/>
            <binary>{intensity}</binary>
          </binaryDataArray>
        </binaryDataArrayList>
      </spectrum>
"#,
            index = scan,
            id = scan + 1,
            len = mz.len(),
            rt = 60.0 + scan as f64 * 2.0,
            mz = encode(&mz),
            intensity = encode(&intensity),
        ));
    }
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0">
  <run id="synthetic">
    <spectrumList count="{}">
{}    </spectrumList>
  </run>
</mzML>"#,
        SCAN_COUNT, spectra
    );
    fs::write(path, document).unwrap();
}

#[test]
fn test_generate_search_score_consolidate() {
    let dir = tempdir().unwrap();

    // catalog
    let compounds_path = dir.path().join("compounds.json");
    let reactions_path = dir.path().join("reactions.json");
    fs::write(
        &compounds_path,
        r#"{"compounds": [
            {"name": "androgen", "neutral_formula": "C19H28O3", "id": "HMDB0000001"},
            {"name": "broken"}
        ]}"#,
    )
    .unwrap();
    fs::write(
        &reactions_path,
        r#"[{"reaction_name": "hydroxylation", "formula_dict": {"O": 1}}]"#,
    )
    .unwrap();

    let compounds = load_compounds(&compounds_path).unwrap();
    let reactions = load_reactions(&reactions_path).unwrap();
    assert_eq!(compounds.len(), 1);
    let mut generator = SignatureGenerator::from_compounds_reactions(compounds, reactions);
    generator
        .generate(&GeneratorConfig {
            reaction_depth: 1,
            ..Default::default()
        })
        .unwrap();
    let signatures = generator.into_signatures();
    assert_eq!(signatures.len(), 2);

    let catalog_path = dir.path().join("signatures.json");
    let metadata = CatalogMetadata::new(1, 1, 1, signatures.len());
    SignatureCatalog::new(signatures, &metadata)
        .unwrap()
        .save(&catalog_path)
        .unwrap();
    let catalog = SignatureCatalog::load(&catalog_path).unwrap();
    let parent = catalog
        .data
        .iter()
        .find(|s| s.reactions.is_empty())
        .unwrap()
        .clone();
    let hydroxylated = catalog
        .data
        .iter()
        .find(|s| s.reactions == "hydroxylation")
        .unwrap()
        .clone();
    assert_eq!(hydroxylated.neutral_formula, "C19H28O4");

    // ions
    let config = IonConfig {
        adducts: vec!["M+H[1+]".into()],
        ..Default::default()
    };
    let index = IonIndex::build(&catalog.data, &config).unwrap();
    let id = interim_id(&parent.neutral_formula, parent.neutral_formula_mass);
    let mono_mz = Adduct::lookup("M+H[1+]")
        .unwrap()
        .mz(parent.neutral_formula_mass);
    let c13 = index
        .ions(Polarity::Positive)
        .iter()
        .find(|ion| ion.key.parent == id && ion.key.order == 1)
        .unwrap();
    assert_eq!(c13.key.isotope.as_deref(), Some("C13"));

    // search
    let mzml_path = dir.path().join("sample01.mzML");
    write_mzml(&mzml_path, mono_mz, c13.mz);
    let aggregator = ScanHitAggregator::new(&index, &catalog.data, SearchConfig::default()).unwrap();
    let bundle = aggregator.aggregate_file(&mzml_path);
    assert_eq!(bundle.max_scan, SCAN_COUNT - 1);
    let mono_key = format!("{}$M+H[1+];0", id);
    assert_eq!(bundle.hits[&mono_key].len(), PEAK_SCANS.len());
    assert_eq!(bundle.sigmap[&mono_key], vec![parent.uuid.to_string()]);

    let bundle_file = bundle_path(&mzml_path, dir.path());
    bundle.save(&bundle_file).unwrap();
    let bundle = HitBundle::load(&bundle_file).unwrap();

    // score
    let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
    let report = scorer.score_bundle(&bundle).unwrap();
    let regions = &report.scores[&mono_key];
    assert_eq!(regions.len(), 1);
    let region = regions[0];
    assert_eq!(region.scans, PEAK_SCANS.len());
    assert_eq!(region.left_base, 90.0);
    assert_eq!(region.apex, 96.0);
    assert_eq!(region.right_base, 102.0);
    // monoisotopic and C13 rungs both count
    assert!(region.score > 1.9 && region.score <= 2.0);

    let report = report.consolidate().unwrap();
    let scores_file = scores_path(&bundle_file, dir.path());
    assert_eq!(scores_file, dir.path().join("sample01.scores.json"));
    report.save(&scores_file).unwrap();

    let report = ScoreReport::load(&scores_file).unwrap();
    assert!(report.is_consolidated());
    assert_eq!(report.signature_map[0].uuid, parent.uuid);
    assert!(report.signature_map[0].score.unwrap() > 1.9);
    assert_eq!(report.signature_map[1].uuid, hydroxylated.uuid);
    assert_eq!(report.signature_map[1].score, Some(0.0));
}

#[test]
fn test_unreadable_sample_yields_empty_bundle() {
    let dir = tempdir().unwrap();
    let broken = dir.path().join("broken.mzML");
    fs::write(&broken, "<mzML><run><spectrumList><spectrum id=\"x\">").unwrap();

    let index = IonIndex::default();
    let aggregator = ScanHitAggregator::new(&index, &[], SearchConfig::default()).unwrap();

    let bundle = aggregator.aggregate_file(&broken);
    assert!(bundle.hits.is_empty());
    assert_eq!(bundle.mode, None);

    let missing = aggregator.aggregate_file(&dir.path().join("absent.mzML"));
    assert!(missing.hits.is_empty());
}
