//! # xenoscan - Exposome Mining for LC-MS Data
//!
//! `xenoscan` searches LC-MS runs for evidence of xenobiotic exposure. Known
//! compounds are expanded by combinations of biotransformation reactions into
//! candidate signatures, each signature fans out into adduct and isotopologue
//! ions, and every MS1 peak is matched against those ions. The resulting
//! per-scan hit series are then scored for chromatographic evidence and the
//! scores are routed back to the signatures that explain them.
//!
//! ## Pipeline
//!
//! ```text
//! compounds + reactions ──► SignatureGenerator ──► signatures
//!                                                      │
//!                                   IonIndex (adducts × isotopologues)
//!                                                      │
//! mzML MS1 scans ─────────► ScanHitAggregator ──► HitBundle (<stem>.scans.json)
//!                                                      │
//!                      ScanScorer (ladders, runs, rarity, SNR, correlation)
//!                                                      │
//!                                 ScoreReport::consolidate (<stem>.scores.json)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use xenoscan::prelude::*;
//!
//! // Expand one compound by one reaction
//! let compound = Compound::new("C19H28O3")?;
//! let reaction = Reaction::new("hydroxylation", Formula::parse("O")?);
//! let mut generator = SignatureGenerator::from_compounds_reactions(vec![compound], vec![reaction]);
//! let signatures = generator
//!     .generate(&GeneratorConfig { reaction_depth: 1, ..Default::default() })?
//!     .to_vec();
//! assert_eq!(signatures.len(), 2);
//!
//! // Index their ions and search three scans
//! let index = IonIndex::build(&signatures, &IonConfig::default())?;
//! let aggregator = ScanHitAggregator::new(&index, &signatures, SearchConfig::default())?;
//! let mz = Adduct::lookup("M+H[1+]").map(|a| a.mz(signatures[0].neutral_formula_mass));
//! let scans: Vec<Scan> = [100.0, 1000.0, 100.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &intensity)| Scan {
//!         polarity: Polarity::Positive,
//!         retention_time: i as f64,
//!         mz: mz.into_iter().collect(),
//!         intensity: vec![intensity],
//!     })
//!     .collect();
//! let bundle = aggregator.aggregate("demo", MemoryScans::from(scans));
//!
//! // Score and route the evidence to signatures
//! let mut scorer = ScanScorer::new(ScoringConfig::default())?;
//! let report = scorer.score_bundle(&bundle)?.consolidate()?;
//! assert!(report.signature_map[0].score.unwrap_or(0.0) >= 0.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`formula`]: element-count algebra and Hill notation
//! - [`isotopes`]: isotope table and best-first isotopologue enumeration
//! - [`signature`]: compound/reaction ingestion, signature generation, catalogs
//! - [`ions`]: adducts, signature keys and the in-memory m/z index
//! - [`search`]: scan sources and hit aggregation into bundles
//! - [`mzml`]: streaming mzML scan reader (feature `mzml`)
//! - [`scoring`]: run clustering, evidence scoring and consolidation

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
// Allow some patterns common in scientific code
#![allow(clippy::too_many_arguments)]

pub mod formula;
pub mod ions;
pub mod isotopes;
#[cfg(feature = "mzml")]
pub mod mzml;
pub mod scoring;
pub mod search;
pub mod signature;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::formula::{sum_formulas, Formula, FormulaError};
    pub use crate::ions::{
        Adduct, IonConfig, IonError, IonIndex, KeyError, MassMatch, MassSearch, Polarity, SignatureKey,
    };
    pub use crate::isotopes::{monoisotopic_mass, Isotopologue, IsotopologueEnumerator};
    #[cfg(feature = "mzml")]
    pub use crate::mzml::{MzMLError, MzMLScanReader};
    pub use crate::scoring::{
        consecutive_scans, ScanScorer, ScoreReport, ScoredRegion, ScoringConfig, ScoringError,
    };
    pub use crate::search::{
        AcquisitionMode, HitBundle, MemoryScans, Scan, ScanHit, ScanHitAggregator, ScanSource, SearchConfig,
        SearchError,
    };
    pub use crate::signature::{
        Compound, GeneratorConfig, Reaction, Signature, SignatureCatalog, SignatureError, SignatureGenerator,
    };
}
