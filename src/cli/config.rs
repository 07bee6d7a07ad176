//! TOML configuration file support.
//!
//! Every pipeline parameter can be set in a config file instead of on the
//! command line; flags still take precedence:
//!
//! ```toml
//! # xenoscan.toml
//! [generation]
//! reaction_depth = 3
//! max_reaction_combinations = 1000000
//!
//! [search]
//! mz_tolerance_ppm = 10.0
//! nap_cutoff = 0.01
//! adducts = ["M+H[1+]", "M+Na[1+]", "M-H[1-]"]
//!
//! [scoring]
//! snr_cutoff = 2.5
//! scan_cutoff = 0.0
//! max_gap = 2
//! min_group_size = 2
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use xenoscan::ions::IonConfig;
use xenoscan::scoring::ScoringConfig;
use xenoscan::search::SearchConfig;
use xenoscan::signature::GeneratorConfig;

/// Root configuration structure for xenoscan.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Signature generation settings.
    #[serde(default)]
    pub generation: GenerationSection,

    /// Ion expansion and scan search settings.
    #[serde(default)]
    pub search: SearchSection,

    /// Evidence scoring settings.
    #[serde(default)]
    pub scoring: ScoringSection,
}

/// Configuration for the build command.
#[derive(Debug, Default, Deserialize)]
pub struct GenerationSection {
    /// Maximum number of reactions per signature.
    pub reaction_depth: Option<usize>,

    /// Ceiling on the number of reaction combinations.
    pub max_reaction_combinations: Option<u64>,
}

/// Configuration for the search and isotopes commands.
#[derive(Debug, Default, Deserialize)]
pub struct SearchSection {
    /// Mass tolerance in ppm.
    pub mz_tolerance_ppm: Option<f64>,

    /// Minimum natural abundance probability of an isotopologue.
    pub nap_cutoff: Option<f64>,

    /// Adduct names.
    pub adducts: Option<Vec<String>>,
}

/// Configuration for the score command.
#[derive(Debug, Default, Deserialize)]
pub struct ScoringSection {
    /// Rung-0 signal-to-noise cutoff.
    pub snr_cutoff: Option<f64>,

    /// Hit intensity cutoff.
    pub scan_cutoff: Option<f64>,

    /// Missing scans tolerated inside a run.
    pub max_gap: Option<usize>,

    /// Minimum run length.
    pub min_group_size: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load the file when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

impl GenerationSection {
    /// Flags override file values, which override defaults.
    pub fn resolve(&self, reaction_depth: Option<usize>, max_combinations: Option<u64>) -> GeneratorConfig {
        let defaults = GeneratorConfig::default();
        GeneratorConfig {
            reaction_depth: reaction_depth
                .or(self.reaction_depth)
                .unwrap_or(defaults.reaction_depth),
            max_reaction_combinations: max_combinations
                .or(self.max_reaction_combinations)
                .unwrap_or(defaults.max_reaction_combinations),
        }
    }
}

impl SearchSection {
    /// Ion settings; an empty adduct list on the command line defers to the file.
    pub fn resolve_ions(&self, nap_cutoff: Option<f64>, adducts: Vec<String>) -> IonConfig {
        let defaults = IonConfig::default();
        IonConfig {
            adducts: if adducts.is_empty() {
                self.adducts.clone().unwrap_or(defaults.adducts)
            } else {
                adducts
            },
            nap_cutoff: nap_cutoff.or(self.nap_cutoff).unwrap_or(defaults.nap_cutoff),
        }
    }

    /// Search settings.
    pub fn resolve_search(&self, mz_tolerance_ppm: Option<f64>) -> SearchConfig {
        SearchConfig {
            mz_tolerance_ppm: mz_tolerance_ppm
                .or(self.mz_tolerance_ppm)
                .unwrap_or(SearchConfig::default().mz_tolerance_ppm),
        }
    }
}

impl ScoringSection {
    /// Flags override file values, which override defaults.
    pub fn resolve(
        &self,
        snr_cutoff: Option<f64>,
        scan_cutoff: Option<f64>,
        max_gap: Option<usize>,
        min_group_size: Option<usize>,
    ) -> ScoringConfig {
        let defaults = ScoringConfig::default();
        ScoringConfig {
            snr_cutoff: snr_cutoff.or(self.snr_cutoff).unwrap_or(defaults.snr_cutoff),
            scan_cutoff: scan_cutoff.or(self.scan_cutoff).unwrap_or(defaults.scan_cutoff),
            max_gap: max_gap.or(self.max_gap).unwrap_or(defaults.max_gap),
            min_group_size: min_group_size
                .or(self.min_group_size)
                .unwrap_or(defaults.min_group_size),
        }
    }
}
