use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod build;
mod config;
mod isotopes;
mod score;
#[cfg(feature = "mzml")]
mod search;

pub use config::Config;

/// xenoscan - Exposome mining for LC-MS data
#[derive(Parser)]
#[command(name = "xenoscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a signature catalog from compounds and reactions
    Build {
        /// Compounds JSON (list, or object with a "compounds" list)
        #[arg(long, value_name = "FILE")]
        compounds: PathBuf,

        /// Reactions JSON (list, or object with a "reactions" list)
        #[arg(long, value_name = "FILE")]
        reactions: PathBuf,

        /// Output catalog path
        #[arg(short, long, value_name = "FILE", default_value = "signatures.json")]
        output: PathBuf,

        /// Maximum number of reactions per signature (default: 3)
        #[arg(short = 'd', long)]
        reaction_depth: Option<usize>,

        /// Ceiling on the number of reaction combinations
        #[arg(long)]
        max_reaction_combinations: Option<u64>,
    },

    /// Search mzML files for signature ions
    #[cfg(feature = "mzml")]
    Search {
        /// Signature catalog JSON
        #[arg(long, value_name = "FILE")]
        catalog: PathBuf,

        /// mzML files or directories containing them
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the <stem>.scans.json bundles
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,

        /// Mass tolerance in ppm (default: 10)
        #[arg(short = 'p', long)]
        ppm: Option<f64>,

        /// Minimum isotopologue abundance probability (default: 0.01)
        #[arg(long)]
        nap_cutoff: Option<f64>,

        /// Adduct to search for; repeat for several
        #[arg(short, long = "adduct", value_name = "ADDUCT")]
        adducts: Vec<String>,
    },

    /// Score hit bundles and rank signatures
    Score {
        /// Hit bundle files or directories containing them
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the <stem>.scores.json reports
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,

        /// Rung-0 signal-to-noise cutoff (default: 2.5)
        #[arg(long)]
        snr_cutoff: Option<f64>,

        /// Ignore hits at or below this intensity (default: 0)
        #[arg(long)]
        scan_cutoff: Option<f64>,

        /// Missing scans tolerated inside a run (default: 2)
        #[arg(long)]
        max_gap: Option<usize>,

        /// Minimum run length (default: 2)
        #[arg(long)]
        min_group_size: Option<usize>,

        /// Number of top signatures to print per sample
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Print the isotopologue pattern of a formula
    Isotopes {
        /// Neutral formula, e.g. C19H28O3
        #[arg(value_name = "FORMULA")]
        formula: String,

        /// Minimum isotopologue abundance probability (default: 0.01)
        #[arg(long)]
        nap_cutoff: Option<f64>,

        /// Adduct to print m/z values for; repeat for several
        #[arg(short, long = "adduct", value_name = "ADDUCT")]
        adducts: Vec<String>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Build {
            compounds,
            reactions,
            output,
            reaction_depth,
            max_reaction_combinations,
        } => build::run(
            compounds,
            reactions,
            output,
            config.generation.resolve(reaction_depth, max_reaction_combinations),
        ),
        #[cfg(feature = "mzml")]
        Commands::Search {
            catalog,
            inputs,
            output_dir,
            ppm,
            nap_cutoff,
            adducts,
        } => search::run(
            catalog,
            inputs,
            output_dir,
            config.search.resolve_ions(nap_cutoff, adducts),
            config.search.resolve_search(ppm),
        ),
        Commands::Score {
            inputs,
            output_dir,
            snr_cutoff,
            scan_cutoff,
            max_gap,
            min_group_size,
            top,
        } => score::run(
            inputs,
            output_dir,
            config
                .scoring
                .resolve(snr_cutoff, scan_cutoff, max_gap, min_group_size),
            top,
        ),
        Commands::Isotopes {
            formula,
            nap_cutoff,
            adducts,
        } => isotopes::run(&formula, config.search.resolve_ions(nap_cutoff, adducts)),
    }
}

/// Expand inputs: a directory yields its files ending in `suffix` (sorted),
/// a file is used as is.
pub fn collect_inputs(inputs: &[PathBuf], suffix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in std::fs::read_dir(input)
                .with_context(|| format!("Failed to read directory: {}", input.display()))?
            {
                let path = entry?.path();
                if path.is_file() && has_suffix(&path, suffix) {
                    found.push(path);
                }
            }
            found.sort();
            files.extend(found);
        } else if input.exists() {
            files.push(input.clone());
        } else {
            anyhow::bail!("Input does not exist: {}", input.display());
        }
    }
    Ok(files)
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(suffix))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_collect_inputs_filters_directories_by_suffix() {
        let dir = tempdir().unwrap();
        for name in ["b.scans.json", "a.scans.json", "a.scores.json", "notes.txt"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        let explicit = dir.path().join("notes.txt");

        let files = collect_inputs(&[dir.path().to_path_buf(), explicit.clone()], ".scans.json").unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.scans.json"), dir.path().join("b.scans.json"), explicit]
        );
    }

    #[test]
    fn test_collect_inputs_missing_path() {
        let dir = tempdir().unwrap();
        assert!(collect_inputs(&[dir.path().join("absent.mzML")], ".mzML").is_err());
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::try_parse_from(["xenoscan", "score", "run.scans.json", "-vv", "--snr-cutoff", "3"]).unwrap();
        assert_eq!(cli.verbosity(), 2);
        assert!(matches!(cli.command, Commands::Score { snr_cutoff: Some(s), .. } if s == 3.0));
    }
}
