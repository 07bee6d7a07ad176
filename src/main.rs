//! # xenoscan
//!
//! Command-line front end for the exposome mining pipeline.
//!
//! ## Usage
//!
//! ```bash
//! # Expand compounds by reactions into a signature catalog
//! xenoscan build --compounds compounds.json --reactions reactions.json -o signatures.json
//!
//! # Search every mzML file of a directory
//! xenoscan search --catalog signatures.json runs/ -o bundles/
//!
//! # Score the bundles and rank signatures
//! xenoscan score bundles/ -o scores/
//!
//! # Inspect an isotope pattern
//! xenoscan isotopes C19H28O3
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity
    cli::init_logging(cli.verbosity());

    cli::dispatch(cli)
}
