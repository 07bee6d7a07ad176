use anyhow::{Context, Result};
use log::{info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use xenoscan::ions::{IonConfig, IonIndex};
use xenoscan::mzml::MZML_SUFFIX;
use xenoscan::search::{bundle_path, ScanHitAggregator, SearchConfig};
use xenoscan::signature::SignatureCatalog;

use super::collect_inputs;

/// Search mzML files for signature ions and write one hit bundle per file
pub fn run(
    catalog: PathBuf,
    inputs: Vec<PathBuf>,
    output_dir: PathBuf,
    ion_config: IonConfig,
    search_config: SearchConfig,
) -> Result<()> {
    if !catalog.exists() {
        anyhow::bail!("Catalog does not exist: {}", catalog.display());
    }
    let files = collect_inputs(&inputs, MZML_SUFFIX)?;
    if files.is_empty() {
        anyhow::bail!("No {} files found", MZML_SUFFIX);
    }
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    info!("xenoscan - scan search");
    info!("Catalog: {}", catalog.display());
    info!("Samples: {}", files.len());
    info!("Adducts: {}", ion_config.adducts.join(", "));
    info!("Tolerance: {} ppm, NAP cutoff {}", search_config.mz_tolerance_ppm, ion_config.nap_cutoff);

    let catalog = SignatureCatalog::load(&catalog).context("Failed to load signature catalog")?;
    let index = IonIndex::build(&catalog.data, &ion_config).context("Failed to build ion index")?;
    let aggregator =
        ScanHitAggregator::new(&index, &catalog.data, search_config).context("Invalid search configuration")?;

    let search_one = |file: &PathBuf| -> bool {
        let bundle = aggregator.aggregate_file(file);
        let path = bundle_path(file, &output_dir);
        match bundle.save(&path) {
            Ok(()) => {
                info!("{} -> {} ({} hits)", file.display(), path.display(), bundle.hit_count());
                true
            }
            Err(e) => {
                warn!("Failed to write {}: {}", path.display(), e);
                false
            }
        }
    };

    #[cfg(feature = "parallel")]
    let written = files.par_iter().filter(|f| search_one(*f)).count();
    #[cfg(not(feature = "parallel"))]
    let written = files.iter().filter(|f| search_one(*f)).count();

    report(written, files.len(), &output_dir)
}

fn report(written: usize, total: usize, output_dir: &Path) -> Result<()> {
    info!("Wrote {} of {} bundles to {}", written, total, output_dir.display());
    if written < total {
        anyhow::bail!("{} bundle(s) could not be written", total - written);
    }
    Ok(())
}
