use anyhow::{Context, Result};
use log::{info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use xenoscan::scoring::{scores_path, ScanScorer, ScoreReport, ScoringConfig};
use xenoscan::search::{HitBundle, BUNDLE_SUFFIX};

use super::collect_inputs;

/// Score hit bundles, consolidate per signature and write one report each
pub fn run(inputs: Vec<PathBuf>, output_dir: PathBuf, config: ScoringConfig, top: usize) -> Result<()> {
    let files = collect_inputs(&inputs, BUNDLE_SUFFIX)?;
    if files.is_empty() {
        anyhow::bail!("No {} files found", BUNDLE_SUFFIX);
    }
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    info!("xenoscan - evidence scoring");
    info!("Bundles: {}", files.len());
    info!(
        "SNR cutoff {}, scan cutoff {}, max gap {}, min group size {}",
        config.snr_cutoff, config.scan_cutoff, config.max_gap, config.min_group_size
    );

    let prototype = ScanScorer::new(config).context("Invalid scoring configuration")?;

    #[cfg(feature = "parallel")]
    let reports: Vec<Option<ScoreReport>> = files
        .par_iter()
        .map_init(|| prototype.clone(), |scorer, file| score_one(scorer, file, &output_dir))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let reports: Vec<Option<ScoreReport>> = {
        let mut scorer = prototype;
        files.iter().map(|file| score_one(&mut scorer, file, &output_dir)).collect()
    };

    let written = reports.iter().flatten().count();
    for report in reports.iter().flatten() {
        print!("{}", format_ranking(report, top));
    }
    info!("Wrote {} of {} reports to {}", written, files.len(), output_dir.display());
    if written < files.len() {
        anyhow::bail!("{} bundle(s) could not be scored", files.len() - written);
    }
    Ok(())
}

fn score_one(scorer: &mut ScanScorer, file: &Path, output_dir: &Path) -> Option<ScoreReport> {
    let result = HitBundle::load(file)
        .map_err(Into::into)
        .and_then(|bundle| scorer.score_bundle(&bundle))
        .and_then(ScoreReport::consolidate);
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            warn!("Failed to score {}: {}", file.display(), e);
            return None;
        }
    };
    let path = scores_path(file, output_dir);
    if let Err(e) = report.save(&path) {
        warn!("Failed to write {}: {}", path.display(), e);
        return None;
    }
    info!("{} -> {} ({} scored ladders)", file.display(), path.display(), report.scores.len());
    Some(report)
}

/// Top-ranked signatures of a consolidated report.
fn format_ranking(report: &ScoreReport, top: usize) -> String {
    let ranked: Vec<_> = report
        .signature_map
        .iter()
        .filter(|s| s.score.unwrap_or(0.0) > 0.0)
        .take(top)
        .collect();

    #[cfg(feature = "colorized_output")]
    {
        use console::style;

        let mut output = format!("{}\n", style(&report.sample).bold().cyan());
        if ranked.is_empty() {
            output.push_str(&format!("  {}\n", style("no evidence").yellow()));
        }
        for (rank, signature) in ranked.iter().enumerate() {
            output.push_str(&format!(
                "  {:>3}. {} {} {}\n",
                rank + 1,
                style(format!("{:>8.3}", signature.score.unwrap_or(0.0))).green().bold(),
                style(&signature.neutral_formula).bold(),
                signature.reactions
            ));
        }
        output
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        let mut output = format!("{}\n", report.sample);
        if ranked.is_empty() {
            output.push_str("  no evidence\n");
        }
        for (rank, signature) in ranked.iter().enumerate() {
            output.push_str(&format!(
                "  {:>3}. {:>8.3} {} {}\n",
                rank + 1,
                signature.score.unwrap_or(0.0),
                signature.neutral_formula,
                signature.reactions
            ));
        }
        output
    }
}
