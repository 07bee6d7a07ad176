use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use xenoscan::signature::{
    load_compounds, load_reactions, CatalogMetadata, GeneratorConfig, SignatureCatalog, SignatureGenerator,
};

/// Generate a signature catalog from compounds and reactions
pub fn run(compounds: PathBuf, reactions: PathBuf, output: PathBuf, config: GeneratorConfig) -> Result<()> {
    for input in [&compounds, &reactions] {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }
    }

    info!("xenoscan - signature generation");
    info!("Compounds: {}", compounds.display());
    info!("Reactions: {}", reactions.display());
    info!("Reaction depth: {}", config.reaction_depth);

    let compounds = load_compounds(&compounds).context("Failed to load compounds")?;
    let reactions = load_reactions(&reactions).context("Failed to load reactions")?;
    let (compound_count, reaction_count) = (compounds.len(), reactions.len());

    let mut generator = SignatureGenerator::from_compounds_reactions(compounds, reactions);
    generator.generate(&config).context("Signature generation failed")?;
    let signatures = generator.into_signatures();

    let metadata = CatalogMetadata::new(config.reaction_depth, compound_count, reaction_count, signatures.len());
    let catalog = SignatureCatalog::new(signatures, &metadata)?;
    catalog
        .save(&output)
        .with_context(|| format!("Failed to write catalog: {}", output.display()))?;

    info!(
        "Wrote {} signatures from {} compounds and {} reactions to {}",
        catalog.data.len(),
        compound_count,
        reaction_count,
        output.display()
    );
    Ok(())
}
