use anyhow::{Context, Result};

use xenoscan::formula::Formula;
use xenoscan::ions::IonConfig;
use xenoscan::isotopes::{monoisotopic_mass, IsotopologueEnumerator};

/// Print the isotopologue pattern of a formula with the m/z per adduct
pub fn run(formula: &str, config: IonConfig) -> Result<()> {
    let adducts = config.resolve_adducts().context("Invalid ion configuration")?;
    let formula = Formula::parse(formula).with_context(|| format!("Invalid formula: {}", formula))?;
    let mass = monoisotopic_mass(&formula).context("Failed to compute monoisotopic mass")?;

    println!("Formula: {}", formula.to_hill());
    println!("Monoisotopic mass: {:.6}", mass);
    println!("NAP cutoff: {}", config.nap_cutoff);
    println!();

    let mut header = format!("{:>5}  {:<16} {:>10} {:>12}", "order", "delta", "NAP", "mass");
    for adduct in &adducts {
        header.push_str(&format!(" {:>12}", adduct.name));
    }
    println!("{}", header);

    let mut enumerator = IsotopologueEnumerator::new();
    for isotopologue in enumerator
        .enumerate(&formula, config.nap_cutoff)
        .context("Isotopologue enumeration failed")?
    {
        let isotope_mass = mass + isotopologue.mass_delta;
        let delta = if isotopologue.delta.is_empty() {
            "-"
        } else {
            isotopologue.delta.as_str()
        };
        let mut line = format!(
            "{:>5}  {:<16} {:>10.6} {:>12.6}",
            isotopologue.order, delta, isotopologue.probability, isotope_mass
        );
        for adduct in &adducts {
            line.push_str(&format!(" {:>12.6}", adduct.mz(isotope_mass)));
        }
        println!("{}", line);
    }
    Ok(())
}
