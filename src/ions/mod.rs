//! # Ion signatures and mass search
//!
//! Each signature fans out into ions: one per adduct and isotopologue whose
//! natural abundance probability is above the NAP cutoff. Ions are keyed by a
//! [`SignatureKey`] and looked up by m/z through the [`MassSearch`] trait.
//!
//! [`IonIndex`] is the in-memory implementation. Signatures that share a
//! neutral formula share one interim id (`<hill>_<mass>`) so the same ion is
//! indexed once and routes back to every signature that produces it.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::formula::Formula;
use crate::isotopes::IsotopologueEnumerator;
use crate::signature::Signature;

pub use error::{IonError, KeyError};
pub use key::SignatureKey;

mod error;
pub mod key;


/// Default natural abundance probability cutoff for isotopologues.
pub const DEFAULT_NAP_CUTOFF: f64 = 0.01;

/// Default adducts used when none are configured.
pub const DEFAULT_ADDUCTS: [&str; 3] = ["M+H[1+]", "M+Na[1+]", "M-H[1-]"];

/// Mass of an electron in Da.
const ELECTRON_MASS: f64 = 0.000549;

/// Scan polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Polarity {
    /// Positive ion mode
    #[serde(rename = "pos")]
    Positive,
    /// Negative ion mode
    #[serde(rename = "neg")]
    Negative,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Positive => f.write_str("pos"),
            Polarity::Negative => f.write_str("neg"),
        }
    }
}

/// An ionization variant with a fixed mass shift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adduct {
    /// Name as it appears in signature keys
    pub name: &'static str,
    /// Mass added to the neutral mass before dividing by charge
    pub mass_shift: f64,
    /// Signed charge
    pub charge: i32,
}

/// Built-in primary adducts.
pub const PRIMARY_ADDUCTS: [Adduct; 6] = [
    Adduct {
        name: "M+H[1+]",
        mass_shift: 1.007276,
        charge: 1,
    },
    Adduct {
        name: "M+Na[1+]",
        mass_shift: 22.989218,
        charge: 1,
    },
    Adduct {
        name: "M[1+]",
        mass_shift: -ELECTRON_MASS,
        charge: 1,
    },
    Adduct {
        name: "M-H[1-]",
        mass_shift: -1.007276,
        charge: -1,
    },
    Adduct {
        name: "M+Cl[1-]",
        mass_shift: 34.969402,
        charge: -1,
    },
    Adduct {
        name: "M[1-]",
        mass_shift: ELECTRON_MASS,
        charge: -1,
    },
];

impl Adduct {
    /// Look up a built-in adduct by name.
    pub fn lookup(name: &str) -> Option<&'static Adduct> {
        PRIMARY_ADDUCTS.iter().find(|adduct| adduct.name == name)
    }

    /// Polarity of the ion.
    pub fn polarity(&self) -> Polarity {
        if self.charge < 0 {
            Polarity::Negative
        } else {
            Polarity::Positive
        }
    }

    /// m/z of the ion of a neutral species with the given mass.
    pub fn mz(&self, neutral_mass: f64) -> f64 {
        (neutral_mass + self.mass_shift) / f64::from(self.charge.unsigned_abs())
    }
}

/// Closed m/z interval within `ppm` parts-per-million of `mz`.
pub fn ppm_window(mz: f64, ppm: f64) -> RangeInclusive<f64> {
    let delta = mz * ppm / 1e6;
    (mz - delta)..=(mz + delta)
}

/// Settings for ion expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct IonConfig {
    /// Adduct names; each must be in [`PRIMARY_ADDUCTS`]
    pub adducts: Vec<String>,
    /// Isotopologues at or below this NAP are not indexed
    pub nap_cutoff: f64,
}

impl Default for IonConfig {
    fn default() -> Self {
        Self {
            adducts: DEFAULT_ADDUCTS.iter().map(|s| s.to_string()).collect(),
            nap_cutoff: DEFAULT_NAP_CUTOFF,
        }
    }
}

impl IonConfig {
    /// Validate the configuration and resolve the adduct names.
    pub fn resolve_adducts(&self) -> Result<Vec<&'static Adduct>, IonError> {
        if !(0.0..1.0).contains(&self.nap_cutoff) {
            return Err(IonError::InvalidConfig(format!(
                "nap_cutoff must be in [0, 1), got {}",
                self.nap_cutoff
            )));
        }
        if self.adducts.is_empty() {
            return Err(IonError::InvalidConfig("at least one adduct is required".into()));
        }
        self.adducts
            .iter()
            .map(|name| Adduct::lookup(name).ok_or_else(|| IonError::UnknownAdduct(name.clone())))
            .collect()
    }
}

/// Reference from an ion back to a signature that produces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompoundRef {
    /// Signature identifier
    pub uuid: String,
}

/// One candidate returned by a mass search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassMatch<'a> {
    /// Identifier of the neutral species
    pub interim_id: &'a str,
    /// Ion relation: `<adduct>[,(<delta>)];<order>`
    pub ion_relation: &'a str,
    /// Signatures that produce this ion
    pub compounds: &'a [CompoundRef],
}

impl MassMatch<'_> {
    /// Text form of the signature key of this match.
    pub fn key_text(&self) -> String {
        format!("{}${}", self.interim_id, self.ion_relation)
    }
}

/// Mass lookup by observed m/z.
pub trait MassSearch {
    /// Candidates within `tolerance_ppm` of `mz` for the given polarity.
    fn search(&self, mz: f64, polarity: Polarity, tolerance_ppm: f64) -> Vec<MassMatch<'_>>;
}

/// One indexed ion.
#[derive(Debug, Clone, PartialEq)]
pub struct IonSignature {
    /// Structured key
    pub key: SignatureKey,
    /// Ion relation text (cached for lookups)
    pub ion_relation: String,
    /// Theoretical m/z
    pub mz: f64,
    /// Natural abundance probability of the isotopologue
    pub probability: f64,
    /// Ion polarity
    pub polarity: Polarity,
    /// Signatures that produce this ion
    pub compounds: Arc<[CompoundRef]>,
}

/// In-memory m/z index over ion signatures, one sorted array per polarity.
#[derive(Debug, Clone, Default)]
pub struct IonIndex {
    positive: Vec<IonSignature>,
    negative: Vec<IonSignature>,
}

/// Interim identifier grouping signatures with the same neutral formula.
pub fn interim_id(formula: &str, mass: f64) -> String {
    format!("{}_{:.6}", formula, mass)
}

impl IonIndex {
    /// Expand signatures into ions and index them.
    ///
    /// Signatures whose formula cannot be parsed or whose elements are missing
    /// from the isotope table are skipped with a warning.
    pub fn build(signatures: &[Signature], config: &IonConfig) -> Result<Self, IonError> {
        let adducts = config.resolve_adducts()?;

        // one entry per neutral species
        let mut groups: BTreeMap<String, (Formula, f64, Vec<CompoundRef>)> = BTreeMap::new();
        for signature in signatures {
            let formula = match signature.formula() {
                Ok(formula) => formula,
                Err(e) => {
                    warn!("Skipping signature {}: {}", signature.uuid, e);
                    continue;
                }
            };
            let id = interim_id(&signature.neutral_formula, signature.neutral_formula_mass);
            groups
                .entry(id)
                .or_insert_with(|| (formula, signature.neutral_formula_mass, Vec::new()))
                .2
                .push(CompoundRef {
                    uuid: signature.uuid.to_string(),
                });
        }

        let mut enumerator = IsotopologueEnumerator::new();
        let mut index = Self::default();
        for (id, (formula, mass, compounds)) in groups {
            let isotopologues = match enumerator.enumerate(&formula, config.nap_cutoff) {
                Ok(iter) => iter,
                Err(e) => {
                    warn!("Skipping formula {}: {}", formula, e);
                    continue;
                }
            };
            let compounds: Arc<[CompoundRef]> = compounds.into();
            for isotopologue in isotopologues {
                let isotope = isotopologue
                    .delta
                    .strip_prefix('(')
                    .and_then(|d| d.strip_suffix(')'))
                    .map(str::to_string);
                for adduct in &adducts {
                    let key = SignatureKey::new(id.clone(), adduct.name, isotope.clone(), isotopologue.order);
                    let ion = IonSignature {
                        ion_relation: key.ion_relation(),
                        key,
                        mz: adduct.mz(mass + isotopologue.mass_delta),
                        probability: isotopologue.probability,
                        polarity: adduct.polarity(),
                        compounds: Arc::clone(&compounds),
                    };
                    match ion.polarity {
                        Polarity::Positive => index.positive.push(ion),
                        Polarity::Negative => index.negative.push(ion),
                    }
                }
            }
            debug!("Indexed ions for {}", id);
        }

        index.positive.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        index.negative.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        info!(
            "Indexed {} positive and {} negative ions",
            index.positive.len(),
            index.negative.len()
        );
        Ok(index)
    }

    /// Total number of indexed ions.
    pub fn len(&self) -> usize {
        self.positive.len() + self.negative.len()
    }

    /// True when no ions are indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indexed ions of one polarity, sorted by m/z.
    pub fn ions(&self, polarity: Polarity) -> &[IonSignature] {
        match polarity {
            Polarity::Positive => &self.positive,
            Polarity::Negative => &self.negative,
        }
    }
}

impl MassSearch for IonIndex {
    fn search(&self, mz: f64, polarity: Polarity, tolerance_ppm: f64) -> Vec<MassMatch<'_>> {
        let ions = self.ions(polarity);
        let window = ppm_window(mz, tolerance_ppm);
        let start = ions.partition_point(|ion| ion.mz < *window.start());
        ions[start..]
            .iter()
            .take_while(|ion| ion.mz <= *window.end())
            .map(|ion| MassMatch {
                interim_id: &ion.key.parent,
                ion_relation: &ion.ion_relation,
                compounds: &ion.compounds,
            })
            .collect()
    }
}
