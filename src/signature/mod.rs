//! # Signature generation
//!
//! Expands compounds by every combination of up to `reaction_depth` reactions
//! into candidate product signatures.
//!
//! Reaction combinations are ordered tuples drawn with repetition, so with
//! `r` reactions and depth `d` there are exactly `Σ_{i=0}^{d} r^i`
//! combinations including the single identity at depth 0. Products whose
//! formula has any count `<= 0` are discarded.
//!
//! ```
//! use xenoscan::formula::Formula;
//! use xenoscan::signature::{Compound, GeneratorConfig, Reaction, SignatureGenerator};
//!
//! let compounds = vec![Compound::new("C19H28O3").unwrap()];
//! let reactions = vec![Reaction::new("hydroxylation", Formula::from_pairs([("O", 1)]))];
//!
//! let mut generator = SignatureGenerator::from_compounds_reactions(compounds, reactions);
//! let config = GeneratorConfig { reaction_depth: 1, ..Default::default() };
//! let signatures = generator.generate(&config).unwrap();
//!
//! assert_eq!(signatures.len(), 2);
//! assert_eq!(signatures[1].neutral_formula, "C19H28O4");
//! assert_eq!(signatures[1].reactions, "hydroxylation");
//! ```

use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::formula::{sum_formulas, Formula};
use crate::isotopes::monoisotopic_mass;

pub use catalog::{load_compounds, load_reactions, CatalogMetadata, SignatureCatalog};
pub use error::SignatureError;

pub mod catalog;
mod error;

#[cfg(test)]
mod tests;

/// Default maximum number of reaction applications.
pub const DEFAULT_REACTION_DEPTH: usize = 3;

/// Default ceiling on the number of reaction combinations.
pub const DEFAULT_MAX_REACTION_COMBINATIONS: u64 = 1_000_000;

/// A parent compound.
///
/// Every field of the source record other than the generated `uuid` is kept
/// in `fields` so catalog round-trips do not lose annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    /// Identifier assigned at ingestion
    pub uuid: Uuid,
    /// Parsed neutral formula
    pub formula: Formula,
    /// Source record fields, including `neutral_formula`
    pub fields: Map<String, Value>,
}

impl Compound {
    /// Create a compound from a neutral formula string.
    pub fn new(neutral_formula: &str) -> Result<Self, SignatureError> {
        let mut fields = Map::new();
        fields.insert("neutral_formula".into(), Value::String(neutral_formula.into()));
        Self::from_fields(fields)
    }

    /// Build a compound from an arbitrary JSON record.
    ///
    /// The record must be an object with a non-empty `neutral_formula` string.
    pub fn from_record(record: Value) -> Result<Self, SignatureError> {
        match record {
            Value::Object(fields) => Self::from_fields(fields),
            other => Err(SignatureError::MalformedRecord(other.to_string())),
        }
    }

    fn from_fields(fields: Map<String, Value>) -> Result<Self, SignatureError> {
        let text = match fields.get("neutral_formula") {
            Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
            _ => return Err(SignatureError::MissingFormula(Value::Object(fields).to_string())),
        };
        let formula = Formula::parse(&text)?;
        Ok(Self {
            uuid: Uuid::new_v4(),
            formula,
            fields,
        })
    }

    /// The compound name, when the record carries one.
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// The source identifier (`id` or `primary_id`), when present.
    pub fn id(&self) -> Option<String> {
        ["id", "primary_id"]
            .iter()
            .find_map(|key| self.fields.get(*key))
            .map(|value| match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
    }

    /// The neutral formula text as given in the source record.
    pub fn neutral_formula(&self) -> &str {
        self.fields
            .get("neutral_formula")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// A named formula delta. Counts may be negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Reaction name
    #[serde(rename = "reaction_name")]
    pub name: String,
    /// Formula delta applied to the substrate
    #[serde(rename = "formula_dict")]
    pub delta: Formula,
}

impl Reaction {
    /// Create a reaction.
    pub fn new(name: impl Into<String>, delta: Formula) -> Self {
        Self {
            name: name.into(),
            delta,
        }
    }
}

/// An ordered tuple of reactions with its summed delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionCombination {
    /// `+`-joined reaction names; empty for the identity
    pub name: String,
    /// Summed formula delta
    pub delta: Formula,
    /// Number of reactions applied
    pub depth: usize,
}

impl ReactionCombination {
    /// The identity combination (no reaction applied).
    pub fn identity() -> Self {
        Self {
            name: String::new(),
            delta: Formula::new(),
            depth: 0,
        }
    }

    fn from_reactions(reactions: &[&Reaction]) -> Self {
        Self {
            name: reactions.iter().map(|r| r.name.as_str()).join("+"),
            delta: sum_formulas(reactions.iter().map(|r| &r.delta)),
            depth: reactions.len(),
        }
    }
}

/// A candidate product to search for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// Unique signature identifier
    pub uuid: Uuid,
    /// Identifier of the compound the signature was generated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Uuid>,
    /// Neutral formula in Hill notation
    pub neutral_formula: String,
    /// Monoisotopic neutral mass in Da
    pub neutral_formula_mass: f64,
    /// Reaction combination label; empty for the unmodified compound
    #[serde(default)]
    pub reactions: String,
    /// Cumulative evidence score, attached after scoring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Any additional fields carried by the record
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Signature {
    /// Parse the neutral formula.
    pub fn formula(&self) -> Result<Formula, SignatureError> {
        Ok(Formula::parse(&self.neutral_formula)?)
    }
}

/// Settings for de-novo signature generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Maximum number of reactions applied to a compound
    pub reaction_depth: usize,
    /// Ceiling on `Σ r^d`; generation fails when it would be exceeded
    pub max_reaction_combinations: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            reaction_depth: DEFAULT_REACTION_DEPTH,
            max_reaction_combinations: DEFAULT_MAX_REACTION_COMBINATIONS,
        }
    }
}

impl GeneratorConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), SignatureError> {
        if self.max_reaction_combinations == 0 {
            return Err(SignatureError::InvalidConfig(
                "max_reaction_combinations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Exact number of reaction combinations up to `depth`, or `None` on overflow.
pub fn combination_count(reactions: usize, depth: usize) -> Option<u64> {
    let r = u64::try_from(reactions).ok()?;
    let mut total = 0u64;
    let mut term = 1u64;
    for i in 0..=depth {
        if i > 0 {
            term = term.checked_mul(r)?;
        }
        total = total.checked_add(term)?;
    }
    Some(total)
}

/// Produces signatures from compounds and reactions, or wraps an existing set.
#[derive(Debug, Clone, Default)]
pub struct SignatureGenerator {
    compounds: Vec<Compound>,
    reactions: Vec<Reaction>,
    signatures: Vec<Signature>,
}

impl SignatureGenerator {
    /// Create a generator for de-novo generation.
    pub fn from_compounds_reactions(compounds: Vec<Compound>, reactions: Vec<Reaction>) -> Self {
        info!(
            "Creating signature generator from {} compounds and {} reactions",
            compounds.len(),
            reactions.len()
        );
        Self {
            compounds,
            reactions,
            signatures: Vec::new(),
        }
    }

    /// Wrap pre-built signatures; no generation takes place.
    pub fn from_signatures(signatures: Vec<Signature>) -> Self {
        info!("Loaded {} signatures", signatures.len());
        Self {
            signatures,
            ..Default::default()
        }
    }

    /// Ingest raw compound records, skipping any without a usable formula.
    pub fn ingest_compounds<I>(records: I) -> Vec<Compound>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut total = 0usize;
        let compounds: Vec<Compound> = records
            .into_iter()
            .filter_map(|record| {
                total += 1;
                match Compound::from_record(record) {
                    Ok(compound) => Some(compound),
                    Err(e) => {
                        warn!("Skipping compound: {}", e);
                        None
                    }
                }
            })
            .collect();
        info!("{} of {} compounds parsed correctly", compounds.len(), total);
        compounds
    }

    /// Loaded compounds.
    pub fn compounds(&self) -> &[Compound] {
        &self.compounds
    }

    /// Loaded reactions.
    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// Current signatures (generated or loaded).
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Consume the generator, returning its signatures.
    pub fn into_signatures(self) -> Vec<Signature> {
        self.signatures
    }

    /// Every ordered reaction tuple of length `0..=depth` with repetition.
    ///
    /// Fails before enumerating anything when the exact count exceeds
    /// `ceiling` or does not fit in a `u64`.
    pub fn reaction_combinations(
        &self,
        depth: usize,
        ceiling: u64,
    ) -> Result<Vec<ReactionCombination>, SignatureError> {
        let too_many = || SignatureError::TooManyCombinations {
            reactions: self.reactions.len(),
            depth,
            ceiling,
        };
        let count = combination_count(self.reactions.len(), depth).ok_or_else(too_many)?;
        if count > ceiling {
            return Err(too_many());
        }
        info!("Generating product of reactions to depth {}", depth);

        let mut combinations = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
        combinations.push(ReactionCombination::identity());
        if !self.reactions.is_empty() {
            for d in 1..=depth {
                combinations.extend(
                    (0..d)
                        .map(|_| self.reactions.iter())
                        .multi_cartesian_product()
                        .map(|combo| ReactionCombination::from_reactions(&combo)),
                );
            }
        }
        info!("Generated {} reaction permutations", combinations.len());
        Ok(combinations)
    }

    /// Apply every reaction combination to every compound and keep the
    /// strictly positive products.
    pub fn generate(&mut self, config: &GeneratorConfig) -> Result<&[Signature], SignatureError> {
        config.validate()?;
        if self.compounds.is_empty() && !self.signatures.is_empty() {
            return Err(SignatureError::NoCompounds);
        }
        info!("Generating signatures to depth {}", config.reaction_depth);
        let combinations =
            self.reaction_combinations(config.reaction_depth, config.max_reaction_combinations)?;

        let mut products = Vec::new();
        for compound in &self.compounds {
            if let Err(e) = monoisotopic_mass(&compound.formula) {
                warn!("Skipping compound {}: {}", compound.neutral_formula(), e);
                continue;
            }
            let mut kept = 0usize;
            for combination in &combinations {
                let product = sum_formulas([&compound.formula, &combination.delta]);
                if !product.is_strictly_positive() {
                    continue;
                }
                let mass = match monoisotopic_mass(&product) {
                    Ok(mass) => mass,
                    Err(e) => {
                        warn!(
                            "Skipping product {} + {}: {}",
                            compound.neutral_formula(),
                            combination.name,
                            e
                        );
                        continue;
                    }
                };
                products.push(Signature {
                    uuid: Uuid::new_v4(),
                    parent: Some(compound.uuid),
                    neutral_formula: product.to_hill(),
                    neutral_formula_mass: mass,
                    reactions: combination.name.clone(),
                    score: None,
                    extra: Map::new(),
                });
                kept += 1;
            }
            debug!("{} produced {} signatures", compound.neutral_formula(), kept);
        }
        info!("Generation produced {} signatures", products.len());
        self.signatures = products;
        Ok(&self.signatures)
    }
}
