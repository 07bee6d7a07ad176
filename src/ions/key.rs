//! Structured signature keys.
//!
//! The text form is `<parent>$<adduct>[,(<delta>)];<order>`, for example
//! `C19H28O2_288.208930$M+H[1+],(C13);1`. The parent is everything before the
//! first `$` and the order is everything after the last `;`. An isotope delta
//! is only recognised as a trailing `,(...)` group, so adduct names may
//! themselves contain commas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::KeyError;

/// Identity of one ion rung: parent, adduct, isotope delta and order index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignatureKey {
    /// Parent identifier (signature id or interim formula id)
    pub parent: String,
    /// Adduct name, e.g. `M+H[1+]`
    pub adduct: String,
    /// Isotope delta without parentheses, e.g. `C13,Cl37`
    pub isotope: Option<String>,
    /// Isotopologue order index; 0 is monoisotopic
    pub order: usize,
}

impl SignatureKey {
    /// Create a key.
    pub fn new(
        parent: impl Into<String>,
        adduct: impl Into<String>,
        isotope: Option<String>,
        order: usize,
    ) -> Self {
        Self {
            parent: parent.into(),
            adduct: adduct.into(),
            isotope,
            order,
        }
    }

    /// Parse the textual form, rejecting anything outside the grammar.
    pub fn parse(text: &str) -> Result<Self, KeyError> {
        let (parent, rest) = text
            .split_once('$')
            .ok_or_else(|| KeyError::MissingSeparator(text.to_string()))?;
        if parent.is_empty() {
            return Err(KeyError::EmptyParent(text.to_string()));
        }
        let (relation, order) = rest
            .rsplit_once(';')
            .ok_or_else(|| KeyError::MissingOrder(text.to_string()))?;
        if order.is_empty() || !order.bytes().all(|b| b.is_ascii_digit()) {
            return Err(KeyError::InvalidOrder {
                key: text.to_string(),
                order: order.to_string(),
            });
        }
        let order = order.parse::<usize>().map_err(|_| KeyError::InvalidOrder {
            key: text.to_string(),
            order: order.to_string(),
        })?;

        let (adduct, isotope) = match relation.strip_suffix(')').and_then(|r| r.rsplit_once(",(")) {
            Some((adduct, delta)) => {
                if delta.is_empty() {
                    return Err(KeyError::EmptyIsotope(text.to_string()));
                }
                (adduct, Some(delta.to_string()))
            }
            None => (relation, None),
        };
        if adduct.is_empty() || adduct.contains(';') || adduct.contains('$') {
            return Err(KeyError::InvalidAdduct(text.to_string()));
        }

        Ok(Self {
            parent: parent.to_string(),
            adduct: adduct.to_string(),
            isotope,
            order,
        })
    }

    /// The ion relation part: everything after the `$`.
    pub fn ion_relation(&self) -> String {
        match &self.isotope {
            Some(delta) => format!("{},({});{}", self.adduct, delta, self.order),
            None => format!("{};{}", self.adduct, self.order),
        }
    }

    /// The monoisotopic rung of this key's ladder.
    pub fn rung_zero(&self) -> Self {
        Self {
            parent: self.parent.clone(),
            adduct: self.adduct.clone(),
            isotope: None,
            order: 0,
        }
    }

    /// True when two keys belong to the same ladder.
    pub fn same_ladder(&self, other: &Self) -> bool {
        self.parent == other.parent && self.adduct == other.adduct
    }
}

impl fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}${}", self.parent, self.ion_relation())
    }
}

impl FromStr for SignatureKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SignatureKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SignatureKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
