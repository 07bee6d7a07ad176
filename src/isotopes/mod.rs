//! # Isotopologue enumeration
//!
//! Enumerates the isotope variants of a molecular formula in order of
//! natural-abundance probability (NAP) using a best-first search over
//! isotope-count coordinates.
//!
//! For every element the formula's atoms are distributed over the element's
//! naturally occurring isotopes; the probability of a distribution is the
//! multinomial pmf given the natural abundances, and the probability of a
//! whole coordinate is the product over elements.
//!
//! The search starts at the modal coordinate and expands single-atom isotope
//! exchanges within one element. The multinomial is M-concave, so every
//! coordinate is reachable from the mode along a path of non-increasing
//! probability and a max-heap yields coordinates in exactly descending order.
//! The all-monoisotopic reference is pinned as order index 0 so every ion
//! ladder starts at its monoisotopic rung.
//!
//! ```
//! use xenoscan::formula::Formula;
//! use xenoscan::isotopes::IsotopologueEnumerator;
//!
//! let mut enumerator = IsotopologueEnumerator::new();
//! let formula = Formula::parse("C6H5Cl").unwrap();
//! let pattern: Vec<_> = enumerator.enumerate(&formula, 0.01).unwrap().collect();
//!
//! assert_eq!(pattern[0].delta, "");
//! assert_eq!(pattern[0].mass_delta, 0.0);
//! assert_eq!(pattern[1].delta, "(Cl37)");
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};
use std::fmt;

use log::debug;
use ordered_float::OrderedFloat;
use statrs::function::factorial::ln_factorial;

use crate::formula::{Formula, FormulaError};

pub use table::{element, ElementIsotopes, Isotope, ABUNDANCE_THRESHOLD};

pub mod table;


/// Monoisotopic mass of a formula, using each element's most abundant isotope.
pub fn monoisotopic_mass(formula: &Formula) -> Result<f64, FormulaError> {
    let mut mass = 0.0;
    for (symbol, count) in formula.iter() {
        let info = element(symbol).ok_or_else(|| FormulaError::UnknownElement(symbol.to_string()))?;
        mass += info.reference_mass() * count as f64;
    }
    Ok(mass)
}

/// Per-element isotope counts. Each element's vector is aligned with the
/// element's isotopes (most abundant first) and sums to its atom count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IsotopeCoordinate(BTreeMap<&'static str, Vec<u32>>);

impl IsotopeCoordinate {
    /// The all-monoisotopic coordinate for a formula.
    ///
    /// Zero-count elements are dropped; negative counts, counts beyond
    /// `u32::MAX` and elements missing from the isotope table are errors.
    pub fn reference(formula: &Formula) -> Result<Self, FormulaError> {
        let mut coordinate = BTreeMap::new();
        for (symbol, count) in formula.iter() {
            if count < 0 {
                return Err(FormulaError::NegativeCount {
                    element: symbol.to_string(),
                    count,
                });
            }
            if count == 0 {
                continue;
            }
            let info = element(symbol).ok_or_else(|| FormulaError::UnknownElement(symbol.to_string()))?;
            let mut counts = vec![0u32; info.isotopes.len()];
            counts[0] = u32::try_from(count).map_err(|_| FormulaError::CountOutOfRange {
                element: symbol.to_string(),
                count,
            })?;
            coordinate.insert(info.symbol, counts);
        }
        Ok(Self(coordinate))
    }

    /// Isotope counts for one element.
    pub fn counts(&self, element: &str) -> Option<&[u32]> {
        self.0.get(element).map(Vec::as_slice)
    }

    /// Iterate `(symbol, counts)` in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[u32])> {
        self.0.iter().map(|(symbol, counts)| (*symbol, counts.as_slice()))
    }

    fn with_element(&self, symbol: &'static str, counts: Vec<u32>) -> Self {
        let mut next = self.clone();
        next.0.insert(symbol, counts);
        next
    }
}

/// Canonical text form, e.g. `C17,2|H28|O3`.
impl fmt::Display for IsotopeCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (symbol, counts)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(symbol)?;
            for (j, count) in counts.iter().enumerate() {
                if j > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", count)?;
            }
        }
        Ok(())
    }
}

/// One isotope variant of a formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Isotopologue {
    /// Position in the enumeration; 0 is the monoisotopic reference
    pub order: usize,
    /// Isotope counts per element
    pub coordinate: IsotopeCoordinate,
    /// Natural abundance probability
    pub probability: f64,
    /// Mass difference to the monoisotopic reference in Da
    pub mass_delta: f64,
    /// Substituted isotopes relative to the reference, e.g. `(C13,2Cl37)`;
    /// empty for the reference itself
    pub delta: String,
}

/// Memoized per-element quantities.
///
/// Owned by an [`IsotopologueEnumerator`]; nothing here is global, so separate
/// enumerators can run on separate threads without coordination.
#[derive(Debug, Default)]
pub struct IsotopeCache {
    log_probabilities: HashMap<&'static str, Vec<f64>>,
    masses: HashMap<&'static str, Vec<f64>>,
    pmf: HashMap<(&'static str, Vec<u32>), f64>,
    sub_masses: HashMap<(&'static str, Vec<u32>), f64>,
    neighbors: HashMap<Vec<u32>, Vec<Vec<u32>>>,
    delta_labels: HashMap<(&'static str, Vec<u32>, Vec<u32>), String>,
}

impl IsotopeCache {
    /// Number of memoized multinomial evaluations.
    pub fn pmf_entries(&self) -> usize {
        self.pmf.len()
    }

    /// Number of memoized neighbor lists.
    pub fn neighbor_entries(&self) -> usize {
        self.neighbors.len()
    }

    fn element_pmf(&mut self, symbol: &'static str, counts: &[u32]) -> f64 {
        let key = (symbol, counts.to_vec());
        if let Some(&p) = self.pmf.get(&key) {
            return p;
        }
        let log_probs = self
            .log_probabilities
            .entry(symbol)
            .or_insert_with(|| {
                element(symbol)
                    .map(|info| info.probability_vector().iter().map(|p| p.ln()).collect())
                    .unwrap_or_default()
            })
            .clone();
        let total: u32 = counts.iter().sum();
        let mut ln_p = ln_factorial(u64::from(total));
        for (&k, &ln_pi) in counts.iter().zip(log_probs.iter()) {
            if k == 0 {
                continue;
            }
            ln_p -= ln_factorial(u64::from(k));
            ln_p += f64::from(k) * ln_pi;
        }
        let p = if ln_p.is_nan() { 0.0 } else { ln_p.exp() };
        self.pmf.insert(key, p);
        p
    }

    fn element_mass(&mut self, symbol: &'static str, counts: &[u32]) -> f64 {
        let key = (symbol, counts.to_vec());
        if let Some(&m) = self.sub_masses.get(&key) {
            return m;
        }
        let masses = self
            .masses
            .entry(symbol)
            .or_insert_with(|| element(symbol).map(ElementIsotopes::mass_vector).unwrap_or_default());
        let m = counts
            .iter()
            .zip(masses.iter())
            .map(|(&k, &mass)| f64::from(k) * mass)
            .sum();
        self.sub_masses.insert(key, m);
        m
    }

    /// Single-atom exchanges: move one atom from slot `i` to slot `j`.
    fn element_neighbors(&mut self, counts: &[u32]) -> Vec<Vec<u32>> {
        self.neighbors
            .entry(counts.to_vec())
            .or_insert_with(|| {
                let mut out = Vec::new();
                if counts.len() < 2 {
                    return out;
                }
                for i in 0..counts.len() {
                    if counts[i] == 0 {
                        continue;
                    }
                    for j in 0..counts.len() {
                        if i == j {
                            continue;
                        }
                        let mut next = counts.to_vec();
                        next[i] -= 1;
                        next[j] += 1;
                        out.push(next);
                    }
                }
                out
            })
            .clone()
    }

    fn delta_label(&mut self, symbol: &'static str, counts: &[u32], reference: &[u32]) -> String {
        let key = (symbol, counts.to_vec(), reference.to_vec());
        if let Some(label) = self.delta_labels.get(&key) {
            return label.clone();
        }
        let labels = element(symbol).map(ElementIsotopes::labels).unwrap_or_default();
        let parts: Vec<String> = counts
            .iter()
            .zip(reference.iter())
            .zip(labels.iter())
            .filter_map(|((&k, &r), label)| {
                let delta = i64::from(k) - i64::from(r);
                match delta {
                    d if d > 1 => Some(format!("{}{}", d, label)),
                    1 => Some(label.clone()),
                    _ => None,
                }
            })
            .collect();
        let label = parts.join(",");
        self.delta_labels.insert(key, label.clone());
        label
    }

    fn probability(&mut self, coordinate: &IsotopeCoordinate) -> f64 {
        coordinate
            .0
            .iter()
            .map(|(symbol, counts)| self.element_pmf(symbol, counts))
            .product()
    }

    fn mass(&mut self, coordinate: &IsotopeCoordinate) -> f64 {
        coordinate
            .0
            .iter()
            .map(|(symbol, counts)| self.element_mass(symbol, counts))
            .sum()
    }

    fn neighbors(&mut self, coordinate: &IsotopeCoordinate) -> Vec<IsotopeCoordinate> {
        let mut out = Vec::new();
        for (symbol, counts) in &coordinate.0 {
            for next in self.element_neighbors(counts) {
                out.push(coordinate.with_element(symbol, next));
            }
        }
        out
    }

    fn delta_string(&mut self, coordinate: &IsotopeCoordinate, reference: &IsotopeCoordinate) -> String {
        let parts: Vec<String> = coordinate
            .0
            .iter()
            .filter_map(|(symbol, counts)| {
                let reference_counts = reference.0.get(symbol)?;
                let label = self.delta_label(symbol, counts, reference_counts);
                (!label.is_empty()).then_some(label)
            })
            .collect();
        if parts.is_empty() {
            String::new()
        } else {
            format!("({})", parts.join(","))
        }
    }

    /// Climb to the most probable coordinate, one element at a time.
    fn mode(&mut self, reference: &IsotopeCoordinate) -> IsotopeCoordinate {
        let mut mode = reference.clone();
        for (symbol, counts) in &reference.0 {
            let mut current = counts.clone();
            let mut current_p = self.element_pmf(symbol, &current);
            loop {
                let mut best: Option<(Vec<u32>, f64)> = None;
                for next in self.element_neighbors(&current) {
                    let p = self.element_pmf(symbol, &next);
                    if p > current_p && best.as_ref().map_or(true, |(_, bp)| p > *bp) {
                        best = Some((next, p));
                    }
                }
                match best {
                    Some((next, p)) => {
                        current = next;
                        current_p = p;
                    }
                    None => break,
                }
            }
            mode.0.insert(symbol, current);
        }
        mode
    }
}

/// Best-first isotopologue enumerator with an owned memo cache.
///
/// Reusing one enumerator across formulas shares the per-element cache; use
/// one enumerator per worker thread.
#[derive(Debug, Default)]
pub struct IsotopologueEnumerator {
    cache: IsotopeCache,
}

impl IsotopologueEnumerator {
    /// Create an enumerator with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the memo cache (for diagnostics).
    pub fn cache(&self) -> &IsotopeCache {
        &self.cache
    }

    /// Lazily enumerate the isotopologues of `formula` whose probability is
    /// strictly above `cutoff`. The monoisotopic reference is always yielded
    /// first, even when its own probability is below the cutoff.
    pub fn enumerate(&mut self, formula: &Formula, cutoff: f64) -> Result<Isotopologues<'_>, FormulaError> {
        let reference = IsotopeCoordinate::reference(formula)?;
        let cache = &mut self.cache;
        let reference_probability = cache.probability(&reference);
        let reference_mass = cache.mass(&reference);
        let mode = cache.mode(&reference);
        let mode_probability = cache.probability(&mode);

        let mut heap = BinaryHeap::new();
        let mut seen = HashSet::new();
        let mut sequence = 0u64;
        if mode_probability > cutoff {
            seen.insert(mode.clone());
            heap.push(Candidate {
                probability: OrderedFloat(mode_probability),
                sequence,
                coordinate: mode,
            });
            sequence += 1;
        }

        debug!(
            "enumerating isotopologues of {} (reference NAP {:.4e})",
            formula, reference_probability
        );

        let pinned = Isotopologue {
            order: 0,
            coordinate: reference.clone(),
            probability: reference_probability,
            mass_delta: 0.0,
            delta: String::new(),
        };

        Ok(Isotopologues {
            cache,
            reference,
            reference_mass,
            cutoff,
            heap,
            seen,
            sequence,
            pinned: Some(pinned),
            emitted: 0,
        })
    }
}

#[derive(Debug)]
struct Candidate {
    probability: OrderedFloat<f64>,
    sequence: u64,
    coordinate: IsotopeCoordinate,
}

// Higher probability first, then earlier insertion.
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.probability
            .cmp(&other.probability)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Lazy, finite, non-restartable isotopologue sequence.
#[derive(Debug)]
pub struct Isotopologues<'a> {
    cache: &'a mut IsotopeCache,
    reference: IsotopeCoordinate,
    reference_mass: f64,
    cutoff: f64,
    heap: BinaryHeap<Candidate>,
    seen: HashSet<IsotopeCoordinate>,
    sequence: u64,
    pinned: Option<Isotopologue>,
    emitted: usize,
}

impl Iterator for Isotopologues<'_> {
    type Item = Isotopologue;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pinned) = self.pinned.take() {
            self.emitted = 1;
            return Some(pinned);
        }
        while let Some(candidate) = self.heap.pop() {
            for next in self.cache.neighbors(&candidate.coordinate) {
                if self.seen.contains(&next) {
                    continue;
                }
                let p = self.cache.probability(&next);
                if p > self.cutoff {
                    self.seen.insert(next.clone());
                    self.heap.push(Candidate {
                        probability: OrderedFloat(p),
                        sequence: self.sequence,
                        coordinate: next,
                    });
                    self.sequence += 1;
                }
            }
            if candidate.coordinate == self.reference {
                continue;
            }
            let mass = self.cache.mass(&candidate.coordinate);
            let delta = self.cache.delta_string(&candidate.coordinate, &self.reference);
            let order = self.emitted;
            self.emitted += 1;
            return Some(Isotopologue {
                order,
                probability: candidate.probability.into_inner(),
                mass_delta: mass - self.reference_mass,
                delta,
                coordinate: candidate.coordinate,
            });
        }
        None
    }
}
