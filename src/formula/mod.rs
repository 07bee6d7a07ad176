//! Formula algebra over element counts.
//!
//! A [`Formula`] maps element symbols to signed integer counts. Compound
//! formulas only ever hold positive counts, but reaction deltas may remove
//! atoms, so the algebra is closed over the integers and validity is checked
//! explicitly with [`Formula::is_strictly_positive`].
//!
//! ```
//! use xenoscan::formula::{sum_formulas, Formula};
//!
//! let parent = Formula::parse("C19H28O3").unwrap();
//! let hydroxylation = Formula::from_pairs([("O", 1)]);
//! let product = sum_formulas([&parent, &hydroxylation]);
//! assert_eq!(product.to_hill(), "C19H28O4");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};

use nom::branch::alt;
use nom::character::complete::{char, digit1, satisfy};
use nom::combinator::{map, opt, recognize};
use nom::multi::{many0, many0_count};
use nom::sequence::{delimited, pair};
use nom::IResult;
use serde::{Deserialize, Serialize};

pub use error::FormulaError;

mod error;


/// Element symbol to count mapping.
///
/// Entries are kept even when their count drops to zero after a sum, so a
/// product that loses every atom of an element is still visibly invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Formula(BTreeMap<String, i64>);

impl Formula {
    /// Create an empty formula.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a formula from `(symbol, count)` pairs, summing repeated symbols.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut formula = Self::new();
        for (symbol, count) in pairs {
            let entry = formula.0.entry(symbol.into()).or_insert(0);
            *entry = entry.saturating_add(count);
        }
        formula
    }

    /// Parse a condensed formula string such as `C19H28O3` or `C6H5Cl`.
    ///
    /// Parenthesised groups with multipliers (`Ca(OH)2`) are supported.
    /// Element symbols are not checked against the isotope table here.
    /// Counts that overflow `i64`, alone or once multiplied by a group, are
    /// rejected as [`FormulaError::InvalidCount`].
    pub fn parse(text: &str) -> Result<Self, FormulaError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(FormulaError::Empty);
        }
        let (rest, terms) =
            many0(term)(trimmed).map_err(|_| FormulaError::UnbalancedParenthesis(trimmed.to_string()))?;
        if !rest.is_empty() {
            return Err(unconsumed(trimmed, rest));
        }
        let mut counts = BTreeMap::new();
        accumulate(&terms, 1, &mut counts, trimmed)?;
        Ok(Self(counts))
    }

    /// Count for an element, zero when absent.
    pub fn count(&self, element: &str) -> i64 {
        self.0.get(element).copied().unwrap_or(0)
    }

    /// Iterate `(symbol, count)` in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(symbol, count)| (symbol.as_str(), *count))
    }

    /// Number of distinct elements (including zero-count entries).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the formula has no element entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the formula is non-empty and every entry is `> 0`.
    pub fn is_strictly_positive(&self) -> bool {
        !self.0.is_empty() && self.0.values().all(|&count| count > 0)
    }

    /// Render in Hill order: C, then H, then the rest alphabetically. Without
    /// carbon every element is alphabetical. Counts of one are omitted and
    /// zero-count entries are dropped.
    pub fn to_hill(&self) -> String {
        let mut out = String::new();
        let has_carbon = self.count("C") != 0;
        let mut push = |symbol: &str, count: i64| {
            if count == 0 {
                return;
            }
            out.push_str(symbol);
            if count != 1 {
                out.push_str(&count.to_string());
            }
        };
        if has_carbon {
            push("C", self.count("C"));
            push("H", self.count("H"));
        }
        for (symbol, count) in self.iter() {
            if has_carbon && (symbol == "C" || symbol == "H") {
                continue;
            }
            push(symbol, count);
        }
        out
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hill())
    }
}

impl AddAssign<&Formula> for Formula {
    fn add_assign(&mut self, rhs: &Formula) {
        for (symbol, count) in &rhs.0 {
            // saturates; out-of-range counts are rejected downstream
            let entry = self.0.entry(symbol.clone()).or_insert(0);
            *entry = entry.saturating_add(*count);
        }
    }
}

impl Add<&Formula> for &Formula {
    type Output = Formula;

    fn add(self, rhs: &Formula) -> Formula {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl<'a> FromIterator<&'a Formula> for Formula {
    fn from_iter<T: IntoIterator<Item = &'a Formula>>(iter: T) -> Self {
        sum_formulas(iter)
    }
}

/// Sum a sequence of formulas, treating missing elements as zero.
pub fn sum_formulas<'a, I>(formulas: I) -> Formula
where
    I: IntoIterator<Item = &'a Formula>,
{
    let mut total = Formula::new();
    for formula in formulas {
        total += formula;
    }
    total
}

/// One parsed formula term, counts still as digit text.
enum Term<'s> {
    Atom(&'s str, Option<&'s str>),
    Group(Vec<Term<'s>>, Option<&'s str>),
}

/// Element = uppercase , { lowercase } ;
fn element_symbol(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_uppercase()),
        many0_count(satisfy(|c| c.is_ascii_lowercase())),
    ))(i)
}

/// Term = Element , [ Count ] | "(" , { Term } , ")" , [ Count ] ;
fn term(i: &str) -> IResult<&str, Term<'_>> {
    alt((
        map(pair(element_symbol, opt(digit1)), |(symbol, count)| Term::Atom(symbol, count)),
        map(
            pair(delimited(char('('), many0(term), char(')')), opt(digit1)),
            |(terms, count)| Term::Group(terms, count),
        ),
    ))(i)
}

/// Map unparsed trailing input to the most specific error.
fn unconsumed(source: &str, rest: &str) -> FormulaError {
    match rest.chars().next() {
        Some('(') => match many0(term)(&rest[1..]) {
            Ok((inner, _)) if !inner.is_empty() && !inner.starts_with(')') => unconsumed(source, inner),
            _ => FormulaError::UnbalancedParenthesis(source.to_string()),
        },
        Some(')') | None => FormulaError::UnbalancedParenthesis(source.to_string()),
        Some(character) => {
            let offset = source.len() - rest.len();
            FormulaError::UnexpectedCharacter {
                formula: source.to_string(),
                character,
                position: source[..offset].chars().count(),
            }
        }
    }
}

fn parse_count(source: &str, digits: Option<&str>) -> Result<i64, FormulaError> {
    match digits {
        None => Ok(1),
        Some(digits) => digits.parse::<i64>().map_err(|_| invalid_count(source, digits)),
    }
}

fn invalid_count(source: &str, count: &str) -> FormulaError {
    FormulaError::InvalidCount {
        formula: source.to_string(),
        count: count.to_string(),
    }
}

/// Fold terms into element counts; overflow is an invalid count.
fn accumulate(
    terms: &[Term<'_>],
    multiplier: i64,
    counts: &mut BTreeMap<String, i64>,
    source: &str,
) -> Result<(), FormulaError> {
    for item in terms {
        match item {
            Term::Atom(symbol, digits) => {
                let count = parse_count(source, *digits)?
                    .checked_mul(multiplier)
                    .ok_or_else(|| invalid_count(source, digits.unwrap_or("1")))?;
                let entry = counts.entry(symbol.to_string()).or_insert(0);
                *entry = entry
                    .checked_add(count)
                    .ok_or_else(|| invalid_count(source, digits.unwrap_or("1")))?;
            }
            Term::Group(inner, digits) => {
                let group = parse_count(source, *digits)?
                    .checked_mul(multiplier)
                    .ok_or_else(|| invalid_count(source, digits.unwrap_or("1")))?;
                accumulate(inner, group, counts, source)?;
            }
        }
    }
    Ok(())
}
