//! Formula text handling: reference extraction and address normalization.
//!
//! The analyzer talks to both collaborators through traits so a host with a
//! real formula parser can plug it in. The default implementations work on
//! A1-style references with a regex scanner.

mod normalize;
mod parser;

pub use normalize::{expand_range, A1Normalizer};
pub use parser::A1ReferenceParser;

use crate::domain::CellAddress;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Marker that starts every formula cell's text.
pub const FORMULA_PREFIX: char = '=';

/// Whether a raw cell value is formula text.
#[must_use]
pub fn is_formula(value: &str) -> bool {
    value.starts_with(FORMULA_PREFIX)
}

/// References and function calls found in one formula.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFormula {
    /// Raw reference tokens in order of first appearance, without duplicates.
    pub references: Vec<String>,

    /// Upper-cased function names, one entry per call.
    pub functions: Vec<String>,

    /// Sheet-qualified tokens whose sheet prefix could not be read.
    #[serde(default)]
    pub unresolved: Vec<String>,
}

impl ParsedFormula {
    /// Cost weight used by the recalculation heuristic.
    #[must_use]
    pub fn complexity(&self) -> usize {
        self.functions.len() * 2 + self.references.len()
    }
}

/// Extracts reference tokens and function names from formula text.
///
/// Implementations must not evaluate the formula.
pub trait ReferenceParser: Send + Sync {
    /// Parse `formula`. Unparseable input yields an empty result.
    fn parse(&self, formula: &str) -> ParsedFormula;
}

/// Turns raw reference tokens into canonical [`CellAddress`]es.
pub trait ReferenceNormalizer: Send + Sync {
    /// Normalize `reference`, qualifying it with `current_sheet` when it has
    /// no sheet of its own. Equivalent spellings (absolute markers, letter
    /// case of the A1 part) must produce the same address. Sheet names may
    /// keep their case; the analyzer folds them against known sheets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`](crate::error::Error::InvalidReference)
    /// when the token is not a cell or range reference.
    fn normalize(&self, reference: &str, current_sheet: &str) -> Result<CellAddress>;
}
