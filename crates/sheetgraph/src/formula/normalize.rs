//! Canonical address normalization and range expansion.

use super::ReferenceNormalizer;
use crate::domain::{column_name, parse_a1, CellAddress};
use crate::error::{Error, Result};

/// Default [`ReferenceNormalizer`].
///
/// Produces `Sheet!A1` or `Sheet!A1:B2`: absolute markers are dropped, the
/// A1 part is upper-cased, quoted sheet names are unquoted (`''` becomes
/// `'`), and sheet names otherwise keep their case.
#[derive(Debug, Clone, Copy, Default)]
pub struct A1Normalizer;

impl A1Normalizer {
    /// Create a normalizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ReferenceNormalizer for A1Normalizer {
    fn normalize(&self, reference: &str, current_sheet: &str) -> Result<CellAddress> {
        let reference = reference.trim();
        let (sheet, a1) = match reference.rsplit_once('!') {
            Some((sheet, a1)) => (unquote_sheet(sheet), a1),
            None => (current_sheet.to_string(), reference),
        };

        if sheet.is_empty() {
            return Err(Error::InvalidReference(reference.to_string()));
        }

        let mut parts = Vec::with_capacity(2);
        for part in a1.split(':') {
            let cell = part.replace('$', "").to_ascii_uppercase();
            if parse_a1(&cell).is_none() {
                return Err(Error::InvalidReference(reference.to_string()));
            }
            parts.push(cell);
        }
        if parts.len() > 2 {
            return Err(Error::InvalidReference(reference.to_string()));
        }

        Ok(CellAddress::new(format!("{sheet}!{}", parts.join(":"))))
    }
}

fn unquote_sheet(sheet: &str) -> String {
    match sheet
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
    {
        Some(inner) => inner.replace("''", "'"),
        None => sheet.to_string(),
    }
}

/// Expand a normalized range into its cells, row by row.
///
/// Returns `None` when `address` is a single cell, when `limit` is 0, or when
/// the range covers more than `limit` cells. Reversed corners (`B2:A1`) are
/// accepted.
#[must_use]
pub fn expand_range(address: &CellAddress, limit: usize) -> Option<Vec<CellAddress>> {
    if limit == 0 || !address.is_range() {
        return None;
    }

    let sheet = address.sheet()?;
    let (start, end) = address.reference().split_once(':')?;
    let (c1, r1) = parse_a1(start)?;
    let (c2, r2) = parse_a1(end)?;
    let (first_col, last_col) = (c1.min(c2), c1.max(c2));
    let (first_row, last_row) = (r1.min(r2), r1.max(r2));

    let width = (last_col - first_col + 1) as usize;
    let height = (last_row - first_row + 1) as usize;
    if width.saturating_mul(height) > limit {
        return None;
    }

    let mut cells = Vec::with_capacity(width * height);
    for row in first_row..=last_row {
        for col in first_col..=last_col {
            cells.push(CellAddress::new(format!(
                "{sheet}!{}{row}",
                column_name(col as usize - 1)
            )));
        }
    }
    Some(cells)
}
