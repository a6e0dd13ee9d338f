//! Cell addresses and A1 notation helpers.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Largest column number in A1 notation (`XFD`).
pub const MAX_COLUMN: u32 = 16_384;

/// Largest row number in A1 notation.
pub const MAX_ROW: u32 = 1_048_576;

/// Canonical, sheet-qualified cell address such as `Sheet1!B7`.
///
/// Two addresses are equal iff their strings are equal, so every address
/// must be normalized (see [`crate::formula::ReferenceNormalizer`]) before it
/// reaches the graph. Range references (`Sheet1!A1:A10`) are also valid
/// addresses; the graph treats them as opaque nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellAddress(String);

impl CellAddress {
    /// Wrap an already-canonical address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Build the address of a zero-based `(row, column)` position on `sheet`.
    #[must_use]
    pub fn from_position(sheet: &str, row: usize, column: usize) -> Self {
        Self(format!("{sheet}!{}{}", column_name(column), row + 1))
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The sheet part, if the address is sheet-qualified.
    #[must_use]
    pub fn sheet(&self) -> Option<&str> {
        sheet_of(&self.0)
    }

    /// The A1 part (everything after the sheet separator).
    #[must_use]
    pub fn reference(&self) -> &str {
        self.0.rsplit_once('!').map_or(&self.0, |(_, a1)| a1)
    }

    /// Whether this address names a range rather than a single cell.
    #[must_use]
    pub fn is_range(&self) -> bool {
        self.reference().contains(':')
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CellAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CellAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for CellAddress {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CellAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Return the sheet name of a qualified address (`"Sheet1!A1"` -> `"Sheet1"`).
///
/// The A1 part never contains `!`, so the last separator wins; this keeps
/// sheet names that themselves contain `!` intact.
#[must_use]
pub fn sheet_of(address: &str) -> Option<&str> {
    address.rsplit_once('!').map(|(sheet, _)| sheet)
}

/// Convert a zero-based column index into letters (`0` -> `A`, `27` -> `AB`).
#[must_use]
pub fn column_name(column: usize) -> String {
    let mut n = column + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        // rem < 26, so the cast cannot truncate
        #[allow(clippy::cast_possible_truncation)]
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Parse a bare A1 cell reference (no sheet, no `$`) into one-based
/// `(column, row)`. Returns `None` for anything outside the grid.
#[must_use]
pub fn parse_a1(reference: &str) -> Option<(u32, u32)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || letters.len() > 3 || !letters.chars().all(|c| c.is_ascii_alphabetic())
    {
        return None;
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let column = letters.chars().fold(0u32, |acc, c| {
        acc * 26 + (u32::from(c.to_ascii_uppercase()) - u32::from('A') + 1)
    });
    let row: u32 = digits.parse().ok()?;

    if column == 0 || column > MAX_COLUMN || row == 0 || row > MAX_ROW {
        return None;
    }
    Some((column, row))
}
