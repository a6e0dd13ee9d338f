//! Regex-based A1 reference scanner.

use super::{ParsedFormula, ReferenceParser};
use crate::domain::parse_a1;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Optional sheet prefix (quoted or bare), then a cell, then an optional range end.
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(?:'(?:[^']|'')+'|[\p{L}_][\p{L}\p{N}_.]*)!)?\$?[A-Za-z]{1,3}\$?[0-9]+(?::\$?[A-Za-z]{1,3}\$?[0-9]+)?",
    )
    .expect("reference pattern is valid")
});

static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z_][A-Za-z0-9_.]*)\s*\(").expect("function pattern is valid")
});

/// Default [`ReferenceParser`] for A1-style formulas.
///
/// Handles `B1`, `$B$1`, `b1`, `Sheet2!C3`, `Лист1!C3`, `'My Sheet'!C3:C10`. Text inside
/// string literals is ignored, as are names that only look like references
/// (`LOG10(`, `ABCD1`, `A1B`). Whole-column and whole-row ranges (`A:A`,
/// `1:1`) and defined names are not recognized.
#[derive(Debug, Clone, Copy, Default)]
pub struct A1ReferenceParser;

impl A1ReferenceParser {
    /// Create a parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ReferenceParser for A1ReferenceParser {
    fn parse(&self, formula: &str) -> ParsedFormula {
        let text = blank_string_literals(formula);

        let mut seen = HashSet::new();
        let mut references = Vec::new();
        let mut unresolved = Vec::new();
        for m in REFERENCE.find_iter(&text) {
            if !is_valid_reference(m.as_str()) {
                continue;
            }
            if !stands_alone(&text, m.start(), m.end()) {
                if text[..m.start()].ends_with('!') && !ends_identifier(&text, m.end()) {
                    unresolved.push(qualified_token(&text, m.start(), m.end()).to_string());
                }
                continue;
            }
            if seen.insert(m.as_str()) {
                references.push(m.as_str().to_string());
            }
        }

        let functions = FUNCTION
            .captures_iter(&text)
            .filter_map(|caps| caps.get(1))
            .filter(|name| !preceded_by_identifier(&text, name.start()))
            .map(|name| name.as_str().to_ascii_uppercase())
            .collect();

        ParsedFormula {
            references,
            functions,
            unresolved,
        }
    }
}

/// Replace the contents of `"..."` literals (with `""` escapes) by spaces.
fn blank_string_literals(formula: &str) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut in_string = false;
    let mut chars = formula.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_string && chars.peek() == Some(&'"') {
                chars.next();
                out.push_str("  ");
                continue;
            }
            in_string = !in_string;
            out.push(c);
        } else if in_string {
            out.push(' ');
        } else {
            out.push(c);
        }
    }

    out
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn preceded_by_identifier(text: &str, start: usize) -> bool {
    text[..start]
        .chars()
        .next_back()
        .is_some_and(|c| is_identifier_char(c) || c == '$' || c == '!' || c == '\'')
}

/// A match counts only when it is not part of a longer name or a call.
fn stands_alone(text: &str, start: usize, end: usize) -> bool {
    !preceded_by_identifier(text, start) && !ends_identifier(text, end)
}

fn ends_identifier(text: &str, end: usize) -> bool {
    text[end..]
        .chars()
        .next()
        .is_some_and(|c| is_identifier_char(c) || c == '(' || c == '!' || c == '$' || c == ':')
}

/// Widen a `!`-preceded match back to the start of its sheet prefix.
fn qualified_token(text: &str, start: usize, end: usize) -> &str {
    let prefix = text[..start].trim_end_matches('!');
    let from = prefix
        .char_indices()
        .rev()
        .find(|&(_, c)| c.is_whitespace() || "=+-*/^&,;()<>".contains(c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    &text[from..end]
}

/// Both ends of the match must fall inside the sheet grid.
fn is_valid_reference(token: &str) -> bool {
    let a1 = token.rsplit_once('!').map_or(token, |(_, a1)| a1);
    a1.split(':')
        .all(|part| parse_a1(&part.replace('$', "")).is_some())
}
