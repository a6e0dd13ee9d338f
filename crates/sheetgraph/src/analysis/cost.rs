//! Recalculation cost heuristic.

use crate::config::CostThresholds;
use crate::domain::{CellAddress, RecalculationCost};
use crate::formula::ReferenceParser;
use std::collections::HashMap;

/// Upper bound of [`RecalculationCost::complexity_score`].
pub const MAX_COMPLEXITY_SCORE: usize = 100;

/// Estimate the cost of recalculating `affected`.
///
/// Each affected cell with a known formula contributes
/// `functions * 2 + references`. The total is averaged over all affected
/// cells (formula or not), scaled by 10, rounded and capped at 100.
pub(super) fn estimate(
    affected: &[CellAddress],
    formulas: &HashMap<CellAddress, String>,
    parser: &dyn ReferenceParser,
    thresholds: &CostThresholds,
) -> RecalculationCost {
    let cell_count = affected.len();

    let total: usize = affected
        .iter()
        .filter_map(|cell| formulas.get(cell))
        .map(|formula| parser.parse(formula).complexity())
        .sum();

    RecalculationCost {
        cell_count,
        complexity_score: complexity_score(total, cell_count),
        time_estimate: thresholds.bucket(cell_count),
    }
}

fn complexity_score(total: usize, cell_count: usize) -> u8 {
    if cell_count == 0 {
        return 0;
    }
    // round(total / count * 10) in integer arithmetic
    let scaled = (total * 10 + cell_count / 2) / cell_count;
    u8::try_from(scaled.min(MAX_COMPLEXITY_SCORE)).unwrap_or(u8::MAX)
}
