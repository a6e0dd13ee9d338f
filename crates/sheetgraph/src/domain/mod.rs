//! Domain types for formula dependency analysis.
//!
//! Everything here is plain data: graph node views, detected cycles,
//! statistics and impact reports. None of it has behavior beyond small
//! helpers, and all of it serializes cleanly for callers that forward the
//! results elsewhere.

mod address;

pub use address::{column_name, parse_a1, sheet_of, CellAddress, MAX_COLUMN, MAX_ROW};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of one node in the dependency graph.
///
/// Edge direction follows the formula: `cell` depends on every entry in
/// `dependencies`, and every entry in `dependents` depends on `cell`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellNode {
    /// The node's address.
    pub cell: CellAddress,

    /// Cells this cell's formula reads from (outgoing edges).
    pub dependencies: Vec<CellAddress>,

    /// Cells whose formulas read from this cell (incoming edges).
    pub dependents: Vec<CellAddress>,

    /// Last known formula text, absent for pure value cells.
    pub formula: Option<String>,
}

/// Severity attached to a detected cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The cycle prevents a valid recalculation order.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A circular reference found by cycle detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircularDependency {
    /// Cells on the cycle, in traversal order. The last cell depends on the first.
    pub cells: Vec<CellAddress>,

    /// Human-readable chain, e.g. `A1 → B1 → A1`.
    pub chain: String,

    /// Always [`Severity::Error`].
    pub severity: Severity,
}

impl CircularDependency {
    /// Build a cycle record from the cells on the loop.
    #[must_use]
    pub fn new(cells: Vec<CellAddress>) -> Self {
        let mut chain = cells
            .iter()
            .map(CellAddress::as_str)
            .collect::<Vec<_>>()
            .join(" → ");
        if let Some(first) = cells.first() {
            chain.push_str(" → ");
            chain.push_str(first.as_str());
        }

        Self {
            cells,
            chain,
            severity: Severity::Error,
        }
    }

    /// Whether `cell` participates in this cycle.
    #[must_use]
    pub fn contains(&self, cell: &CellAddress) -> bool {
        self.cells.contains(cell)
    }
}

/// A cell together with an edge count, used for the ranking lists in [`GraphStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDegree {
    /// The ranked cell.
    pub cell: CellAddress,
    /// Number of dependencies or dependents, depending on the list.
    pub count: usize,
}

/// Descriptive statistics over the whole graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of nodes.
    pub total_cells: usize,

    /// Number of nodes carrying formula text.
    pub formula_cells: usize,

    /// Number of edges.
    pub total_dependencies: usize,

    /// Longest dependency chain anywhere in the graph.
    pub max_depth: usize,

    /// Cells with the most dependencies, descending.
    pub most_complex_cells: Vec<CellDegree>,

    /// Cells with the most dependents, descending.
    pub most_influential_cells: Vec<CellDegree>,
}

/// Coarse latency bucket for a recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeEstimate {
    /// Nothing or almost nothing to recompute.
    Instant,
    /// A handful of cells.
    Fast,
    /// Noticeable but routine.
    Moderate,
    /// Large recalculation.
    Slow,
    /// Workbook-scale recalculation.
    VerySlow,
}

impl fmt::Display for TimeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeEstimate::Instant => "instant",
            TimeEstimate::Fast => "fast",
            TimeEstimate::Moderate => "moderate",
            TimeEstimate::Slow => "slow",
            TimeEstimate::VerySlow => "very_slow",
        };
        f.write_str(s)
    }
}

/// Heuristic cost of recalculating a set of affected cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationCost {
    /// Number of affected cells.
    pub cell_count: usize,

    /// Average formula complexity scaled to `0..=100`.
    pub complexity_score: u8,

    /// Latency bucket derived from `cell_count`.
    pub time_estimate: TimeEstimate,
}

/// Result of an impact query: what happens if `target_cell` changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    /// The normalized cell that was queried.
    pub target_cell: CellAddress,

    /// The first entries of `all_affected_cells` in discovery order.
    ///
    /// This is a truncated BFS list, not necessarily the exact first layer;
    /// use [`crate::graph::DependencyGraph::direct_dependents`] for that.
    pub direct_dependents: Vec<CellAddress>,

    /// Every cell transitively depending on the target, BFS order.
    pub all_affected_cells: Vec<CellAddress>,

    /// Every cell the target transitively depends on, BFS order.
    pub dependencies: Vec<CellAddress>,

    /// Longest chain of dependents below the target.
    pub max_depth: usize,

    /// Estimated recalculation cost of the affected set.
    pub recalculation_cost: RecalculationCost,

    /// Cycles anywhere in the graph at query time, not only near the target.
    pub circular_dependencies: Vec<CircularDependency>,
}

impl ImpactAnalysis {
    /// Whether the graph contained any cycle when the analysis ran.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        !self.circular_dependencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_chain_closes_loop() {
        let cycle = CircularDependency::new(vec!["A1".into(), "B1".into(), "C1".into()]);
        assert_eq!(cycle.chain, "A1 → B1 → C1 → A1");
        assert_eq!(cycle.severity, Severity::Error);
        assert!(cycle.contains(&"B1".into()));
        assert!(!cycle.contains(&"D1".into()));
    }

    #[test]
    fn test_self_reference_chain() {
        let cycle = CircularDependency::new(vec!["Sheet1!A1".into()]);
        assert_eq!(cycle.chain, "Sheet1!A1 → Sheet1!A1");
    }

    #[test]
    fn test_time_estimate_serializes_snake_case() {
        let json = serde_json::to_string(&TimeEstimate::VerySlow).unwrap();
        assert_eq!(json, "\"very_slow\"");
        assert_eq!(TimeEstimate::VerySlow.to_string(), "very_slow");
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Error).unwrap();
        assert_eq!(json, "\"error\"");
    }
}
