//! Impact analysis over a workbook's formula dependency graph.
//!
//! [`ImpactAnalyzer`] owns a [`DependencyGraph`] plus a side index of raw
//! formula text. It fills the graph from a [`CellDataSource`] (or one formula
//! at a time) and answers "what happens if this cell changes" queries.
//!
//! # Concurrency
//!
//! Bulk builds fetch sheets concurrently in batches of
//! [`SheetgraphConfig::batch_size`], but apply each batch to the graph
//! sequentially once every fetch in it has resolved. Only fetching overlaps;
//! graph mutation never does.

mod cost;

pub use cost::MAX_COMPLEXITY_SCORE;

use crate::config::SheetgraphConfig;
use crate::domain::{CellAddress, ImpactAnalysis};
use crate::error::{Error, Result};
use crate::formula::{
    expand_range, is_formula, A1Normalizer, A1ReferenceParser, ReferenceNormalizer,
    ReferenceParser,
};
use crate::graph::DependencyGraph;
use crate::source::{CellDataSource, ProgressSink};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counts from one bulk build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    /// Sheets fetched and applied.
    pub sheets: usize,

    /// Formula cells found.
    pub formula_cells: usize,

    /// Reference tokens that could not be read or normalized; they add no edge.
    pub invalid_references: usize,
}

/// Builds and queries the dependency graph of one workbook.
pub struct ImpactAnalyzer {
    graph: DependencyGraph,
    formulas: HashMap<CellAddress, String>,
    /// Lower-cased sheet name to the first spelling seen.
    sheets: HashMap<String, String>,
    parser: Arc<dyn ReferenceParser>,
    normalizer: Arc<dyn ReferenceNormalizer>,
    config: SheetgraphConfig,
}

impl fmt::Debug for ImpactAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImpactAnalyzer")
            .field("cells", &self.graph.len())
            .field("formulas", &self.formulas.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ImpactAnalyzer {
    fn default() -> Self {
        Self::new(SheetgraphConfig::default())
    }
}

impl ImpactAnalyzer {
    /// Create an analyzer using the A1 parser and normalizer.
    #[must_use]
    pub fn new(config: SheetgraphConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(A1ReferenceParser::new()),
            Arc::new(A1Normalizer::new()),
        )
    }

    /// Create an analyzer with a custom parser and normalizer.
    #[must_use]
    pub fn with_collaborators(
        config: SheetgraphConfig,
        parser: Arc<dyn ReferenceParser>,
        normalizer: Arc<dyn ReferenceNormalizer>,
    ) -> Self {
        Self {
            graph: DependencyGraph::new(),
            formulas: HashMap::new(),
            sheets: HashMap::new(),
            parser,
            normalizer,
            config,
        }
    }

    // ========== Building ==========

    /// Populate the graph from every formula in the workbook.
    ///
    /// When `sheet_names` is `None` the source is asked for the full list.
    /// Progress is reported after each batch. Existing graph contents are
    /// kept; call [`clear`](Self::clear) first for a fresh build.
    ///
    /// # Errors
    ///
    /// The first fetch error aborts the build and is returned as is. Sheets
    /// from earlier batches stay applied, so the graph should be treated as
    /// unknown and rebuilt from empty.
    pub async fn build_from_spreadsheet(
        &mut self,
        source: &dyn CellDataSource,
        workbook_id: &str,
        sheet_names: Option<Vec<String>>,
        progress: &dyn ProgressSink,
    ) -> Result<BuildSummary> {
        let sheets = match sheet_names {
            Some(names) => names,
            None => source.sheet_names(workbook_id).await?,
        };
        let total = sheets.len();
        let batch_size = self.config.batch_size.max(1);
        info!(workbook = workbook_id, sheets = total, batch_size, "Building dependency graph");

        let mut summary = BuildSummary::default();
        for (batch, chunk) in sheets.chunks(batch_size).enumerate() {
            let fetches = chunk.iter().map(|sheet| async move {
                let rows = source.formula_values(workbook_id, sheet).await?;
                Ok::<_, Error>((sheet.as_str(), rows))
            });

            let fetched = match try_join_all(fetches).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!(workbook = workbook_id, batch, error = %e, "Dependency graph build aborted");
                    return Err(e);
                }
            };

            for (sheet, rows) in fetched {
                self.apply_sheet(sheet, &rows, &mut summary);
            }

            summary.sheets += chunk.len();
            progress.report(
                summary.sheets,
                total,
                &format!("Processed {} of {total} sheets", summary.sheets),
            );
        }

        info!(
            workbook = workbook_id,
            sheets = summary.sheets,
            formulas = summary.formula_cells,
            cells = self.graph.len(),
            dependencies = self.graph.edge_count(),
            "Dependency graph built"
        );
        Ok(summary)
    }

    fn apply_sheet(&mut self, sheet: &str, rows: &[Vec<Value>], summary: &mut BuildSummary) {
        self.sheets
            .entry(sheet.to_lowercase())
            .or_insert_with(|| sheet.to_string());

        let mut formulas = 0;
        for (row, values) in rows.iter().enumerate() {
            for (column, value) in values.iter().enumerate() {
                let Value::String(text) = value else {
                    continue;
                };
                if !is_formula(text) {
                    continue;
                }

                let cell = self.canonicalize(CellAddress::from_position(sheet, row, column));
                summary.invalid_references += self.record_formula(&cell, text, sheet);
                formulas += 1;
            }
        }

        summary.formula_cells += formulas;
        debug!(sheet, formulas, "Applied sheet");
    }

    /// Store `formula` for `cell` and add an edge per reference.
    /// Returns the number of references that could not be read or normalized.
    fn record_formula(&mut self, cell: &CellAddress, formula: &str, sheet: &str) -> usize {
        self.formulas.insert(cell.clone(), formula.to_string());

        let parsed = self.parser.parse(formula);
        let mut invalid = parsed.unresolved.len();
        for token in &parsed.unresolved {
            debug!(cell = %cell, reference = token.as_str(), "Skipping unreadable reference");
        }
        for reference in &parsed.references {
            let target = match self.normalizer.normalize(reference, sheet) {
                Ok(target) => self.canonicalize(target),
                Err(e) => {
                    debug!(cell = %cell, reference, error = %e, "Skipping reference");
                    invalid += 1;
                    continue;
                }
            };

            match expand_range(&target, self.config.range_expansion_limit) {
                Some(cells) => {
                    for each in &cells {
                        self.graph.add_dependency(cell, each, Some(formula));
                    }
                }
                None => self.graph.add_dependency(cell, &target, Some(formula)),
            }
        }
        // A cell other formulas read from keeps its node even without references.
        self.graph.set_formula(cell, formula);
        invalid
    }

    /// Resolve a sheet-qualified cell reference to its canonical address.
    ///
    /// Sheet names match case-insensitively against sheets already seen.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`](crate::error::Error::InvalidReference)
    /// if `cell` is not a sheet-qualified cell reference.
    pub fn resolve(&self, cell: &str) -> Result<CellAddress> {
        // An unqualified reference has no sheet to fall back to.
        let address = self.normalizer.normalize(cell, "")?;
        let known = address
            .sheet()
            .and_then(|sheet| self.sheets.get(&sheet.to_lowercase()));
        Ok(match known {
            Some(sheet) => with_sheet(&address, sheet),
            None => address,
        })
    }

    /// Rewrite `address` to the first spelling seen for its sheet, recording
    /// the sheet if it is new.
    fn canonicalize(&mut self, address: CellAddress) -> CellAddress {
        let Some(sheet) = address.sheet() else {
            return address;
        };
        let canonical = self
            .sheets
            .entry(sheet.to_lowercase())
            .or_insert_with(|| sheet.to_string());
        if canonical.as_str() == sheet {
            address
        } else {
            with_sheet(&address, canonical)
        }
    }

    /// Add the references of a single edited formula.
    ///
    /// Edges from a previous formula of the same cell are kept; use
    /// [`update_formula`](Self::update_formula) to replace them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`](crate::error::Error::InvalidReference)
    /// if `cell` is not a sheet-qualified cell reference.
    pub fn add_formula(&mut self, cell: &str, formula: &str) -> Result<CellAddress> {
        let address = self.resolve(cell)?;
        let address = self.canonicalize(address);
        let sheet = address.sheet().unwrap_or_default().to_string();
        self.record_formula(&address, formula, &sheet);
        debug!(cell = %address, "Added formula");
        Ok(address)
    }

    /// Replace a cell's formula, dropping the references of the old one.
    ///
    /// Cells that read from `cell` keep their edges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`](crate::error::Error::InvalidReference)
    /// if `cell` is not a sheet-qualified cell reference.
    pub fn update_formula(&mut self, cell: &str, formula: &str) -> Result<CellAddress> {
        let address = self.resolve(cell)?;
        let address = self.canonicalize(address);
        self.graph.clear_dependencies(&address);
        let sheet = address.sheet().unwrap_or_default().to_string();
        self.record_formula(&address, formula, &sheet);
        debug!(cell = %address, "Updated formula");
        Ok(address)
    }

    /// Forget a cell: its formula and every edge touching it.
    /// Returns whether the graph knew the cell.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`](crate::error::Error::InvalidReference)
    /// if `cell` is not a sheet-qualified cell reference.
    pub fn remove_cell(&mut self, cell: &str) -> Result<bool> {
        let address = self.resolve(cell)?;
        self.formulas.remove(&address);
        Ok(self.graph.remove_cell(&address))
    }

    /// Empty the graph and the formula index.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.formulas.clear();
        self.sheets.clear();
    }

    // ========== Queries ==========

    /// Report what changing `cell` would affect.
    ///
    /// Unknown cells yield an empty report. Cycles are collected from the
    /// whole graph, not only the part reachable from `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`](crate::error::Error::InvalidReference)
    /// if `cell` is not a sheet-qualified cell reference.
    pub fn analyze_impact(&self, cell: &str) -> Result<ImpactAnalysis> {
        let target = self.resolve(cell)?;

        let all_affected_cells = self.graph.affected_cells(&target);
        let direct_dependents = all_affected_cells
            .iter()
            .take(self.config.direct_dependents_limit)
            .cloned()
            .collect();
        let dependencies = self.graph.dependencies(&target);
        let circular_dependencies = self.graph.detect_cycles();
        let max_depth = self.graph.dependent_depth(&target);
        let recalculation_cost = cost::estimate(
            &all_affected_cells,
            &self.formulas,
            self.parser.as_ref(),
            &self.config.cost,
        );

        debug!(
            cell = %target,
            affected = all_affected_cells.len(),
            max_depth,
            cycles = circular_dependencies.len(),
            "Analyzed impact"
        );

        Ok(ImpactAnalysis {
            target_cell: target,
            direct_dependents,
            all_affected_cells,
            dependencies,
            max_depth,
            recalculation_cost,
            circular_dependencies,
        })
    }

    /// Raw formula text recorded for `cell`.
    #[must_use]
    pub fn formula(&self, cell: &CellAddress) -> Option<&str> {
        self.formulas.get(cell).map(String::as_str)
    }

    /// Number of formulas in the side index.
    #[must_use]
    pub fn formula_count(&self) -> usize {
        self.formulas.len()
    }

    /// The underlying graph, for stats, ordering and export.
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SheetgraphConfig {
        &self.config
    }
}

fn with_sheet(address: &CellAddress, sheet: &str) -> CellAddress {
    CellAddress::new(format!("{sheet}!{}", address.reference()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimeEstimate;
    use crate::source::{NoProgress, WorkbookSnapshot};
    use serde_json::json;

    fn addr(s: &str) -> CellAddress {
        CellAddress::from(s)
    }

    #[test]
    fn test_add_formula_counts() {
        let mut analyzer = ImpactAnalyzer::default();
        analyzer
            .add_formula("Sheet1!A1", "=Sheet1!B1+Sheet1!C1")
            .unwrap();

        let stats = analyzer.graph().stats();
        assert_eq!(stats.formula_cells, 1);
        assert_eq!(stats.total_dependencies, 2);
    }

    #[test]
    fn test_add_formula_qualifies_with_cell_sheet() {
        let mut analyzer = ImpactAnalyzer::default();
        let cell = analyzer.add_formula("Data!$a$1", "=b1*2").unwrap();

        assert_eq!(cell, addr("Data!A1"));
        assert_eq!(analyzer.graph().direct_dependencies(&cell), vec![addr("Data!B1")]);
        assert_eq!(analyzer.formula(&cell), Some("=b1*2"));
    }

    #[test]
    fn test_add_formula_requires_sheet() {
        let mut analyzer = ImpactAnalyzer::default();
        let err = analyzer.add_formula("A1", "=B1").unwrap_err();
        assert!(matches!(err, Error::InvalidReference(_)));
    }

    #[test]
    fn test_update_formula_replaces_references() {
        let mut analyzer = ImpactAnalyzer::default();
        analyzer.add_formula("S!A1", "=B1+C1").unwrap();
        analyzer.add_formula("S!Z1", "=A1").unwrap();
        analyzer.update_formula("S!A1", "=D1").unwrap();

        let a1 = addr("S!A1");
        assert_eq!(analyzer.graph().direct_dependencies(&a1), vec![addr("S!D1")]);
        assert_eq!(analyzer.graph().direct_dependents(&a1), vec![addr("S!Z1")]);
        assert_eq!(analyzer.formula(&a1), Some("=D1"));
        assert_eq!(analyzer.graph().formula(&a1), Some("=D1"));
        assert!(!analyzer.graph().contains(&addr("S!B1")));
    }

    #[test]
    fn test_update_formula_to_constant_replaces_node_formula() {
        let mut analyzer = ImpactAnalyzer::default();
        analyzer.add_formula("S!C1", "=B1").unwrap();
        analyzer.add_formula("S!B1", "=A1").unwrap();
        analyzer.update_formula("S!B1", "=10").unwrap();

        let b1 = addr("S!B1");
        assert_eq!(analyzer.formula(&b1), Some("=10"));
        assert_eq!(analyzer.graph().formula(&b1), Some("=10"));
        assert!(!analyzer.graph().contains(&addr("S!A1")));
        assert_eq!(analyzer.graph().stats().formula_cells, 2);

        let dot = analyzer.graph().to_dot();
        assert!(dot.contains("tooltip=\"=10\""));
        assert!(!dot.contains("=A1"));
    }

    #[test]
    fn test_update_formula_unreferenced_cell_leaves_graph() {
        let mut analyzer = ImpactAnalyzer::default();
        analyzer.add_formula("S!B1", "=A1").unwrap();
        analyzer.update_formula("S!B1", "=10").unwrap();

        assert!(analyzer.graph().is_empty());
        assert_eq!(analyzer.formula(&addr("S!B1")), Some("=10"));
    }

    #[test]
    fn test_remove_cell_drops_formula() {
        let mut analyzer = ImpactAnalyzer::default();
        analyzer.add_formula("S!A1", "=B1").unwrap();

        assert!(analyzer.remove_cell("S!A1").unwrap());
        assert!(!analyzer.remove_cell("S!A1").unwrap());
        assert_eq!(analyzer.formula_count(), 0);
        assert!(analyzer.graph().affected_cells(&addr("S!B1")).is_empty());
    }

    #[test]
    fn test_analyze_impact_nothing_affected() {
        let mut analyzer = ImpactAnalyzer::default();
        analyzer.add_formula("S!A1", "=B1").unwrap();

        let impact = analyzer.analyze_impact("S!A1").unwrap();
        assert!(impact.all_affected_cells.is_empty());
        assert_eq!(impact.recalculation_cost.time_estimate, TimeEstimate::Instant);
        assert_eq!(impact.recalculation_cost.complexity_score, 0);
        assert_eq!(impact.max_depth, 0);
        assert_eq!(impact.dependencies, vec![addr("S!B1")]);
    }

    #[test]
    fn test_analyze_impact_chain() {
        let mut analyzer = ImpactAnalyzer::default();
        analyzer.add_formula("S!B1", "=C1").unwrap();
        analyzer.add_formula("S!A1", "=B1*2").unwrap();

        let impact = analyzer.analyze_impact("S!$c$1").unwrap();
        assert_eq!(impact.target_cell, addr("S!C1"));
        assert_eq!(impact.all_affected_cells, vec![addr("S!B1"), addr("S!A1")]);
        assert_eq!(impact.direct_dependents, impact.all_affected_cells);
        assert_eq!(impact.max_depth, 2);
        // one reference per affected formula: 2 over 2 cells -> 10
        assert_eq!(impact.recalculation_cost.complexity_score, 10);
        assert!(!impact.has_cycles());
    }

    #[test]
    fn test_analyze_impact_truncates_direct_dependents() {
        let config = SheetgraphConfig {
            direct_dependents_limit: 2,
            ..SheetgraphConfig::default()
        };
        let mut analyzer = ImpactAnalyzer::new(config);
        for row in 2..=5 {
            analyzer.add_formula(&format!("S!A{row}"), "=A1").unwrap();
        }

        let impact = analyzer.analyze_impact("S!A1").unwrap();
        assert_eq!(impact.all_affected_cells.len(), 4);
        assert_eq!(impact.direct_dependents, vec![addr("S!A2"), addr("S!A3")]);
    }

    #[test]
    fn test_analyze_impact_reports_unrelated_cycles() {
        let mut analyzer = ImpactAnalyzer::default();
        analyzer.add_formula("S!A1", "=B1").unwrap();
        analyzer.add_formula("S!X1", "=Y1").unwrap();
        analyzer.add_formula("S!Y1", "=X1").unwrap();

        let impact = analyzer.analyze_impact("S!B1").unwrap();
        assert_eq!(impact.circular_dependencies.len(), 1);
        assert!(impact.circular_dependencies[0].contains(&addr("S!X1")));
    }

    #[test]
    fn test_analyze_impact_unknown_cell() {
        let analyzer = ImpactAnalyzer::default();
        let impact = analyzer.analyze_impact("S!Q9").unwrap();
        assert!(impact.all_affected_cells.is_empty());
        assert!(impact.dependencies.is_empty());
    }

    #[test]
    fn test_range_expansion() {
        let config = SheetgraphConfig {
            range_expansion_limit: 4,
            ..SheetgraphConfig::default()
        };
        let mut analyzer = ImpactAnalyzer::new(config);
        analyzer.add_formula("S!C1", "=SUM(A1:B2)+SUM(A1:A10)").unwrap();

        let deps = analyzer.graph().direct_dependencies(&addr("S!C1"));
        assert_eq!(
            deps,
            vec![
                addr("S!A1"),
                addr("S!B1"),
                addr("S!A2"),
                addr("S!B2"),
                addr("S!A1:A10")
            ]
        );
        assert_eq!(
            analyzer.analyze_impact("S!B2").unwrap().all_affected_cells,
            vec![addr("S!C1")]
        );
    }

    #[test]
    fn test_range_kept_as_node_by_default() {
        let mut analyzer = ImpactAnalyzer::default();
        analyzer.add_formula("S!C1", "=SUM(A1:B2)").unwrap();
        assert_eq!(
            analyzer.graph().direct_dependencies(&addr("S!C1")),
            vec![addr("S!A1:B2")]
        );
    }

    #[tokio::test]
    async fn test_build_from_snapshot() {
        let snapshot = WorkbookSnapshot::new("wb")
            .with_sheet(
                "Sheet1",
                vec![
                    vec![json!("=B1+Sheet2!A1"), json!(5)],
                    vec![json!("not a formula"), json!(null), json!("=A1*2")],
                ],
            )
            .with_sheet("Sheet2", vec![vec![json!(1)]]);

        let mut analyzer = ImpactAnalyzer::default();
        let summary = analyzer
            .build_from_spreadsheet(&snapshot, "wb", None, &NoProgress)
            .await
            .unwrap();

        assert_eq!(summary.sheets, 2);
        assert_eq!(summary.formula_cells, 2);
        assert_eq!(analyzer.formula_count(), 2);

        let impact = analyzer.analyze_impact("Sheet2!A1").unwrap();
        assert_eq!(
            impact.all_affected_cells,
            vec![addr("Sheet1!A1"), addr("Sheet1!C2")]
        );
    }

    #[tokio::test]
    async fn test_build_links_unquoted_unicode_sheet() {
        let snapshot = WorkbookSnapshot::new("wb")
            .with_sheet("Лист1", vec![vec![json!(3)]])
            .with_sheet("Report", vec![vec![json!("=Лист1!A1*2")]]);

        let mut analyzer = ImpactAnalyzer::default();
        let summary = analyzer
            .build_from_spreadsheet(&snapshot, "wb", None, &NoProgress)
            .await
            .unwrap();

        assert_eq!(summary.invalid_references, 0);
        assert_eq!(
            analyzer.analyze_impact("Report!A1").unwrap().dependencies,
            vec![addr("Лист1!A1")]
        );
        assert_eq!(
            analyzer.analyze_impact("Лист1!A1").unwrap().all_affected_cells,
            vec![addr("Report!A1")]
        );
    }

    #[tokio::test]
    async fn test_build_counts_unreadable_sheet_prefix() {
        let snapshot =
            WorkbookSnapshot::new("wb").with_sheet("Report", vec![vec![json!("=2024!A1+B1")]]);

        let mut analyzer = ImpactAnalyzer::default();
        let summary = analyzer
            .build_from_spreadsheet(&snapshot, "wb", None, &NoProgress)
            .await
            .unwrap();

        assert_eq!(summary.invalid_references, 1);
        assert_eq!(
            analyzer.graph().direct_dependencies(&addr("Report!A1")),
            vec![addr("Report!B1")]
        );
    }

    #[test]
    fn test_sheet_names_match_case_insensitively() {
        let mut analyzer = ImpactAnalyzer::default();
        analyzer.add_formula("Sheet1!A1", "=sheet2!B1").unwrap();
        analyzer.add_formula("Sheet2!C1", "=SHEET1!A1").unwrap();

        let impact = analyzer.analyze_impact("sheet2!b1").unwrap();
        assert_eq!(impact.target_cell, addr("sheet2!B1"));
        assert_eq!(
            impact.all_affected_cells,
            vec![addr("Sheet1!A1"), addr("sheet2!C1")]
        );
        assert!(analyzer.remove_cell("SHEET1!a1").unwrap());
    }

    #[tokio::test]
    async fn test_build_keeps_first_sheet_spelling() {
        let snapshot = WorkbookSnapshot::new("wb")
            .with_sheet("Sheet1", vec![vec![json!(1)]])
            .with_sheet("Calc", vec![vec![json!("=SHEET1!A1")]]);

        let mut analyzer = ImpactAnalyzer::default();
        analyzer
            .build_from_spreadsheet(&snapshot, "wb", None, &NoProgress)
            .await
            .unwrap();

        assert_eq!(
            analyzer.analyze_impact("sheet1!a1").unwrap().all_affected_cells,
            vec![addr("Calc!A1")]
        );
        assert!(analyzer.graph().contains(&addr("Sheet1!A1")));
    }

    #[tokio::test]
    async fn test_build_limited_to_named_sheets() {
        let snapshot = WorkbookSnapshot::new("wb")
            .with_sheet("One", vec![vec![json!("=B1")]])
            .with_sheet("Two", vec![vec![json!("=B1")]]);

        let mut analyzer = ImpactAnalyzer::default();
        let summary = analyzer
            .build_from_spreadsheet(&snapshot, "wb", Some(vec!["Two".to_string()]), &NoProgress)
            .await
            .unwrap();

        assert_eq!(summary.sheets, 1);
        assert!(analyzer.graph().contains(&addr("Two!A1")));
        assert!(!analyzer.graph().contains(&addr("One!A1")));
    }

    #[tokio::test]
    async fn test_build_fails_on_unknown_sheet() {
        let snapshot = WorkbookSnapshot::new("wb").with_sheet("One", vec![]);
        let mut analyzer = ImpactAnalyzer::default();

        let err = analyzer
            .build_from_spreadsheet(&snapshot, "wb", Some(vec!["Missing".to_string()]), &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SheetNotFound(_)));
    }

    #[test]
    fn test_clear() {
        let mut analyzer = ImpactAnalyzer::default();
        analyzer.add_formula("S!A1", "=B1").unwrap();
        analyzer.clear();
        assert!(analyzer.graph().is_empty());
        assert_eq!(analyzer.formula_count(), 0);
    }
}
