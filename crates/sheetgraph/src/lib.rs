//! Sheetgraph - formula dependency graphs and impact analysis for spreadsheets.
//!
//! The crate has two layers:
//!
//! - [`graph::DependencyGraph`]: an in-memory directed graph of cell
//!   references with cycle detection, topological ordering, reachability
//!   queries, statistics and DOT export. It knows nothing about formulas.
//! - [`analysis::ImpactAnalyzer`]: fills a graph from formula text pulled out
//!   of a [`source::CellDataSource`] and answers "what happens if this cell
//!   changes" queries with a recalculation-cost estimate.
//!
//! # Example
//!
//! ```
//! use sheetgraph::analysis::ImpactAnalyzer;
//!
//! # fn main() -> sheetgraph::error::Result<()> {
//! let mut analyzer = ImpactAnalyzer::default();
//! analyzer.add_formula("Sheet1!B1", "=Sheet1!C1*2")?;
//! analyzer.add_formula("Sheet1!A1", "=B1+1")?;
//!
//! let impact = analyzer.analyze_impact("Sheet1!C1")?;
//! assert_eq!(impact.all_affected_cells.len(), 2);
//! assert_eq!(impact.max_depth, 2);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod analysis;
pub mod config;
pub mod domain;
pub mod error;
pub mod formula;
pub mod graph;
pub mod session;
pub mod source;

// Public CLI module (needed by binary)
pub mod cli;
