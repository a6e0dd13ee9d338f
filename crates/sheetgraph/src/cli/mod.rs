//! CLI argument parsing and command dispatch.
//!
//! Every command loads a workbook snapshot, builds its dependency graph and
//! reports on it.
//!
//! # Commands
//!
//! - `stats`: graph size, depth and the most connected cells
//! - `cycles`: circular references
//! - `order`: recalculation order (fails on cycles)
//! - `impact <CELL>`: what changing a cell affects
//! - `deps <CELL>`: what a cell reads from, transitively
//! - `dot`: Graphviz export
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands except `dot`)
//! - `--config <PATH>`: YAML configuration file
//!
//! # Example
//!
//! ```bash
//! sheetgraph budget.json stats
//! sheetgraph --json budget.json impact 'Inputs!B4'
//! sheetgraph budget.json dot | dot -Tsvg > budget.svg
//! ```

pub mod output;

use crate::analysis::ImpactAnalyzer;
use crate::config::SheetgraphConfig;
use crate::source::{TracingProgress, WorkbookSnapshot};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use output::OutputMode;
use std::path::PathBuf;
use tracing::debug;

/// Sheetgraph - formula dependency analysis for spreadsheets
///
/// Builds the graph of which cells reference which from a workbook snapshot,
/// then reports cycles, recalculation order and the impact of changing a cell.
#[derive(Parser, Debug)]
#[command(name = "sheetgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a YAML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Workbook snapshot (JSON) to analyze
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show graph statistics
    ///
    /// Cell and dependency counts, the longest chain, and the cells with the
    /// most dependencies and dependents.
    Stats,

    /// List circular references
    Cycles,

    /// Print the recalculation order
    ///
    /// Dependencies come before the cells that read them. Fails if the
    /// workbook contains a circular reference.
    Order,

    /// Show what changing a cell would affect
    Impact {
        /// Sheet-qualified cell, e.g. `Sheet1!B4`
        cell: String,
    },

    /// Show everything a cell reads from, transitively
    Deps {
        /// Sheet-qualified cell, e.g. `Sheet1!B4`
        cell: String,
    },

    /// Export the graph in Graphviz DOT format
    Dot,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns a clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }

    /// Build the analyzer described by the flags.
    ///
    /// # Errors
    ///
    /// Fails if the configuration or snapshot cannot be loaded, or if the
    /// build itself fails.
    pub async fn load_analyzer(&self) -> Result<ImpactAnalyzer> {
        let config = match &self.config {
            Some(path) => SheetgraphConfig::load(path)
                .await
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => SheetgraphConfig::default(),
        };

        let snapshot = WorkbookSnapshot::load(&self.snapshot)
            .await
            .with_context(|| format!("Failed to load snapshot {}", self.snapshot.display()))?;

        let mut analyzer = ImpactAnalyzer::new(config);
        analyzer
            .build_from_spreadsheet(&snapshot, &snapshot.workbook_id, None, &TracingProgress)
            .await?;
        Ok(analyzer)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails, a cell reference is invalid, or
    /// `order` runs into a circular reference.
    pub async fn execute(&self) -> Result<()> {
        let analyzer = self.load_analyzer().await?;
        let mode = self.output_mode();
        debug!(command = ?self.command, "Executing command");

        match &self.command {
            Commands::Stats => {
                let stats = analyzer
                    .graph()
                    .stats_with_limit(analyzer.config().top_cells_limit);
                output::print_stats(&stats, mode)?;
            }
            Commands::Cycles => {
                output::print_cycles(&analyzer.graph().detect_cycles(), mode)?;
            }
            Commands::Order => {
                let order = analyzer.graph().topological_sort()?;
                output::print_order(order, mode)?;
            }
            Commands::Impact { cell } => {
                let impact = analyzer.analyze_impact(cell)?;
                output::print_impact(&impact, mode)?;
            }
            Commands::Deps { cell } => {
                let target = analyzer.resolve(cell)?;
                let dependencies = analyzer.graph().dependencies(&target);
                output::print_dependencies(&target, &dependencies, mode)?;
            }
            Commands::Dot => {
                output::print_message(analyzer.graph().to_dot().trim_end())?;
            }
        }

        Ok(())
    }
}
