//! Output formatting for CLI commands.
//!
//! Each report has a text writer generic over [`Write`] plus a dispatch
//! function that picks text or JSON and writes to stdout.

use crate::domain::{
    CellAddress, CellDegree, CircularDependency, GraphStats, ImpactAnalysis, TimeEstimate,
};
use colored::Colorize;
use serde::Serialize;
use std::env;
use std::io::{self, Write};

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Settings for text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Read color preferences from the environment.
    ///
    /// `NO_COLOR` (any value) disables colors, as does `SHEETGRAPH_COLOR`
    /// set to `0` or `false`.
    #[must_use]
    pub fn from_env() -> Self {
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("SHEETGRAPH_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);
        Self { use_colors }
    }

    /// Plain text, no escapes.
    #[must_use]
    pub fn plain() -> Self {
        Self { use_colors: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

// ============================================================================
// Styling
// ============================================================================

fn bold(text: &str, config: OutputConfig) -> String {
    if config.use_colors {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

fn cell(address: &CellAddress, config: OutputConfig) -> String {
    if config.use_colors {
        address.as_str().cyan().to_string()
    } else {
        address.to_string()
    }
}

fn error(text: &str, config: OutputConfig) -> String {
    if config.use_colors {
        text.red().to_string()
    } else {
        text.to_string()
    }
}

fn success(text: &str, config: OutputConfig) -> String {
    if config.use_colors {
        text.green().to_string()
    } else {
        text.to_string()
    }
}

fn time_estimate(estimate: TimeEstimate, config: OutputConfig) -> String {
    let text = estimate.to_string();
    if !config.use_colors {
        return text;
    }
    match estimate {
        TimeEstimate::Instant | TimeEstimate::Fast => text.green().to_string(),
        TimeEstimate::Moderate => text.yellow().to_string(),
        TimeEstimate::Slow | TimeEstimate::VerySlow => text.red().to_string(),
    }
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print graph statistics in the specified format
pub fn print_stats(stats: &GraphStats, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Text => {
            write_stats_text(&mut io::stdout().lock(), stats, OutputConfig::from_env())
        }
        OutputMode::Json => print_json(stats),
    }
}

/// Print detected cycles in the specified format
pub fn print_cycles(cycles: &[CircularDependency], mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Text => {
            write_cycles_text(&mut io::stdout().lock(), cycles, OutputConfig::from_env())
        }
        OutputMode::Json => print_json(cycles),
    }
}

/// Print a recalculation order in the specified format
pub fn print_order(order: &[CellAddress], mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Text => write_order_text(&mut io::stdout().lock(), order),
        OutputMode::Json => print_json(order),
    }
}

/// Print an impact report in the specified format
pub fn print_impact(impact: &ImpactAnalysis, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Text => {
            write_impact_text(&mut io::stdout().lock(), impact, OutputConfig::from_env())
        }
        OutputMode::Json => print_json(impact),
    }
}

/// Print the transitive dependencies of a cell in the specified format
pub fn print_dependencies(
    target: &CellAddress,
    dependencies: &[CellAddress],
    mode: OutputMode,
) -> io::Result<()> {
    match mode {
        OutputMode::Text => write_dependencies_text(
            &mut io::stdout().lock(),
            target,
            dependencies,
            OutputConfig::from_env(),
        ),
        OutputMode::Json => print_json(&serde_json::json!({
            "cell": target,
            "dependencies": dependencies,
        })),
    }
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(handle, "{json}")
}

// ============================================================================
// Text Formatting
// ============================================================================

/// Write graph statistics as text.
pub fn write_stats_text<W: Write>(
    w: &mut W,
    stats: &GraphStats,
    config: OutputConfig,
) -> io::Result<()> {
    writeln!(w, "{}", bold("Dependency Graph", config))?;
    writeln!(w, "  Cells:        {}", stats.total_cells)?;
    writeln!(w, "  Formulas:     {}", stats.formula_cells)?;
    writeln!(w, "  Dependencies: {}", stats.total_dependencies)?;
    writeln!(w, "  Max depth:    {}", stats.max_depth)?;

    write_ranking(w, "Most complex (dependencies)", &stats.most_complex_cells, config)?;
    write_ranking(w, "Most influential (dependents)", &stats.most_influential_cells, config)
}

fn write_ranking<W: Write>(
    w: &mut W,
    title: &str,
    ranking: &[CellDegree],
    config: OutputConfig,
) -> io::Result<()> {
    // Cells with no edges in this direction are noise.
    let ranked: Vec<&CellDegree> = ranking.iter().filter(|d| d.count > 0).collect();
    if ranked.is_empty() {
        return Ok(());
    }

    writeln!(w)?;
    writeln!(w, "{}", bold(title, config))?;
    for degree in ranked {
        writeln!(w, "  {:>5}  {}", degree.count, cell(&degree.cell, config))?;
    }
    Ok(())
}

/// Write detected cycles as text.
pub fn write_cycles_text<W: Write>(
    w: &mut W,
    cycles: &[CircularDependency],
    config: OutputConfig,
) -> io::Result<()> {
    if cycles.is_empty() {
        return writeln!(w, "{}", success("No circular references", config));
    }

    writeln!(
        w,
        "{}",
        error(&format!("{} circular reference(s)", cycles.len()), config)
    )?;
    for cycle in cycles {
        writeln!(w, "  [{}] {}", cycle.severity, cycle.chain)?;
    }
    Ok(())
}

/// Write a recalculation order as text, one cell per line.
pub fn write_order_text<W: Write>(w: &mut W, order: &[CellAddress]) -> io::Result<()> {
    for (i, address) in order.iter().enumerate() {
        writeln!(w, "{:>5}  {address}", i + 1)?;
    }
    Ok(())
}

/// Write an impact report as text.
pub fn write_impact_text<W: Write>(
    w: &mut W,
    impact: &ImpactAnalysis,
    config: OutputConfig,
) -> io::Result<()> {
    let cost = &impact.recalculation_cost;

    writeln!(w, "{} {}", bold("Impact of", config), cell(&impact.target_cell, config))?;
    writeln!(w, "  Affected cells:   {}", impact.all_affected_cells.len())?;
    writeln!(w, "  Dependencies:     {}", impact.dependencies.len())?;
    writeln!(w, "  Max depth:        {}", impact.max_depth)?;
    writeln!(w, "  Complexity score: {}", cost.complexity_score)?;
    writeln!(
        w,
        "  Recalculation:    {}",
        time_estimate(cost.time_estimate, config)
    )?;

    if !impact.direct_dependents.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", bold("Direct dependents", config))?;
        for address in &impact.direct_dependents {
            writeln!(w, "  {}", cell(address, config))?;
        }
        let hidden = impact.all_affected_cells.len() - impact.direct_dependents.len();
        if hidden > 0 {
            writeln!(w, "  ... and {hidden} more")?;
        }
    }

    if impact.has_cycles() {
        writeln!(w)?;
        write_cycles_text(w, &impact.circular_dependencies, config)?;
    }
    Ok(())
}

/// Write a cell's transitive dependencies as text.
pub fn write_dependencies_text<W: Write>(
    w: &mut W,
    target: &CellAddress,
    dependencies: &[CellAddress],
    config: OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {} ({})",
        bold("Dependencies of", config),
        cell(target, config),
        dependencies.len()
    )?;
    for address in dependencies {
        writeln!(w, "  {}", cell(address, config))?;
    }
    Ok(())
}
