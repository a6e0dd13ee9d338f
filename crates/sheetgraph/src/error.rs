//! Error types for sheetgraph operations.
//!
//! Graph queries never fail on unknown cells; they return empty results.
//! The only graph-level failure is [`Error::CircularDependency`], raised by
//! topological sorting. Everything else comes from the edges of the system:
//! reference normalization, the cell-data source, configuration and I/O.

use std::io;
use thiserror::Error;

/// The error type for sheetgraph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A cycle prevented a topological ordering of the graph.
    #[error("Circular dependency detected at cell: {cell}")]
    CircularDependency {
        /// The cell that was reached again while still on the DFS path.
        cell: String,
    },

    /// A cell or range reference could not be normalized.
    #[error("Invalid cell reference: {0}")]
    InvalidReference(String),

    /// The cell-data source failed while fetching a sheet.
    #[error("Failed to fetch sheet '{sheet}': {message}")]
    Source {
        /// The sheet being fetched (empty when listing sheets).
        sheet: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// The requested sheet does not exist in the workbook.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for sheetgraph operations.
pub type Result<T> = std::result::Result<T, Error>;
