//! Where formula text comes from.
//!
//! The analyzer reads workbooks through [`CellDataSource`], an async trait so
//! that remote spreadsheet APIs and local snapshots share one interface. The
//! trait is object-safe and used as `&dyn CellDataSource`.
//!
//! [`ProgressSink`] receives bulk-build progress at batch boundaries.

mod snapshot;

pub use snapshot::{SheetSnapshot, WorkbookSnapshot};

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

/// Supplier of raw cell contents for a workbook.
#[async_trait]
pub trait CellDataSource: Send + Sync {
    /// Names of every sheet in the workbook, in workbook order.
    ///
    /// # Errors
    ///
    /// Returns an error if the workbook cannot be read.
    async fn sheet_names(&self, workbook_id: &str) -> Result<Vec<String>>;

    /// The used grid of `sheet`, rendered so formula cells hold their formula
    /// text (`"=SUM(A1:A10)"`) rather than a computed value.
    ///
    /// Rows may be ragged. Non-string values are ignored by the analyzer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SheetNotFound`](crate::error::Error::SheetNotFound)
    /// for an unknown sheet, or another error if the fetch fails.
    async fn formula_values(&self, workbook_id: &str, sheet: &str) -> Result<Vec<Vec<Value>>>;
}

/// Receives `(completed, total, message)` after each bulk-build batch.
///
/// Purely informational. Implementations must not panic.
pub trait ProgressSink: Send + Sync {
    /// Report that `completed` of `total` sheets have been applied.
    fn report(&self, completed: usize, total: usize, message: &str);
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _completed: usize, _total: usize, _message: &str) {}
}

/// Emits progress as `info!` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, completed: usize, total: usize, message: &str) {
        info!(completed, total, "{message}");
    }
}
