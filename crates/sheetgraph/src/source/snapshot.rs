//! In-memory workbook snapshot, loadable from JSON.

use super::CellDataSource;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// One sheet's grid of raw values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetSnapshot {
    /// Sheet name as it appears in references.
    pub name: String,

    /// Row-major cell values. Strings starting with `=` are formulas.
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

/// A captured workbook used as a [`CellDataSource`].
///
/// ```json
/// {
///   "workbook_id": "budget",
///   "sheets": [
///     { "name": "Sheet1", "rows": [["=B1*2", 10]] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkbookSnapshot {
    /// Identifier the snapshot answers to.
    pub workbook_id: String,

    /// Sheets in workbook order.
    #[serde(default)]
    pub sheets: Vec<SheetSnapshot>,
}

impl WorkbookSnapshot {
    /// Create an empty snapshot.
    pub fn new(workbook_id: impl Into<String>) -> Self {
        Self {
            workbook_id: workbook_id.into(),
            sheets: Vec::new(),
        }
    }

    /// Append a sheet built from rows of values.
    #[must_use]
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Vec<Value>>) -> Self {
        self.sheets.push(SheetSnapshot {
            name: name.into(),
            rows,
        });
        self
    }

    /// Parse a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read or [`Error::Json`]
    /// if it is not a valid snapshot.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let snapshot = Self::from_json(&content)?;
        debug!(
            path = %path.display(),
            workbook = %snapshot.workbook_id,
            sheets = snapshot.sheets.len(),
            "Loaded workbook snapshot"
        );
        Ok(snapshot)
    }

    /// Write the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    fn check_workbook(&self, workbook_id: &str, sheet: &str) -> Result<()> {
        if workbook_id == self.workbook_id {
            Ok(())
        } else {
            Err(Error::Source {
                sheet: sheet.to_string(),
                message: format!("unknown workbook '{workbook_id}'"),
            })
        }
    }
}

#[async_trait]
impl CellDataSource for WorkbookSnapshot {
    async fn sheet_names(&self, workbook_id: &str) -> Result<Vec<String>> {
        self.check_workbook(workbook_id, "")?;
        Ok(self.sheets.iter().map(|s| s.name.clone()).collect())
    }

    async fn formula_values(&self, workbook_id: &str, sheet: &str) -> Result<Vec<Vec<Value>>> {
        self.check_workbook(workbook_id, sheet)?;
        self.sheets
            .iter()
            .find(|s| s.name == sheet)
            .map(|s| s.rows.clone())
            .ok_or_else(|| Error::SheetNotFound(sheet.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> WorkbookSnapshot {
        WorkbookSnapshot::new("wb")
            .with_sheet("Sheet1", vec![vec![json!("=B1*2"), json!(10)]])
            .with_sheet("Totals", vec![])
    }

    #[tokio::test]
    async fn test_sheet_names_in_order() {
        let names = sample().sheet_names("wb").await.unwrap();
        assert_eq!(names, vec!["Sheet1", "Totals"]);
    }

    #[tokio::test]
    async fn test_formula_values() {
        let rows = sample().formula_values("wb", "Sheet1").await.unwrap();
        assert_eq!(rows, vec![vec![json!("=B1*2"), json!(10)]]);
    }

    #[tokio::test]
    async fn test_unknown_sheet() {
        let err = sample().formula_values("wb", "Nope").await.unwrap_err();
        assert!(matches!(err, Error::SheetNotFound(ref s) if s == "Nope"));
    }

    #[tokio::test]
    async fn test_wrong_workbook() {
        let err = sample().sheet_names("other").await.unwrap_err();
        assert!(matches!(err, Error::Source { .. }));
    }

    #[test]
    fn test_from_json_defaults_rows() {
        let snapshot =
            WorkbookSnapshot::from_json(r#"{"workbook_id":"x","sheets":[{"name":"A"}]}"#).unwrap();
        assert!(snapshot.sheets[0].rows.is_empty());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            WorkbookSnapshot::from_json("not json"),
            Err(Error::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("workbook.json");

        let snapshot = sample();
        snapshot.save(&path).await.unwrap();
        let loaded = WorkbookSnapshot::load(&path).await.unwrap();

        assert_eq!(loaded, snapshot);
    }
}
