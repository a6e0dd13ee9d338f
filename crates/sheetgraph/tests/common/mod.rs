//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use sheetgraph::error::{Error, Result};
use sheetgraph::source::{CellDataSource, ProgressSink, WorkbookSnapshot};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Run the sheetgraph binary with the given arguments.
pub fn run_sheetgraph(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sheetgraph"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute sheetgraph binary")
}

/// Write `snapshot` as JSON into `dir` and return the file path.
pub fn write_snapshot(dir: &Path, snapshot: &WorkbookSnapshot) -> PathBuf {
    let path = dir.join(format!("{}.json", snapshot.workbook_id));
    std::fs::write(&path, serde_json::to_string_pretty(snapshot).unwrap()).unwrap();
    path
}

/// A small budget workbook.
///
/// `Summary!B1` totals the two inputs through `Calc`, and `Summary!B2`
/// derives from the total.
pub fn budget_workbook() -> WorkbookSnapshot {
    WorkbookSnapshot::new("budget")
        .with_sheet(
            "Inputs",
            vec![vec![json!("Rent"), json!(1200)], vec![json!("Food"), json!(400)]],
        )
        .with_sheet(
            "Calc",
            vec![
                vec![json!("=Inputs!B1*12")],
                vec![json!("=Inputs!B2*12")],
                vec![json!("=A1+A2")],
            ],
        )
        .with_sheet(
            "Summary",
            vec![vec![json!("Total"), json!("=Calc!A3")], vec![json!("Monthly"), json!("=B1/12")]],
        )
}

/// Records every progress report.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub reports: Mutex<Vec<(usize, usize, String)>>,
}

impl RecordingProgress {
    pub fn counts(&self) -> Vec<(usize, usize)> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|(done, total, _)| (*done, *total))
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, completed: usize, total: usize, message: &str) {
        self.reports
            .lock()
            .unwrap()
            .push((completed, total, message.to_string()));
    }
}

/// Source with one formula per sheet that can fail on a chosen sheet and
/// tracks how many fetches overlap.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    pub sheets: Vec<String>,
    pub failing_sheet: Option<String>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(sheets: &[&str]) -> Self {
        Self {
            sheets: sheets.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, sheet: &str) -> Self {
        self.failing_sheet = Some(sheet.to_string());
        self
    }
}

#[async_trait]
impl CellDataSource for ScriptedSource {
    async fn sheet_names(&self, _workbook_id: &str) -> Result<Vec<String>> {
        Ok(self.sheets.clone())
    }

    async fn formula_values(&self, _workbook_id: &str, sheet: &str) -> Result<Vec<Vec<Value>>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_sheet.as_deref() == Some(sheet) {
            return Err(Error::Source {
                sheet: sheet.to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(vec![vec![json!("=B1+1")]])
    }
}
