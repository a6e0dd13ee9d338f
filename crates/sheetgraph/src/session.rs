//! Per-workbook analyzer instances.
//!
//! A long-running host keeps one [`ImpactAnalyzer`] per workbook in an
//! [`AnalyzerRegistry`] that it owns and passes around explicitly. Each
//! analyzer sits behind its own `tokio::sync::RwLock`, so queries run in
//! parallel while builds and edits are serialized.
//!
//! # Lock Ordering
//!
//! Acquire the registry (if it is itself behind a lock) before any analyzer
//! lock. Never take the registry lock while holding an analyzer lock.

use crate::analysis::{BuildSummary, ImpactAnalyzer};
use crate::config::SheetgraphConfig;
use crate::error::Result;
use crate::source::{CellDataSource, ProgressSink};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Default number of workbooks kept before the oldest is evicted.
pub const MAX_CACHED_WORKBOOKS: usize = 32;

/// Shared handle to one workbook's analyzer.
pub type SharedAnalyzer = Arc<RwLock<ImpactAnalyzer>>;

/// Bounded map from workbook id to analyzer, evicted oldest-first.
#[derive(Debug)]
pub struct AnalyzerRegistry {
    config: SheetgraphConfig,
    capacity: usize,
    analyzers: HashMap<String, SharedAnalyzer>,
    /// Insertion order for FIFO eviction.
    order: VecDeque<String>,
}

impl AnalyzerRegistry {
    /// Create a registry holding up to [`MAX_CACHED_WORKBOOKS`] analyzers.
    #[must_use]
    pub fn new(config: SheetgraphConfig) -> Self {
        Self::with_capacity(config, MAX_CACHED_WORKBOOKS)
    }

    /// Create a registry holding up to `capacity` analyzers (at least one).
    #[must_use]
    pub fn with_capacity(config: SheetgraphConfig, capacity: usize) -> Self {
        Self {
            config,
            capacity: capacity.max(1),
            analyzers: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// The analyzer for `workbook_id`, created empty if absent.
    pub fn get_or_create(&mut self, workbook_id: &str) -> SharedAnalyzer {
        if let Some(analyzer) = self.analyzers.get(workbook_id) {
            debug!(workbook = workbook_id, "Using cached analyzer");
            return Arc::clone(analyzer);
        }

        while self.analyzers.len() >= self.capacity {
            self.evict_oldest();
        }

        debug!(workbook = workbook_id, "Creating analyzer");
        let analyzer = Arc::new(RwLock::new(ImpactAnalyzer::new(self.config.clone())));
        self.analyzers
            .insert(workbook_id.to_string(), Arc::clone(&analyzer));
        self.order.push_back(workbook_id.to_string());
        analyzer
    }

    /// The analyzer for `workbook_id`, if one exists.
    #[must_use]
    pub fn get(&self, workbook_id: &str) -> Option<SharedAnalyzer> {
        self.analyzers.get(workbook_id).cloned()
    }

    /// Drop the analyzer for `workbook_id`. Returns whether it existed.
    ///
    /// Handles already given out stay usable until they are dropped.
    pub fn remove(&mut self, workbook_id: &str) -> bool {
        self.order.retain(|id| id != workbook_id);
        self.analyzers.remove(workbook_id).is_some()
    }

    /// Number of cached analyzers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    /// Whether no analyzer is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Rebuild a workbook's graph from empty.
    ///
    /// On failure the analyzer is cleared again, so a failed build never
    /// leaves a half-populated graph behind.
    ///
    /// # Errors
    ///
    /// Returns the first error from the cell-data source.
    pub async fn refresh(
        &mut self,
        source: &dyn CellDataSource,
        workbook_id: &str,
        sheet_names: Option<Vec<String>>,
        progress: &dyn ProgressSink,
    ) -> Result<BuildSummary> {
        let analyzer = self.get_or_create(workbook_id);
        let mut analyzer = analyzer.write().await;

        analyzer.clear();
        match analyzer
            .build_from_spreadsheet(source, workbook_id, sheet_names, progress)
            .await
        {
            Ok(summary) => Ok(summary),
            Err(e) => {
                warn!(workbook = workbook_id, error = %e, "Discarding partial graph");
                analyzer.clear();
                Err(e)
            }
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self.order.pop_front() {
            self.analyzers.remove(&oldest);
            debug!(workbook = %oldest, "Evicted analyzer from cache");
        }
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new(SheetgraphConfig::default())
    }
}
