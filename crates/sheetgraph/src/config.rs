//! Analyzer configuration.
//!
//! Loaded from YAML. Every field has a default, so an empty file (or no file
//! at all) yields [`SheetgraphConfig::default`].

use crate::domain::TimeEstimate;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Default number of sheets fetched concurrently during a bulk build.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Default length of `ImpactAnalysis::direct_dependents`.
pub const DEFAULT_DIRECT_DEPENDENTS_LIMIT: usize = 10;

/// Default name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "sheetgraph.yaml";

/// Configuration for building and querying dependency graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetgraphConfig {
    /// Sheets fetched concurrently per batch.
    pub batch_size: usize,

    /// How many affected cells are reported as direct dependents.
    pub direct_dependents_limit: usize,

    /// Length of the most-complex / most-influential rankings.
    pub top_cells_limit: usize,

    /// Ranges with at most this many cells become per-cell edges. 0 disables.
    pub range_expansion_limit: usize,

    /// Latency bucket boundaries.
    pub cost: CostThresholds,
}

impl Default for SheetgraphConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            direct_dependents_limit: DEFAULT_DIRECT_DEPENDENTS_LIMIT,
            top_cells_limit: crate::graph::DEFAULT_TOP_CELLS,
            range_expansion_limit: 0,
            cost: CostThresholds::default(),
        }
    }
}

impl SheetgraphConfig {
    /// Load configuration from a YAML file and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`]
    /// if it does not parse or fails validation.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Check that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero batch size or thresholds that do
    /// not strictly increase.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        self.cost.validate()
    }
}

/// Affected-cell counts separating the latency buckets.
///
/// A count below `instant` is [`TimeEstimate::Instant`], below `fast` is
/// [`TimeEstimate::Fast`], and so on; anything at or above `slow` is
/// [`TimeEstimate::VerySlow`]. These are calibration guesses, not timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostThresholds {
    /// Upper bound (exclusive) of the instant bucket.
    pub instant: usize,
    /// Upper bound (exclusive) of the fast bucket.
    pub fast: usize,
    /// Upper bound (exclusive) of the moderate bucket.
    pub moderate: usize,
    /// Upper bound (exclusive) of the slow bucket.
    pub slow: usize,
}

impl Default for CostThresholds {
    fn default() -> Self {
        Self {
            instant: 10,
            fast: 50,
            moderate: 200,
            slow: 1000,
        }
    }
}

impl CostThresholds {
    /// Bucket a raw affected-cell count.
    #[must_use]
    pub fn bucket(&self, cell_count: usize) -> TimeEstimate {
        if cell_count < self.instant {
            TimeEstimate::Instant
        } else if cell_count < self.fast {
            TimeEstimate::Fast
        } else if cell_count < self.moderate {
            TimeEstimate::Moderate
        } else if cell_count < self.slow {
            TimeEstimate::Slow
        } else {
            TimeEstimate::VerySlow
        }
    }

    fn validate(&self) -> Result<()> {
        if self.instant < self.fast && self.fast < self.moderate && self.moderate < self.slow {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "cost thresholds must strictly increase, got {}/{}/{}/{}",
                self.instant, self.fast, self.moderate, self.slow
            )))
        }
    }
}
