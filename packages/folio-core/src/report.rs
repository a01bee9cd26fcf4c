//! Presentation payload and aligned-matrix snapshot.
//!
//! [`AnalysisReport`] is the full bundle the presentation sink consumes; it
//! is plain serializable data with no rendering logic. [`MatrixSnapshot`]
//! persists the aligned price matrix to a JSON file, replacing prior
//! contents on each run.

use std::env;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::growth::GrowthProjection;
use crate::ingest::FeedFailure;
use crate::risk::RiskMetrics;
use crate::types::AlignedPriceMatrix;
use crate::Result;

/// A labeled date-indexed value series for display overlays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabeledSeries {
    pub label: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

/// One slice of the allocation breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationSlice {
    pub symbol: String,
    pub weight_pct: f64,
}

/// Everything one analytics run hands to the presentation sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisReport {
    /// Portfolio cumulative return on the aligned return index
    pub portfolio_cumulative: LabeledSeries,
    /// Benchmark cumulative return on the benchmark's own calendar
    pub benchmark_cumulative: LabeledSeries,
    pub risk: RiskMetrics,
    /// Allocation breakdown for the instruments that made it into the matrix
    pub allocation: Vec<AllocationSlice>,
    pub growth: GrowthProjection,
    /// Per-instrument fetch failures that were isolated, not fatal
    pub feed_failures: Vec<FeedFailure>,
}

/// Persists the aligned price matrix as JSON, replacing prior contents.
#[derive(Debug)]
pub struct MatrixSnapshot {
    path: PathBuf,
}

impl MatrixSnapshot {
    /// Snapshot at the default path.
    ///
    /// Default: `~/.folio/prices.json`, overridable with the
    /// `FOLIO_SNAPSHOT_FILE` environment variable.
    pub fn new() -> Self {
        Self {
            path: Self::default_path(),
        }
    }

    /// Snapshot at a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_SNAPSHOT_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".folio/prices.json"))
            .unwrap_or_else(|| PathBuf::from("prices.json"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Write the matrix, replacing whatever the previous run stored.
    pub fn save(&self, matrix: &AlignedPriceMatrix) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(matrix)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Read back the stored matrix.
    pub fn load(&self) -> Result<AlignedPriceMatrix> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl Default for MatrixSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample_matrix() -> AlignedPriceMatrix {
        AlignedPriceMatrix {
            symbols: vec!["AAPL".to_string(), "BTC-USD".to_string()],
            dates: vec![d(1), d(2)],
            rows: vec![vec![100.0, 40000.0], vec![101.0, 40500.0]],
        }
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempdir().unwrap();
        let snapshot = MatrixSnapshot::with_path(dir.path().join("prices.json"));

        let matrix = sample_matrix();
        snapshot.save(&matrix).unwrap();
        let loaded = snapshot.load().unwrap();

        assert_eq!(loaded, matrix);
    }

    #[test]
    fn test_snapshot_replaces_prior_contents() {
        let dir = tempdir().unwrap();
        let snapshot = MatrixSnapshot::with_path(dir.path().join("prices.json"));

        snapshot.save(&sample_matrix()).unwrap();

        let smaller = AlignedPriceMatrix {
            symbols: vec!["MSFT".to_string()],
            dates: vec![d(5)],
            rows: vec![vec![200.0]],
        };
        snapshot.save(&smaller).unwrap();

        let loaded = snapshot.load().unwrap();
        assert_eq!(loaded, smaller);
    }

    #[test]
    fn test_snapshot_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let snapshot = MatrixSnapshot::with_path(dir.path().join("nested/deep/prices.json"));

        snapshot.save(&sample_matrix()).unwrap();
        assert!(snapshot.path().exists());
    }
}
