//! Benchmark session - one mode across a sweep of worker counts
//!
//! Enumerates the input once, settles the baseline (supplied, or measured
//! with a sequential pass first), then runs each configured strategy over
//! the same item sequence.

use crate::config::{BenchConfig, Mode};
use crate::discovery;
use crate::error::Result;
use crate::harness::coordinator::{Coordinator, RunResult};
use crate::harness::dispatcher::Strategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Where a session's baseline came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    /// Given on the command line
    Supplied,
    /// Measured with a sequential pass before the configured runs
    Measured,
    /// The sequential run is its own reference
    SelfReferenced,
}

/// Everything measured in one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
    /// Mode that was benchmarked
    pub mode: Mode,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Root the items were discovered under
    pub input_root: PathBuf,

    /// Items discovered
    pub item_count: usize,

    /// Total input size in bytes
    pub input_bytes: u64,

    /// Baseline every speedup is computed against
    pub baseline_seconds: f64,

    /// Origin of the baseline
    pub baseline_source: BaselineSource,

    /// Sequential pass used to measure the baseline, if one was needed
    pub baseline_run: Option<RunResult>,

    /// One result per configured strategy, in order
    pub runs: Vec<RunResult>,
}

impl BenchReport {
    /// Run with the shortest wall time
    pub fn fastest_run(&self) -> Option<&RunResult> {
        self.runs
            .iter()
            .min_by(|a, b| a.wall_time_seconds.total_cmp(&b.wall_time_seconds))
    }

    /// Item failures across all reported runs
    pub fn failed_count(&self) -> u64 {
        self.runs.iter().map(RunResult::failed_count).sum()
    }
}

/// Runs a list of strategies with a shared baseline
pub struct BenchSession {
    mode: Mode,
    strategies: Vec<Strategy>,
    baseline_seconds: Option<f64>,
    coordinator: Coordinator,
}

impl BenchSession {
    pub fn new(
        mode: Mode,
        strategies: Vec<Strategy>,
        baseline_seconds: Option<f64>,
        coordinator: Coordinator,
    ) -> Self {
        Self {
            mode,
            strategies,
            baseline_seconds,
            coordinator,
        }
    }

    /// Create a session for a validated configuration
    pub fn from_config(config: &BenchConfig, coordinator: Coordinator) -> Self {
        Self::new(
            config.mode,
            config.strategies(),
            config.baseline_seconds,
            coordinator,
        )
    }

    /// Run every strategy, stopping at the first failed run
    pub fn run(&self) -> Result<BenchReport> {
        let started_at = Utc::now();
        let items = self.coordinator.enumerate()?;
        let input_bytes = discovery::total_bytes(&items);

        info!(
            root = %self.coordinator.input_root().display(),
            items = items.len(),
            bytes = input_bytes,
            "Discovered input images"
        );

        let baseline_run = match (self.baseline_seconds, self.mode) {
            (None, Mode::Pool | Mode::Distributed) => {
                info!("No baseline supplied, measuring a sequential run first");
                Some(self.coordinator.run_items(&items, Strategy::Sequential, None)?)
            }
            _ => None,
        };

        let baseline_source = match (self.baseline_seconds, &baseline_run) {
            (Some(_), _) => BaselineSource::Supplied,
            (None, Some(_)) => BaselineSource::Measured,
            (None, None) => BaselineSource::SelfReferenced,
        };
        let baseline = self
            .baseline_seconds
            .or_else(|| baseline_run.as_ref().map(|r| r.wall_time_seconds));

        let runs = self
            .strategies
            .iter()
            .map(|&strategy| self.coordinator.run_items(&items, strategy, baseline))
            .collect::<Result<Vec<_>>>()?;

        // A sequential run without a supplied baseline is its own reference
        let baseline_seconds = baseline
            .or_else(|| runs.first().map(|r| r.baseline_seconds))
            .unwrap_or(0.0);

        Ok(BenchReport {
            mode: self.mode,
            started_at,
            input_root: self.coordinator.input_root().to_path_buf(),
            item_count: items.len(),
            input_bytes,
            baseline_seconds,
            baseline_source,
            baseline_run,
            runs,
        })
    }
}
