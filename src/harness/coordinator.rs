//! Run coordinator - orchestrates one timed run
//!
//! The coordinator is responsible for:
//! - Enumerating the input once and asking the dispatcher for a plan
//! - Launching one worker per partition (or pool slot)
//! - Collecting exactly one report per worker before a deadline
//! - Computing wall time, speedup and efficiency
//! - Signalling workers to stop on timeout, crash, or interrupt

use crate::discovery::{self, WorkItem};
use crate::error::{BenchError, PartitionError, Result, WorkerError};
use crate::harness::dispatcher::{self, Plan, Strategy};
use crate::harness::worker::{aggregate_stats, WorkSource, Worker, WorkerReport};
use crate::transform::Transform;
use crossbeam_channel::{bounded, Receiver, Select};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often progress is published while waiting for reports
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Speedup of a run over the baseline; zero when the run took no measurable time
pub fn speedup(baseline_seconds: f64, wall_time_seconds: f64) -> f64 {
    if wall_time_seconds > 0.0 {
        baseline_seconds / wall_time_seconds
    } else {
        0.0
    }
}

/// Speedup per worker
pub fn efficiency(speedup: f64, worker_count: usize) -> f64 {
    if worker_count > 0 {
        speedup / worker_count as f64
    } else {
        0.0
    }
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Strategy the run used
    pub strategy: Strategy,

    /// Workers launched
    pub worker_count: usize,

    /// One report per worker, sorted by worker ID
    pub reports: Vec<WorkerReport>,

    /// Wall-clock seconds from launch to the last report
    pub wall_time_seconds: f64,

    /// Reference time the speedup is measured against
    pub baseline_seconds: f64,

    /// `baseline_seconds / wall_time_seconds`
    pub speedup: f64,

    /// `speedup / worker_count`
    pub efficiency: f64,
}

impl RunResult {
    /// Build the result from the full set of reports
    pub fn from_reports(
        strategy: Strategy,
        mut reports: Vec<WorkerReport>,
        wall_time: Duration,
        baseline_seconds: f64,
    ) -> Self {
        reports.sort_by_key(|r| r.worker_id);

        let worker_count = strategy.worker_count();
        let wall_time_seconds = wall_time.as_secs_f64();
        let speedup = speedup(baseline_seconds, wall_time_seconds);

        Self {
            strategy,
            worker_count,
            reports,
            wall_time_seconds,
            baseline_seconds,
            speedup,
            efficiency: efficiency(speedup, worker_count),
        }
    }

    /// Items attempted across all workers
    pub fn processed_count(&self) -> u64 {
        self.reports.iter().map(|r| r.processed_count).sum()
    }

    /// Items that failed to transform
    pub fn failed_count(&self) -> u64 {
        self.reports.iter().map(|r| r.failed_count).sum()
    }

    /// Calculate items per second over the wall time
    pub fn items_per_second(&self) -> f64 {
        if self.wall_time_seconds > 0.0 {
            self.processed_count() as f64 / self.wall_time_seconds
        } else {
            0.0
        }
    }
}

/// Progress information for display
#[derive(Debug, Clone)]
pub struct RunProgress {
    /// Strategy of the run in flight
    pub strategy: Strategy,

    /// Items attempted so far
    pub processed: u64,

    /// Items failed so far
    pub failed: u64,

    /// Items in the run
    pub total: u64,

    /// Workers that have reported
    pub reported_workers: usize,

    /// Workers launched
    pub total_workers: usize,

    /// Elapsed time
    pub elapsed: Duration,
}

impl RunProgress {
    /// Calculate items per second rate
    pub fn items_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }
}

type ProgressFn = dyn Fn(&RunProgress) + Send + Sync;

/// Runs strategies over an input tree with a shared transform
pub struct Coordinator {
    /// Root searched for work items
    input_root: PathBuf,

    /// Transform applied by every worker
    transform: Arc<dyn Transform>,

    /// Deadline for collecting all reports, measured from launch
    timeout: Duration,

    /// Shutdown signal
    shutdown: Arc<AtomicBool>,

    /// Progress observer
    progress: Option<Box<ProgressFn>>,
}

impl Coordinator {
    /// Create a new coordinator
    pub fn new(input_root: impl Into<PathBuf>, transform: Arc<dyn Transform>, timeout: Duration) -> Self {
        Self {
            input_root: input_root.into(),
            transform,
            timeout,
            shutdown: Arc::new(AtomicBool::new(false)),
            progress: None,
        }
    }

    /// Publish progress to `observer` while runs are in flight
    pub fn with_progress<F>(mut self, observer: F) -> Self
    where
        F: Fn(&RunProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(observer));
        self
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    ///
    /// Once raised, in-flight workers stop after their current item and every
    /// later run fails with [`BenchError::Interrupted`].
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    /// Enumerate the work items under the input root
    pub fn enumerate(&self) -> Result<Vec<WorkItem>> {
        Ok(discovery::enumerate(&self.input_root)?)
    }

    /// Enumerate the input and run `strategy` over it
    pub fn run(&self, strategy: Strategy, baseline_seconds: Option<f64>) -> Result<RunResult> {
        let items = self.enumerate()?;
        self.run_items(&items, strategy, baseline_seconds)
    }

    /// Run `strategy` over already-enumerated items
    ///
    /// Without a baseline the run is measured against itself (speedup 1).
    pub fn run_items(
        &self,
        items: &[WorkItem],
        strategy: Strategy,
        baseline_seconds: Option<f64>,
    ) -> Result<RunResult> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(BenchError::Interrupted);
        }

        let plan = dispatcher::plan(items, strategy)?;

        info!(
            strategy = %strategy,
            items = items.len(),
            workers = plan.worker_count(),
            "Starting run"
        );

        let start = Instant::now();
        let (workers, pending) = self.spawn_workers(plan)?;

        let collected = self.collect_reports(strategy, &workers, pending, items.len() as u64, start);
        let wall_time = start.elapsed();

        let reports = match collected {
            Ok(reports) => reports,
            Err(e) => {
                // Stop the stragglers; their threads are detached
                self.shutdown.store(true, Ordering::SeqCst);
                warn!(strategy = %strategy, error = %e, "Run failed, signalling workers to stop");
                return Err(e);
            }
        };

        self.join_workers(workers);

        if self.shutdown.load(Ordering::SeqCst) {
            info!(strategy = %strategy, "Run was interrupted before completion");
            return Err(BenchError::Interrupted);
        }

        let processed: u64 = reports.iter().map(|r| r.processed_count).sum();
        if processed != items.len() as u64 {
            return Err(PartitionError::CountMismatch {
                expected: items.len() as u64,
                actual: processed,
            }
            .into());
        }

        let baseline = baseline_seconds.unwrap_or_else(|| wall_time.as_secs_f64());
        let result = RunResult::from_reports(strategy, reports, wall_time, baseline);

        info!(
            strategy = %strategy,
            items = processed,
            failed = result.failed_count(),
            wall_secs = result.wall_time_seconds,
            speedup = result.speedup,
            "Run completed"
        );

        Ok(result)
    }

    /// Spawn one worker per partition or pool slot, each with its own report channel
    fn spawn_workers(&self, plan: Plan) -> Result<(Vec<Worker>, Vec<(usize, Receiver<WorkerReport>)>)> {
        let sources: Vec<(usize, WorkSource)> = match plan {
            Plan::Fixed(partitions) => partitions
                .into_iter()
                .map(|p| {
                    debug!(worker = p.worker_id, items = p.len(), "Partition assigned");
                    (p.worker_id, WorkSource::from(p))
                })
                .collect(),
            Plan::Pooled { queue, workers } => {
                debug!(queued = queue.len(), workers, "Shared queue filled");
                (1..=workers)
                    .map(|id| (id, WorkSource::from(queue.receiver())))
                    .collect()
            }
        };

        let mut workers = Vec::with_capacity(sources.len());
        let mut pending = Vec::with_capacity(sources.len());

        for (id, source) in sources {
            let (report_tx, report_rx) = bounded(1);
            let worker = Worker::spawn(
                id,
                source,
                Arc::clone(&self.transform),
                report_tx,
                Arc::clone(&self.shutdown),
            )
            .inspect_err(|_| self.shutdown.store(true, Ordering::SeqCst))?;

            workers.push(worker);
            pending.push((id, report_rx));
        }

        debug!(count = workers.len(), "Workers spawned");
        Ok((workers, pending))
    }

    /// Block until every worker has reported, one crashes, or the deadline passes
    fn collect_reports(
        &self,
        strategy: Strategy,
        workers: &[Worker],
        mut pending: Vec<(usize, Receiver<WorkerReport>)>,
        total: u64,
        start: Instant,
    ) -> Result<Vec<WorkerReport>> {
        let expected = pending.len();
        // A timeout too large to represent as an instant never expires
        let deadline = start.checked_add(self.timeout);
        let mut reports = Vec::with_capacity(expected);

        while !pending.is_empty() {
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(WorkerError::Timeout {
                            expected,
                            received: reports.len(),
                            timeout: self.timeout,
                        }
                        .into());
                    }
                    (deadline - now).min(PROGRESS_INTERVAL)
                }
                None => PROGRESS_INTERVAL,
            };

            let selected = {
                let mut select = Select::new();
                for (_, rx) in &pending {
                    select.recv(rx);
                }
                match select.select_timeout(wait) {
                    Ok(oper) => {
                        let index = oper.index();
                        Some((index, oper.recv(&pending[index].1)))
                    }
                    Err(_) => None,
                }
            };

            if let Some((index, received)) = selected {
                let (id, _) = pending.swap_remove(index);
                match received {
                    Ok(report) => {
                        debug!(worker = id, items = report.processed_count, "Report received");
                        reports.push(report);
                    }
                    Err(_) => return Err(WorkerError::Crashed { id }.into()),
                }
            }

            self.publish_progress(strategy, workers, total, reports.len(), start);
        }

        Ok(reports)
    }

    fn publish_progress(
        &self,
        strategy: Strategy,
        workers: &[Worker],
        total: u64,
        reported_workers: usize,
        start: Instant,
    ) {
        if let Some(observer) = &self.progress {
            let (processed, failed) = aggregate_stats(workers);
            observer(&RunProgress {
                strategy,
                processed,
                failed,
                total,
                reported_workers,
                total_workers: workers.len(),
                elapsed: start.elapsed(),
            });
        }
    }

    /// Join all worker threads once their reports are in
    fn join_workers(&self, workers: Vec<Worker>) {
        for worker in workers {
            let id = worker.id();
            if let Err(e) = worker.join() {
                warn!(worker = id, error = %e, "Worker failed to join cleanly");
            }
        }
    }
}
