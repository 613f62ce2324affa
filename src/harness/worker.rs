//! Worker thread logic
//!
//! Each worker:
//! - Owns either a fixed partition or a handle on the shared pooled queue
//! - Applies the transform to one item at a time, logging and counting failures
//! - Times its whole assignment, from before the first item to after the last
//! - Sends exactly one [`WorkerReport`] on its own one-shot channel

use crate::discovery::WorkItem;
use crate::error::{ItemOutcome, WorkerError};
use crate::harness::dispatcher::Partition;
use crate::harness::queue::ItemQueueReceiver;
use crate::transform::Transform;
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Summary a worker emits once its assignment is done
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    /// Worker ID (1-based)
    pub worker_id: usize,

    /// Items attempted, successful or not
    pub processed_count: u64,

    /// Items whose transform failed
    pub failed_count: u64,

    /// Wall-clock seconds spent on the assignment
    pub elapsed_seconds: f64,
}

/// Live counters for a running worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Items attempted
    pub processed: AtomicU64,

    /// Items failed
    pub failed: AtomicU64,
}

impl WorkerStats {
    fn record_success(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Where a worker gets its items from
pub enum WorkSource {
    /// A precomputed partition
    Partition(std::vec::IntoIter<WorkItem>),

    /// The shared pooled queue
    Queue(ItemQueueReceiver),
}

impl WorkSource {
    fn next_item(&mut self) -> Option<WorkItem> {
        match self {
            WorkSource::Partition(items) => items.next(),
            WorkSource::Queue(rx) => rx.next_item(),
        }
    }

    fn describe(&self) -> String {
        match self {
            WorkSource::Partition(items) => format!("{} assigned items", items.len()),
            WorkSource::Queue(_) => "shared queue".to_string(),
        }
    }
}

impl From<Partition> for WorkSource {
    fn from(partition: Partition) -> Self {
        WorkSource::Partition(partition.items.into_iter())
    }
}

impl From<ItemQueueReceiver> for WorkSource {
    fn from(rx: ItemQueueReceiver) -> Self {
        WorkSource::Queue(rx)
    }
}

/// A worker thread processing one assignment
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    ///
    /// The report sender is consumed by the worker, which sends on it once.
    pub fn spawn(
        id: usize,
        source: WorkSource,
        transform: Arc<dyn Transform>,
        report_tx: Sender<WorkerReport>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || worker_loop(id, source, transform, report_tx, shutdown, stats_clone))
            .map_err(|e| WorkerError::InitFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|payload| WorkerError::Panicked {
                id: self.id,
                message: panic_message(payload.as_ref()),
            }),
            None => Ok(()),
        }
    }
}

/// Main worker loop
fn worker_loop(
    id: usize,
    mut source: WorkSource,
    transform: Arc<dyn Transform>,
    report_tx: Sender<WorkerReport>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
) {
    info!(worker = id, source = %source.describe(), "Worker starting");
    let start = Instant::now();

    while !shutdown.load(Ordering::Relaxed) {
        let Some(item) = source.next_item() else {
            break;
        };

        match process_item(transform.as_ref(), &item, &stats) {
            ItemOutcome::Success { path } => {
                debug!(worker = id, path = %path.display(), "Item processed");
            }
            ItemOutcome::Failed { path, error } => {
                warn!(worker = id, path = %path.display(), error = %error, "Item failed");
            }
        }
    }

    let report = WorkerReport {
        worker_id: id,
        processed_count: stats.processed.load(Ordering::Relaxed),
        failed_count: stats.failed.load(Ordering::Relaxed),
        elapsed_seconds: start.elapsed().as_secs_f64(),
    };

    info!(
        worker = id,
        items = report.processed_count,
        failed = report.failed_count,
        elapsed_secs = report.elapsed_seconds,
        "Worker finished"
    );

    if report_tx.send(report).is_err() {
        debug!(worker = id, "Coordinator stopped listening before report was sent");
    }
}

/// Apply the transform to a single item
fn process_item(transform: &dyn Transform, item: &WorkItem, stats: &WorkerStats) -> ItemOutcome {
    match transform.apply(item) {
        Ok(()) => {
            stats.record_success();
            ItemOutcome::Success {
                path: item.path().to_path_buf(),
            }
        }
        Err(error) => {
            stats.record_failure();
            ItemOutcome::Failed {
                path: item.path().to_path_buf(),
                error,
            }
        }
    }
}

/// Aggregate (processed, failed) across workers
pub fn aggregate_stats(workers: &[Worker]) -> (u64, u64) {
    workers.iter().fold((0, 0), |(processed, failed), worker| {
        (
            processed + worker.stats.processed.load(Ordering::Relaxed),
            failed + worker.stats.failed.load(Ordering::Relaxed),
        )
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Worker thread panicked".to_string()
    }
}
