//! Work partitioning
//!
//! Turns the enumerated item sequence into a [`Plan`]: fixed partitions for
//! sequential and static-split runs, or one shared queue for pooled runs.
//! Every item is assigned exactly once; [`verify_coverage`] checks that for
//! fixed plans before any worker starts.

use crate::discovery::WorkItem;
use crate::error::PartitionError;
use crate::harness::queue::ItemQueue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// How items are distributed among workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "workers", rename_all = "snake_case")]
pub enum Strategy {
    /// One worker, every item
    Sequential,

    /// `n` contiguous partitions fixed in advance (simulated nodes)
    StaticSplit(usize),

    /// `n` workers pulling from one shared queue
    PooledQueue(usize),
}

impl Strategy {
    /// Number of workers this strategy launches
    pub fn worker_count(&self) -> usize {
        match self {
            Strategy::Sequential => 1,
            Strategy::StaticSplit(n) | Strategy::PooledQueue(n) => *n,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Sequential => write!(f, "sequential"),
            Strategy::StaticSplit(n) => write!(f, "static split across {} nodes", n),
            Strategy::PooledQueue(n) => write!(f, "pool of {} workers", n),
        }
    }
}

/// Items assigned to one worker in a fixed plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Worker that owns this partition (1-based)
    pub worker_id: usize,

    /// Assigned items, in input order
    pub items: Vec<WorkItem>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Assignment of a run's items to workers
pub enum Plan {
    /// Each worker owns one precomputed partition
    Fixed(Vec<Partition>),

    /// Workers pull from a shared queue; boundaries emerge at run time
    Pooled { queue: ItemQueue, workers: usize },
}

impl Plan {
    /// Number of workers the plan launches
    pub fn worker_count(&self) -> usize {
        match self {
            Plan::Fixed(partitions) => partitions.len(),
            Plan::Pooled { workers, .. } => *workers,
        }
    }
}

/// Build the plan for `strategy` over `items`
pub fn plan(items: &[WorkItem], strategy: Strategy) -> Result<Plan, PartitionError> {
    if strategy.worker_count() == 0 {
        return Err(PartitionError::NoWorkers);
    }

    match strategy {
        Strategy::Sequential => {
            let partitions = vec![Partition {
                worker_id: 1,
                items: items.to_vec(),
            }];
            verify_coverage(items, &partitions)?;
            Ok(Plan::Fixed(partitions))
        }
        Strategy::StaticSplit(n) => {
            let partitions = static_split(items, n);
            verify_coverage(items, &partitions)?;
            Ok(Plan::Fixed(partitions))
        }
        Strategy::PooledQueue(n) => Ok(Plan::Pooled {
            queue: ItemQueue::from_items(items),
            workers: n,
        }),
    }
}

/// Split `items` into `n` contiguous, order-preserving partitions
///
/// Partition `i` covers `[i*len/n, (i+1)*len/n)`, so sizes differ by at most
/// one and the larger partitions come last. With fewer items than workers
/// some partitions are empty.
pub fn static_split(items: &[WorkItem], n: usize) -> Vec<Partition> {
    let len = items.len();

    (0..n)
        .map(|i| {
            let start = i * len / n;
            let end = (i + 1) * len / n;
            Partition {
                worker_id: i + 1,
                items: items[start..end].to_vec(),
            }
        })
        .collect()
}

/// Check that `partitions` cover `items` exactly once each
pub fn verify_coverage(items: &[WorkItem], partitions: &[Partition]) -> Result<(), PartitionError> {
    let expected: HashSet<&Path> = items.iter().map(WorkItem::path).collect();
    let mut seen: HashSet<&Path> = HashSet::with_capacity(items.len());

    for item in partitions.iter().flat_map(|p| p.items.iter()) {
        if !expected.contains(item.path()) {
            return Err(PartitionError::Unknown {
                path: item.path().to_path_buf(),
            });
        }
        if !seen.insert(item.path()) {
            return Err(PartitionError::Duplicate {
                path: item.path().to_path_buf(),
            });
        }
    }

    if let Some(missing) = items.iter().find(|item| !seen.contains(item.path())) {
        return Err(PartitionError::Missing {
            path: missing.path().to_path_buf(),
        });
    }

    Ok(())
}
