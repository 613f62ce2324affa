//! imgbench - Parallel Image Pipeline Benchmark
//!
//! Measures how fast a fixed image pipeline (resize, semi-transparent text
//! watermark, re-encode) runs over a directory tree under three execution
//! strategies, and reports speedup against a sequential baseline.
//!
//! # Strategies
//!
//! - **Sequential**: one worker processes every item; the reference time.
//!
//! - **Pool**: N workers pull items from one shared queue, so faster workers
//!   take more items.
//!
//! - **Distributed (simulated)**: the item list is split into N contiguous
//!   shares up front, one per "node"; each node times itself and reports to
//!   the coordinator.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  discovery   │──▶│  dispatcher  │──▶│   workers    │──▶│ coordinator  │
//! │ ordered list │   │ plan/queue   │   │  transform   │   │  RunResult   │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                                                 │
//!                                                                 ▼
//!                                                          ┌──────────────┐
//!                                                          │    report    │
//!                                                          └──────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Reference time
//! imgbench dataset --mode sequential
//!
//! # Pool sweep against a known baseline
//! imgbench dataset --mode pool -w 1,2,4,8 --baseline 2.86
//!
//! # Two simulated nodes, baseline measured first
//! imgbench dataset --mode distributed -w 2
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod harness;
pub mod progress;
pub mod report;
pub mod transform;

pub use config::{BenchConfig, CliArgs, EncodeFormat, Mode, TransformConfig};
pub use discovery::WorkItem;
pub use error::{BenchError, Result};
pub use harness::{BenchReport, BenchSession, Coordinator, RunResult, Strategy, WorkerReport};
pub use transform::{ImageTransform, Transform};
