//! Parallel execution harness
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────────┐
//!                 │       Coordinator        │
//!                 │  - enumerate items once  │
//!                 │  - plan via dispatcher   │
//!                 │  - wall-clock timer      │
//!                 └────────────┬─────────────┘
//!                              │ Partition / shared queue
//!       ┌──────────────────────┼──────────────────────┐
//!       │                      │                      │
//! ┌─────▼─────┐          ┌─────▼─────┐          ┌─────▼─────┐
//! │ Worker 1  │          │ Worker 2  │   ...    │ Worker N  │
//! │ transform │          │ transform │          │ transform │
//! │ self-time │          │ self-time │          │ self-time │
//! └─────┬─────┘          └─────┬─────┘          └─────┬─────┘
//!       │ bounded(1)           │ bounded(1)           │ bounded(1)
//!       └──────────────────────┼──────────────────────┘
//!                              ▼
//!                 ┌──────────────────────────┐
//!                 │  select until N reports  │
//!                 │  or deadline → RunResult │
//!                 └──────────────────────────┘
//! ```

pub mod coordinator;
pub mod dispatcher;
pub mod queue;
pub mod session;
pub mod worker;

pub use coordinator::{efficiency, speedup, Coordinator, RunProgress, RunResult};
pub use dispatcher::{plan, static_split, verify_coverage, Partition, Plan, Strategy};
pub use queue::{ItemQueue, ItemQueueReceiver};
pub use session::{BaselineSource, BenchReport, BenchSession};
pub use worker::{Worker, WorkerReport};
