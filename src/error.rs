//! Error types for imgbench
//!
//! This module defines the error hierarchy for a benchmark run:
//! - Enumeration errors (fatal: the input root cannot be walked)
//! - Transform errors (per item: logged, counted, processing continues)
//! - Worker errors (fatal to the run: crash, panic, or timeout)
//! - Partition errors (broken coverage invariant, always a defect)
//! - Configuration and CLI errors
//!
//! Item-level errors never leave the worker that hit them. Everything else
//! reaches the caller as a `BenchError`, never as an empty `RunResult`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for a benchmark run
#[derive(Error, Debug)]
pub enum BenchError {
    /// Input discovery failed
    #[error("Enumeration error: {0}")]
    Enumeration(#[from] EnumerationError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Partition coverage invariant violated
    #[error("Partition invariant violated: {0}")]
    Partition(#[from] PartitionError),

    /// Interrupted by signal
    #[error("Run interrupted by signal")]
    Interrupted,
}

impl BenchError {
    /// Returns true if the run failed because workers did not all report in time
    pub fn is_timeout(&self) -> bool {
        matches!(self, BenchError::Worker(WorkerError::Timeout { .. }))
    }
}

/// Input discovery errors
#[derive(Error, Debug, Clone)]
pub enum EnumerationError {
    /// Root directory does not exist
    #[error("Input root not found: '{path}'")]
    NotFound { path: PathBuf },

    /// Root exists but is not a directory
    #[error("Input root '{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    /// Root could not be listed
    #[error("Failed to read input root '{path}': {reason}")]
    RootUnreadable { path: PathBuf, reason: String },
}

/// Errors from transforming a single work item
#[derive(Error, Debug, Clone)]
pub enum TransformError {
    /// Input could not be opened or decoded
    #[error("Failed to decode '{path}': {reason}")]
    Decode { path: PathBuf, reason: String },

    /// Output directory could not be created
    #[error("Failed to create output directory '{path}': {reason}")]
    CreateDir { path: PathBuf, reason: String },

    /// Output could not be encoded or written
    #[error("Failed to write '{path}': {reason}")]
    Encode { path: PathBuf, reason: String },
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Baseline must be a positive number of seconds
    #[error("Invalid baseline {value}: must be a positive number of seconds")]
    InvalidBaseline { value: f64 },

    /// Timeout out of range
    #[error("Invalid timeout {value}s: must be between 1 and {max} seconds")]
    InvalidTimeout { value: u64, max: u64 },

    /// Output size could not be parsed
    #[error("Invalid size '{value}': {reason}")]
    InvalidSize { value: String, reason: String },

    /// Output path error
    #[error("Invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Worker thread could not be started
    #[error("Failed to initialize worker {id}: {reason}")]
    InitFailed { id: usize, reason: String },

    /// Worker terminated without emitting its report
    #[error("Worker {id} exited without reporting")]
    Crashed { id: usize },

    /// Not every launched worker reported before the deadline
    #[error("Incomplete worker set: {received} of {expected} workers reported within {timeout:?}")]
    Timeout {
        expected: usize,
        received: usize,
        timeout: Duration,
    },
}

/// Partition coverage errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartitionError {
    /// A plan needs at least one worker
    #[error("Cannot plan a run with zero workers")]
    NoWorkers,

    /// An item was assigned more than once
    #[error("Item '{path}' assigned more than once")]
    Duplicate { path: PathBuf },

    /// An item was not assigned to any partition
    #[error("Item '{path}' not assigned to any partition")]
    Missing { path: PathBuf },

    /// An item outside the input set was assigned
    #[error("Item '{path}' is not part of the input set")]
    Unknown { path: PathBuf },

    /// Workers processed a different number of items than were planned
    #[error("Expected {expected} items to be processed, workers reported {actual}")]
    CountMismatch { expected: u64, actual: u64 },
}

/// Result type alias for BenchError
pub type Result<T> = std::result::Result<T, BenchError>;

/// Result type alias for a single transform
pub type TransformResult<T> = std::result::Result<T, TransformError>;

/// Represents the outcome of transforming a single item
#[derive(Debug)]
pub enum ItemOutcome {
    /// Output written
    Success { path: PathBuf },

    /// Transform failed; the item still counts as attempted
    Failed { path: PathBuf, error: TransformError },
}
