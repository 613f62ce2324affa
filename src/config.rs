//! Configuration types for imgbench
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - The immutable transform configuration handed to [`ImageTransform`]
//!
//! [`ImageTransform`]: crate::transform::ImageTransform

use crate::error::ConfigError;
use crate::harness::Strategy;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Longest accepted --timeout (one week)
const MAX_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// Workers used when distributed mode is not given explicit counts
const DEFAULT_NODE_COUNT: usize = 2;

/// Smallest largest-count tried by the default pool sweep
const MIN_POOL_SWEEP: usize = 8;

/// Benchmark an image resize/watermark pipeline under different execution strategies
#[derive(Parser, Debug, Clone)]
#[command(
    name = "imgbench",
    version,
    about = "Benchmark an image resize/watermark pipeline under different execution strategies",
    long_about = "Resizes every image under INPUT_DIR, stamps a semi-transparent text watermark \
                  and re-encodes it under the output directory, timing the whole batch.\n\n\
                  Modes:\n  \
                  sequential   one worker, the reference timing\n  \
                  pool         N workers pulling from a shared queue, for each N in --workers\n  \
                  distributed  N simulated nodes, each given a fixed contiguous share",
    after_help = "EXAMPLES:\n    \
        imgbench dataset --mode sequential\n    \
        imgbench dataset --mode pool -w 1,2,4,8 --baseline 2.86\n    \
        imgbench dataset --mode distributed -w 2 -o output_distributed\n    \
        imgbench dataset --json > results.json"
)]
pub struct CliArgs {
    /// Directory containing input images (searched recursively)
    #[arg(value_name = "INPUT_DIR", default_value = "dataset")]
    pub input: PathBuf,

    /// Output directory (input subdirectories are mirrored here)
    #[arg(short, long, default_value = "output", value_name = "DIR")]
    pub output: PathBuf,

    /// Execution strategy
    #[arg(short, long, value_enum, default_value_t = Mode::Pool)]
    pub mode: Mode,

    /// Worker counts to test, comma separated
    #[arg(short = 'w', long, value_delimiter = ',', value_name = "N[,N...]")]
    pub workers: Vec<usize>,

    /// Sequential reference time in seconds (measured first if omitted)
    #[arg(long, value_name = "SECS")]
    pub baseline: Option<f64>,

    /// Fail the run if any worker has not reported after this many seconds
    #[arg(long, default_value = "600", value_name = "SECS")]
    pub timeout: u64,

    /// Output image size
    #[arg(long, default_value = "128x128", value_name = "WxH")]
    pub size: String,

    /// Watermark text
    #[arg(long, default_value = "PDC Exam", value_name = "TEXT")]
    pub watermark: String,

    /// Output encoding
    #[arg(long, value_enum, default_value_t = EncodeFormat::Jpeg)]
    pub format: EncodeFormat,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    pub json: bool,

    /// Quiet mode - suppress header and progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (per-item failures and worker lifecycle)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Execution strategy selected on the command line
#[derive(ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Single worker over all items
    Sequential,
    /// Workers pulling from one shared queue
    Pool,
    /// Simulated nodes with a static contiguous split
    Distributed,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Sequential => "sequential",
            Mode::Pool => "pool",
            Mode::Distributed => "distributed",
        };
        f.write_str(name)
    }
}

/// Encoding used for transformed images
#[derive(ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EncodeFormat {
    Jpeg,
    Png,
}

impl EncodeFormat {
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            EncodeFormat::Jpeg => image::ImageFormat::Jpeg,
            EncodeFormat::Png => image::ImageFormat::Png,
        }
    }
}

/// Immutable description of the per-item transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformConfig {
    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Watermark text
    pub watermark_text: String,

    /// Watermark origin measured back from the bottom-right corner
    pub watermark_offset: (u32, u32),

    /// Watermark RGBA colour
    pub watermark_color: [u8; 4],

    /// Output encoding
    pub format: EncodeFormat,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            watermark_text: "PDC Exam".to_string(),
            watermark_offset: (70, 15),
            watermark_color: [255, 255, 255, 128],
            format: EncodeFormat::Jpeg,
        }
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Root directory searched for input images
    pub input_root: PathBuf,

    /// Root directory for transformed images
    pub output_root: PathBuf,

    /// Execution strategy family
    pub mode: Mode,

    /// Worker counts to run, in order
    pub worker_counts: Vec<usize>,

    /// Caller-supplied sequential baseline in seconds
    pub baseline_seconds: Option<f64>,

    /// Deadline for collecting every worker report
    pub timeout: Duration,

    /// Per-item transform settings
    pub transform: TransformConfig,

    /// Show header and progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,

    /// Emit JSON instead of text tables
    pub json: bool,
}

impl BenchConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let worker_counts = match args.mode {
            Mode::Sequential => vec![1],
            Mode::Pool if args.workers.is_empty() => default_pool_counts(),
            Mode::Distributed if args.workers.is_empty() => vec![DEFAULT_NODE_COUNT],
            _ => args.workers.clone(),
        };

        if let Some(&count) = worker_counts
            .iter()
            .find(|&&c| c == 0 || c > MAX_WORKERS)
        {
            return Err(ConfigError::InvalidWorkerCount {
                count,
                max: MAX_WORKERS,
            });
        }

        if let Some(baseline) = args.baseline {
            if !baseline.is_finite() || baseline <= 0.0 {
                return Err(ConfigError::InvalidBaseline { value: baseline });
            }
        }

        if args.timeout == 0 || args.timeout > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidTimeout {
                value: args.timeout,
                max: MAX_TIMEOUT_SECS,
            });
        }

        let (width, height) = parse_size(&args.size)?;

        if args.output.exists() && !args.output.is_dir() {
            return Err(ConfigError::InvalidOutputPath {
                path: args.output.clone(),
                reason: "exists and is not a directory".to_string(),
            });
        }

        let transform = TransformConfig {
            width,
            height,
            watermark_text: args.watermark,
            format: args.format,
            ..TransformConfig::default()
        };

        Ok(Self {
            input_root: args.input,
            output_root: args.output,
            mode: args.mode,
            worker_counts,
            baseline_seconds: args.baseline,
            timeout: Duration::from_secs(args.timeout),
            transform,
            show_progress: !args.quiet && !args.json,
            verbose: args.verbose,
            json: args.json,
        })
    }

    /// Strategies to run, one per configured worker count
    pub fn strategies(&self) -> Vec<Strategy> {
        match self.mode {
            Mode::Sequential => vec![Strategy::Sequential],
            Mode::Pool => self
                .worker_counts
                .iter()
                .map(|&n| Strategy::PooledQueue(n))
                .collect(),
            Mode::Distributed => self
                .worker_counts
                .iter()
                .map(|&n| Strategy::StaticSplit(n))
                .collect(),
        }
    }
}

/// Powers of two up to the CPU count, sweeping at least to 8
fn default_pool_counts() -> Vec<usize> {
    let limit = num_cpus::get().max(MIN_POOL_SWEEP);
    std::iter::successors(Some(1usize), |n| n.checked_mul(2))
        .take_while(|&n| n <= limit)
        .collect()
}

/// Parse a `WIDTHxHEIGHT` size
pub fn parse_size(value: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidSize {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| invalid("expected WIDTHxHEIGHT"))?;

    let width: u32 = w.trim().parse().map_err(|_| invalid("width is not a number"))?;
    let height: u32 = h.trim().parse().map_err(|_| invalid("height is not a number"))?;

    if width == 0 || height == 0 {
        return Err(invalid("dimensions must be non-zero"));
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["imgbench", "dataset"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("128x128").unwrap(), (128, 128));
        assert_eq!(parse_size("640X480").unwrap(), (640, 480));
        assert!(parse_size("128").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("ax10").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = BenchConfig::from_args(args(&[])).unwrap();
        assert_eq!(config.mode, Mode::Pool);
        assert_eq!(config.worker_counts[..4], [1, 2, 4, 8]);
        assert_eq!(config.transform, TransformConfig::default());
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert!(config.baseline_seconds.is_none());
    }

    #[test]
    fn test_distributed_worker_list() {
        let config = BenchConfig::from_args(args(&["-m", "distributed", "-w", "2,3"])).unwrap();
        assert_eq!(
            config.strategies(),
            vec![Strategy::StaticSplit(2), Strategy::StaticSplit(3)]
        );

        let config = BenchConfig::from_args(args(&["-m", "distributed"])).unwrap();
        assert_eq!(config.strategies(), vec![Strategy::StaticSplit(2)]);
    }

    #[test]
    fn test_sequential_ignores_workers() {
        let config = BenchConfig::from_args(args(&["-m", "sequential", "-w", "4"])).unwrap();
        assert_eq!(config.strategies(), vec![Strategy::Sequential]);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            BenchConfig::from_args(args(&["-w", "0"])),
            Err(ConfigError::InvalidWorkerCount { count: 0, .. })
        ));
        assert!(matches!(
            BenchConfig::from_args(args(&["--baseline", "0"])),
            Err(ConfigError::InvalidBaseline { .. })
        ));
        assert!(matches!(
            BenchConfig::from_args(args(&["--timeout", "0"])),
            Err(ConfigError::InvalidTimeout { value: 0, .. })
        ));
        assert!(matches!(
            BenchConfig::from_args(args(&["--timeout", "18446744073709551615"])),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        let config = BenchConfig::from_args(args(&["--timeout", "604800"])).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(604_800));
        assert!(matches!(
            BenchConfig::from_args(args(&["--size", "12"])),
            Err(ConfigError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_json_disables_progress() {
        let config = BenchConfig::from_args(args(&["--json"])).unwrap();
        assert!(config.json);
        assert!(!config.show_progress);
    }
}
