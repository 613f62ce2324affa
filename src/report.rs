//! Result rendering
//!
//! Pure formatting of a [`BenchReport`]: per-node lines for the simulated
//! distributed mode, the speedup table, and an overall summary. Nothing here
//! touches the filesystem.

use crate::config::Mode;
use crate::harness::{BaselineSource, BenchReport, RunResult};
use crate::progress::format_number;
use console::style;
use humansize::{format_size, BINARY};

const TABLE_WIDTH: usize = 46;

/// Render the speedup table, one row per run
pub fn format_speedup_table(runs: &[RunResult]) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:<8} | {:<10} | {:<8} | {}\n",
        "Workers", "Time (s)", "Speedup", "Efficiency"
    ));
    out.push_str(&"-".repeat(TABLE_WIDTH));
    out.push('\n');

    for run in runs {
        out.push_str(&format!(
            "{:<8} | {:<10.2} | {:<8} | {:.2}\n",
            run.worker_count,
            run.wall_time_seconds,
            format!("{:.2}x", run.speedup),
            run.efficiency
        ));
    }

    out
}

/// Render per-node lines followed by the run's totals
pub fn format_node_summary(run: &RunResult) -> String {
    let mut out = format!(
        "--- Distributed Processing Summary ({} nodes) ---\n",
        run.worker_count
    );

    for report in &run.reports {
        out.push_str(&format!(
            "Node {} processed {} images in {:.1}s\n",
            report.worker_id,
            format_number(report.processed_count),
            report.elapsed_seconds
        ));
    }
    out.push_str(&format!("Total distributed time: {:.1}s\n", run.wall_time_seconds));
    out.push_str(&format!("Speedup: {:.2}x over sequential\n", run.speedup));
    out.push_str(&format!("Efficiency: {:.2}\n", run.efficiency));

    out
}

/// Render the single-worker summary
pub fn format_sequential_summary(run: &RunResult) -> String {
    format!(
        "Processed {} images.\nSequential Processing Time: {:.2} seconds\n",
        format_number(run.processed_count()),
        run.wall_time_seconds
    )
}

/// Render the input size, baseline, fastest configuration and failure count
pub fn format_overall_summary(report: &BenchReport) -> String {
    let mut out = format!(
        "Images: {} ({})\n",
        format_number(report.item_count as u64),
        format_size(report.input_bytes, BINARY)
    );

    let source = match report.baseline_source {
        BaselineSource::Supplied => "supplied",
        BaselineSource::Measured => "measured sequentially",
        BaselineSource::SelfReferenced => "this run",
    };
    out.push_str(&format!(
        "Baseline: {:.2}s ({})\n",
        report.baseline_seconds, source
    ));

    if let Some(fastest) = report.fastest_run() {
        out.push_str(&format!(
            "Fastest: {} worker{} in {:.2}s ({:.2}x)\n",
            fastest.worker_count,
            if fastest.worker_count == 1 { "" } else { "s" },
            fastest.wall_time_seconds,
            fastest.speedup
        ));
    }

    let failed = report.failed_count();
    if failed > 0 {
        out.push_str(&format!("Failed items: {}\n", format_number(failed)));
    }

    out
}

/// Render the full text report for the session's mode
pub fn format_report(report: &BenchReport) -> String {
    let mut out = String::new();

    match report.mode {
        Mode::Sequential => {
            for run in &report.runs {
                out.push_str(&format_sequential_summary(run));
            }
            out.push('\n');
            out.push_str(&format_speedup_table(&report.runs));
        }
        Mode::Distributed => {
            for run in &report.runs {
                out.push_str(&format_node_summary(run));
                out.push('\n');
            }
            out.push_str(&format_speedup_table(&report.runs));
        }
        Mode::Pool => {
            out.push_str("--- Final Speedup Table ---\n");
            out.push_str(&format_speedup_table(&report.runs));
        }
    }

    out.push('\n');
    out.push_str(&format_overall_summary(report));
    out
}

/// Serialize the report as pretty JSON
pub fn to_json(report: &BenchReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Print the report to stdout
pub fn print_report(report: &BenchReport) {
    println!();
    println!("{}", style("Benchmark Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    print!("{}", format_report(report));
    println!();
}
