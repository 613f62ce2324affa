//! imgbench - Parallel Image Pipeline Benchmark
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use imgbench::config::{BenchConfig, CliArgs};
use imgbench::harness::{BenchSession, Coordinator};
use imgbench::progress::{print_header, ProgressReporter};
use imgbench::report;
use imgbench::transform::ImageTransform;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    if args.mode == imgbench::Mode::Sequential && !args.workers.is_empty() {
        warn!("Worker counts are ignored in sequential mode");
    }

    let config = BenchConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(
            &config.input_root,
            &config.mode.to_string(),
            &config.worker_counts,
            &config.output_root,
        );
    }

    let transform = ImageTransform::new(config.transform.clone(), &config.output_root);
    let progress = config.show_progress.then(|| Arc::new(ProgressReporter::new()));

    let mut coordinator = Coordinator::new(&config.input_root, Arc::new(transform), config.timeout);
    if let Some(p) = &progress {
        p.set_status("Discovering input images...");
        let p = Arc::clone(p);
        coordinator = coordinator.with_progress(move |update| p.update(update));
    }

    // Setup signal handler for graceful shutdown
    let shutdown_flag = coordinator.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, stopping workers...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let session = BenchSession::from_config(&config, coordinator);
    let outcome = session.run();

    if let Some(p) = &progress {
        match &outcome {
            Ok(_) => p.finish("Benchmark completed"),
            Err(_) => p.finish("Benchmark failed"),
        }
    }

    if let Err(e) = &outcome {
        if e.is_timeout() {
            warn!(
                timeout_secs = config.timeout.as_secs(),
                "Workers did not all report in time; raise --timeout for larger datasets"
            );
        }
    }

    let bench = outcome.context("Benchmark failed")?;

    if config.json {
        let json = report::to_json(&bench).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        report::print_report(&bench);
    }

    let failed = bench.failed_count();
    if failed > 0 {
        info!(failed = failed, "Benchmark completed with item failures");
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("imgbench=debug,warn")
    } else {
        EnvFilter::new("imgbench=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
