//! Integration tests for imgbench
//!
//! Fixtures are small PNGs generated into temporary directories, so these
//! tests run without a prepared dataset.

use clap::Parser;
use imgbench::config::{BenchConfig, CliArgs, Mode, TransformConfig};
use imgbench::discovery::{self, WorkItem};
use imgbench::error::{BenchError, EnumerationError, TransformError, TransformResult, WorkerError};
use imgbench::harness::{BaselineSource, BenchSession, Coordinator, Strategy};
use imgbench::transform::{ImageTransform, Transform};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn write_png(path: &Path, shade: u8) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_pixel(40, 30, Rgb([shade, shade / 2, 200]))
        .save(path)
        .unwrap();
}

fn dataset(root: &Path, count: usize) {
    for i in 0..count {
        write_png(&root.join(format!("img_{:02}.png", i)), (i * 20) as u8);
    }
}

fn noop() -> Arc<dyn Transform> {
    Arc::new(|_: &WorkItem| -> TransformResult<()> { Ok(()) })
}

#[test]
fn test_static_split_end_to_end() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    dataset(input.path(), 10);

    let transform = ImageTransform::new(TransformConfig::default(), output.path());
    let coordinator = Coordinator::new(input.path(), Arc::new(transform), Duration::from_secs(60));

    let result = coordinator.run(Strategy::StaticSplit(2), Some(2.86)).unwrap();

    let ids: Vec<_> = result.reports.iter().map(|r| r.worker_id).collect();
    let counts: Vec<_> = result.reports.iter().map(|r| r.processed_count).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(counts, vec![5, 5]);
    assert_eq!(result.failed_count(), 0);
    assert_eq!(result.worker_count, 2);

    for i in 0..10 {
        let out = output.path().join(format!("img_{:02}.png", i));
        let img = image::ImageReader::open(&out)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!((img.width(), img.height()), (128, 128));
    }
}

#[test]
fn test_failed_item_counted_and_run_succeeds() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_png(&input.path().join("good.png"), 90);
    fs::write(input.path().join("broken.jpg"), b"not a jpeg").unwrap();

    let transform = ImageTransform::new(TransformConfig::default(), output.path());
    let coordinator = Coordinator::new(input.path(), Arc::new(transform), Duration::from_secs(60));

    let result = coordinator.run(Strategy::Sequential, None).unwrap();

    assert_eq!(result.processed_count(), 2);
    assert_eq!(result.failed_count(), 1);
    assert_eq!(result.reports.len(), 1);
    assert!((result.speedup - 1.0).abs() < 1e-9);
    assert!(output.path().join("good.png").exists());
    assert!(!output.path().join("broken.jpg").exists());
}

#[test]
fn test_single_failing_item_sequential() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    fs::write(input.path().join("only.jpg"), b"not a jpeg").unwrap();

    let transform = ImageTransform::new(TransformConfig::default(), output.path());
    let coordinator = Coordinator::new(input.path(), Arc::new(transform), Duration::from_secs(60));

    let result = coordinator.run(Strategy::Sequential, None).unwrap();

    assert_eq!(result.reports.len(), 1);
    assert_eq!(result.reports[0].worker_id, 1);
    assert_eq!(result.reports[0].processed_count, 1);
    assert_eq!(result.reports[0].failed_count, 1);
    assert_eq!(result.processed_count(), 1);
}

#[test]
fn test_transform_error_names_input() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let bad = input.path().join("bad.png");
    fs::write(&bad, b"garbage").unwrap();

    let transform = ImageTransform::new(TransformConfig::default(), output.path());
    let err = transform
        .apply(&WorkItem::new(&bad, "bad.png"))
        .unwrap_err();

    match err {
        TransformError::Decode { path, .. } => assert_eq!(path, bad),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn test_slow_worker_times_out() {
    let input = tempdir().unwrap();
    dataset(input.path(), 4);

    let slow: Arc<dyn Transform> = Arc::new(|_: &WorkItem| -> TransformResult<()> {
        thread::sleep(Duration::from_secs(2));
        Ok(())
    });
    let coordinator = Coordinator::new(input.path(), slow, Duration::from_millis(300));

    let err = coordinator.run(Strategy::StaticSplit(2), Some(1.0)).unwrap_err();
    match err {
        BenchError::Worker(WorkerError::Timeout { expected, received, .. }) => {
            assert_eq!(expected, 2);
            assert_eq!(received, 0);
        }
        other => panic!("expected timeout, got {other:?}"),
    }

    // Workers were told to stop; later runs refuse to start
    assert!(coordinator.shutdown_flag().load(Ordering::SeqCst));
    assert!(matches!(
        coordinator.run(Strategy::Sequential, None),
        Err(BenchError::Interrupted)
    ));
}

#[test]
fn test_crashed_worker_fails_run() {
    let input = tempdir().unwrap();
    dataset(input.path(), 6);

    let transform: Arc<dyn Transform> = Arc::new(|item: &WorkItem| -> TransformResult<()> {
        if item.relative_path() == Path::new("img_00.png") {
            panic!("decoder blew up");
        }
        Ok(())
    });
    let coordinator = Coordinator::new(input.path(), transform, Duration::from_secs(30));

    let start = Instant::now();
    let outcome = coordinator.run(Strategy::StaticSplit(2), Some(1.0));
    assert!(start.elapsed() < Duration::from_secs(10));

    match outcome {
        Err(BenchError::Worker(WorkerError::Crashed { id })) => assert_eq!(id, 1),
        other => panic!("expected crashed worker, got {other:?}"),
    }
    assert!(coordinator.shutdown_flag().load(Ordering::SeqCst));
}

#[test]
fn test_reports_ordered_regardless_of_arrival() {
    let input = tempdir().unwrap();
    dataset(input.path(), 6);

    // The first partition holds img_00..img_02; make those slow so worker 1 reports last
    let transform: Arc<dyn Transform> = Arc::new(|item: &WorkItem| -> TransformResult<()> {
        let name = item.relative_path().to_string_lossy().into_owned();
        if name.as_str() < "img_03.png" {
            thread::sleep(Duration::from_millis(60));
        }
        Ok(())
    });
    let coordinator = Coordinator::new(input.path(), transform, Duration::from_secs(30));

    let result = coordinator.run(Strategy::StaticSplit(2), Some(1.0)).unwrap();
    let ids: Vec<_> = result.reports.iter().map(|r| r.worker_id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(result.reports[0].elapsed_seconds > result.reports[1].elapsed_seconds);
}

#[test]
fn test_pooled_queue_processes_each_item_once() {
    let input = tempdir().unwrap();
    dataset(input.path(), 12);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let calls = Arc::new(AtomicUsize::new(0));
    let transform: Arc<dyn Transform> = {
        let seen = Arc::clone(&seen);
        let calls = Arc::clone(&calls);
        Arc::new(move |item: &WorkItem| -> TransformResult<()> {
            calls.fetch_add(1, Ordering::SeqCst);
            seen.lock().unwrap().push(item.path().to_path_buf());
            Ok(())
        })
    };
    let coordinator = Coordinator::new(input.path(), transform, Duration::from_secs(30));

    let result = coordinator.run(Strategy::PooledQueue(4), Some(1.0)).unwrap();

    assert_eq!(result.reports.len(), 4);
    assert_eq!(result.processed_count(), 12);
    assert_eq!(calls.load(Ordering::SeqCst), 12);

    let mut seen = seen.lock().unwrap().clone();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 12);
}

#[test]
fn test_empty_input_still_reports() {
    let input = tempdir().unwrap();
    let coordinator = Coordinator::new(input.path(), noop(), Duration::from_secs(10));

    let result = coordinator.run(Strategy::StaticSplit(3), Some(1.0)).unwrap();
    assert_eq!(result.reports.len(), 3);
    assert_eq!(result.processed_count(), 0);
}

#[test]
fn test_enumeration_is_repeatable() {
    let input = tempdir().unwrap();
    dataset(input.path(), 3);
    write_png(&input.path().join("nested/deep/x.png"), 10);
    fs::write(input.path().join("notes.txt"), b"skip me").unwrap();

    let first = discovery::enumerate(input.path()).unwrap();
    let second = discovery::enumerate(input.path()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
    assert_eq!(first[3].relative_path(), Path::new("nested/deep/x.png"));
}

#[test]
fn test_missing_root_fails_before_launch() {
    let input = tempdir().unwrap();
    let missing = input.path().join("nope");
    let calls = Arc::new(AtomicUsize::new(0));
    let transform: Arc<dyn Transform> = {
        let calls = Arc::clone(&calls);
        Arc::new(move |_: &WorkItem| -> TransformResult<()> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    };
    let coordinator = Coordinator::new(&missing, transform, Duration::from_secs(10));

    let err = coordinator.run(Strategy::PooledQueue(2), None).unwrap_err();
    assert!(matches!(
        err,
        BenchError::Enumeration(EnumerationError::NotFound { .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_session_measures_baseline() {
    let input = tempdir().unwrap();
    dataset(input.path(), 8);

    let transform: Arc<dyn Transform> = Arc::new(|_: &WorkItem| -> TransformResult<()> {
        thread::sleep(Duration::from_millis(5));
        Ok(())
    });
    let coordinator = Coordinator::new(input.path(), transform, Duration::from_secs(30));
    let session = BenchSession::new(
        Mode::Pool,
        vec![Strategy::PooledQueue(1), Strategy::PooledQueue(2)],
        None,
        coordinator,
    );

    let report = session.run().unwrap();

    assert_eq!(report.item_count, 8);
    assert_eq!(report.baseline_source, BaselineSource::Measured);
    let baseline_run = report.baseline_run.as_ref().unwrap();
    assert_eq!(baseline_run.strategy, Strategy::Sequential);
    assert!((report.baseline_seconds - baseline_run.wall_time_seconds).abs() < 1e-12);

    assert_eq!(report.runs.len(), 2);
    for run in &report.runs {
        assert_eq!(run.processed_count(), 8);
        assert_eq!(run.baseline_seconds, report.baseline_seconds);
    }
}

#[test]
fn test_session_with_supplied_baseline() {
    let input = tempdir().unwrap();
    dataset(input.path(), 4);

    let coordinator = Coordinator::new(input.path(), noop(), Duration::from_secs(10));
    let session = BenchSession::new(
        Mode::Distributed,
        vec![Strategy::StaticSplit(2)],
        Some(2.86),
        coordinator,
    );

    let report = session.run().unwrap();
    assert_eq!(report.baseline_source, BaselineSource::Supplied);
    assert!(report.baseline_run.is_none());
    assert_eq!(report.runs[0].baseline_seconds, 2.86);
}

#[test]
fn test_cli_to_strategies() {
    let args = CliArgs::try_parse_from([
        "imgbench",
        "photos",
        "--mode",
        "distributed",
        "-w",
        "2,4",
        "--baseline",
        "2.86",
        "--json",
    ])
    .unwrap();
    let config = BenchConfig::from_args(args).unwrap();

    assert_eq!(config.input_root, Path::new("photos"));
    assert_eq!(config.baseline_seconds, Some(2.86));
    assert!(!config.show_progress);
    assert_eq!(
        config.strategies(),
        vec![Strategy::StaticSplit(2), Strategy::StaticSplit(4)]
    );
}
