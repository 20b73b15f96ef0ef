//! End-to-end pipeline test against a stub image-processor.
//!
//! The stub is a shell script that emits the same transcript shape as the
//! real executable, with pixel counts and timings derived from the
//! inputImageSize argument, so the full sweep → extract → model chain can
//! run hermetically.

#![cfg(unix)]

use imgproc_bench::invoker::{self, InvokerConfig};
use imgproc_bench::{dataset, model, Function, ImageSize, SweepParams};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const STUB: &str = r#"#!/bin/sh
for a in "$@"; do
    case "$a" in
        inputImageSize=*) size=${a#inputImageSize=} ;;
        function=*) fn=${a#function=} ;;
    esac
done
case "$size" in
    small)  px=10000 ;;
    medium) px=40000 ;;
    large)  px=160000 ;;
esac
parse1=$((px / 100))
parsen=$((parse1 / 3))
exec1=$((px / 50))
execn=$((exec1 / 3))
echo "Parsing input image using a single thread..."
echo "Time taken for parsing input image using a single thread (${px}px): $parse1"
echo "Parsing input image using multiple threads..."
echo "Time taken for parsing input image using multiple threads (${px}px): $parsen"
echo "Multithreading speedup factor: 3.00x"
echo "Applying $fn..."
echo "Time taken for applying $fn using a single thread: $exec1"
echo "Time taken for applying $fn using multiple threads: $execn"
echo "Multithreading speedup factor: 2.97x"
"#;

fn write_stub(dir: &Path) -> PathBuf {
    let path = dir.join("image-processor");
    fs::write(&path, STUB).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn sweep_extract_model_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let config = InvokerConfig {
        executable: write_stub(tmp.path()),
        out_dir: tmp.path().join("runs"),
        timeout: None,
        params: SweepParams::default(),
    };

    // Sweep: every combination succeeds and leaves an artifact.
    let summary = invoker::run_sweep(&config).unwrap();
    assert!(summary.failed.is_empty());
    assert_eq!(
        summary.completed.len(),
        Function::ALL.len() * ImageSize::ALL.len()
    );
    let artifact_count = fs::read_dir(&config.out_dir).unwrap().count();
    assert_eq!(artifact_count, 21);

    // Extract: header plus one row per artifact.
    let csv_path = tmp.path().join("runData.csv");
    let ds = dataset::aggregate(&config.out_dir, &csv_path).unwrap();
    assert_eq!(ds.records.len(), 21);
    let text = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(text.lines().count(), 22);

    // Spot-check the small/gaussianBlur record against the stub's numbers.
    let rec = ds
        .records
        .iter()
        .find(|r| {
            r.function.as_deref() == Some("gaussianBlur")
                && r.input_file_size.as_deref() == Some("small")
        })
        .unwrap();
    assert_eq!(rec.pixel_count, Some(10_000));
    assert_eq!(rec.parsing_time_single, Some(100));
    assert_eq!(rec.parsing_time_multi, Some(33));
    assert_eq!(rec.parsing_speedup, Some(3.00));
    assert_eq!(rec.exec_time_single, Some(200));
    assert_eq!(rec.exec_time_multi, Some(66));
    assert_eq!(rec.exec_speedup, Some(2.97));

    // Model: 3 distinct pixel counts per function, both modes fitted.
    let models = model::model_dataset(&ds);
    assert_eq!(models.len(), Function::ALL.len());
    for function_model in &models {
        assert!(
            function_model.single.is_some() && function_model.multi.is_some(),
            "{} should have both curves",
            function_model.function
        );
        assert!(function_model.diagnostics.is_empty());
        // The stub's execution time is linear in px, so the fitted
        // quadratic term is (numerically) zero.
        let fit = function_model.single.unwrap();
        assert!(fit.c2.abs() < 1e-6);
    }
}

#[test]
fn reaggregation_of_an_unchanged_sweep_is_deterministic() {
    let tmp = tempfile::tempdir().unwrap();
    let config = InvokerConfig {
        executable: write_stub(tmp.path()),
        out_dir: tmp.path().join("runs"),
        timeout: None,
        params: SweepParams::default(),
    };
    invoker::run_sweep(&config).unwrap();

    let csv_path = tmp.path().join("runData.csv");
    dataset::aggregate(&config.out_dir, &csv_path).unwrap();
    let first = fs::read(&csv_path).unwrap();
    dataset::aggregate(&config.out_dir, &csv_path).unwrap();
    let second = fs::read(&csv_path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn rerunning_a_combination_overwrites_its_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let config = InvokerConfig {
        executable: write_stub(tmp.path()),
        out_dir: tmp.path().join("runs"),
        timeout: None,
        params: SweepParams::default(),
    };
    let spec = imgproc_bench::RunSpec {
        function: Function::BucketFill,
        image_size: ImageSize::Small,
        params: SweepParams::default(),
    };

    fs::create_dir_all(&config.out_dir).unwrap();
    let artifact = config.out_dir.join(spec.artifact_name());
    fs::write(&artifact, "stale artifact from an earlier sweep").unwrap();

    invoker::run_one(&config, &spec).unwrap();
    let text = fs::read_to_string(&artifact).unwrap();
    assert!(!text.contains("stale"));
    assert!(text.contains("Time taken for applying bucketFill"));
}
