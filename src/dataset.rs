//! Dataset aggregation: artifacts in, one CSV out.
//!
//! The CSV is rewritten from scratch on every aggregation pass so it always
//! reflects exactly the current artifact set. Artifacts are processed in
//! sorted file-name order, making re-aggregation byte-identical for an
//! unchanged artifact set.

use crate::{extract, HarnessError, HarnessResult, MetricRecord, NOT_AVAILABLE};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Dataset column order. Must match [`MetricRecord::to_row`].
pub const CSV_HEADER: [&str; 9] = [
    "inputFileSize",
    "function",
    "pixelCount",
    "parsingTimeSingleThread",
    "parsingTimeMultipleThreads",
    "parsingSpeedupFactor",
    "timeTakenFunctionExecutionSingleThread",
    "timeTakenFunctionExecutionMultipleThreads",
    "functionExecutionSpeedupFactor",
];

/// The full tabular collection of metric records for one analysis pass.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<MetricRecord>,
}

/// Extract metrics from every `.txt` artifact under `artifact_dir` and
/// rewrite the dataset CSV at `csv_path`.
///
/// An unreadable artifact is fatal and names the offending path; silently
/// dropping rows would leave the dataset quietly incomplete. Extraction
/// gaps inside a readable artifact are non-fatal `N/A` fields.
pub fn aggregate(artifact_dir: &Path, csv_path: &Path) -> HarnessResult<Dataset> {
    let mut paths: Vec<PathBuf> = fs::read_dir(artifact_dir)
        .map_err(|e| HarnessError::io(artifact_dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map(|ext| ext == "txt").unwrap_or(false))
        .collect();
    paths.sort();

    if csv_path.exists() {
        fs::remove_file(csv_path).map_err(|e| HarnessError::io(csv_path, e))?;
    }

    let mut writer = csv::Writer::from_path(csv_path)?;
    writer.write_record(CSV_HEADER)?;

    let mut records = Vec::with_capacity(paths.len());
    for path in &paths {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        let record = extract::extract(&text);
        writer.write_record(&record.to_row())?;
        records.push(record);
    }
    writer.flush().map_err(|e| HarnessError::io(csv_path, e))?;

    Ok(Dataset { records })
}

/// Reload a previously aggregated dataset, so modeling can run without
/// re-invoking or re-extracting anything.
pub fn load(csv_path: &Path) -> HarnessResult<Dataset> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(MetricRecord {
            input_file_size: field_str(&row, 0),
            function: field_str(&row, 1),
            pixel_count: field_parse(&row, 2),
            parsing_time_single: field_parse(&row, 3),
            parsing_time_multi: field_parse(&row, 4),
            parsing_speedup: field_parse(&row, 5),
            exec_time_single: field_parse(&row, 6),
            exec_time_multi: field_parse(&row, 7),
            exec_speedup: field_parse(&row, 8),
        });
    }
    Ok(Dataset { records })
}

fn field_str(row: &csv::StringRecord, idx: usize) -> Option<String> {
    row.get(idx)
        .filter(|s| *s != NOT_AVAILABLE && !s.is_empty())
        .map(|s| s.to_string())
}

fn field_parse<T: FromStr>(row: &csv::StringRecord, idx: usize) -> Option<T> {
    row.get(idx)
        .filter(|s| *s != NOT_AVAILABLE)
        .and_then(|s| s.parse().ok())
}
