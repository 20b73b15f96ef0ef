//! Shared types, the run matrix and error handling for imgproc-bench.
//!
//! The harness drives an external image-processor executable across a
//! functions × image-sizes grid, captures each run's transcript, scrapes
//! timing metrics out of the transcripts and fits per-function scaling
//! models. Each pipeline stage is re-runnable from the previous stage's
//! on-disk output.

pub mod dataset;
pub mod extract;
pub mod invoker;
pub mod model;
pub mod plot;
pub mod report;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ────────────────────────────────────────────────────────────────────────────────
// Error type
// ────────────────────────────────────────────────────────────────────────────────

pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

#[derive(Debug)]
pub enum HarnessError {
    /// Filesystem failure, with the offending path.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The external process could not be started or exited non-zero.
    Invocation { combination: String, detail: String },
    /// The external process outlived the configured timeout.
    Timeout { combination: String, secs: u64 },
    /// Dataset file read/write failure.
    Csv(csv::Error),
    /// Fewer than 3 distinct pixel counts for one function's curve.
    InsufficientData {
        function: String,
        distinct_points: usize,
    },
    /// Regression solver failure.
    Fit { function: String, detail: String },
    /// Plot rendering failure.
    Render { path: PathBuf, detail: String },
    Config(String),
}

impl std::fmt::Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarnessError::Io { path, source } => {
                write!(f, "IO error on {}: {}", path.display(), source)
            }
            HarnessError::Invocation {
                combination,
                detail,
            } => write!(f, "invocation failed for {}: {}", combination, detail),
            HarnessError::Timeout { combination, secs } => {
                write!(f, "execution timed out for {} after {}s", combination, secs)
            }
            HarnessError::Csv(e) => write!(f, "dataset error: {}", e),
            HarnessError::InsufficientData {
                function,
                distinct_points,
            } => write!(
                f,
                "not enough data for {}: {} distinct pixel counts, need 3",
                function, distinct_points
            ),
            HarnessError::Fit { function, detail } => {
                write!(f, "regression failed for {}: {}", function, detail)
            }
            HarnessError::Render { path, detail } => {
                write!(f, "plot rendering failed for {}: {}", path.display(), detail)
            }
            HarnessError::Config(s) => write!(f, "config error: {}", s),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::Io { source, .. } => Some(source),
            HarnessError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for HarnessError {
    fn from(e: csv::Error) -> Self {
        HarnessError::Csv(e)
    }
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Run matrix
// ────────────────────────────────────────────────────────────────────────────────

/// Transformations the external executable can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Function {
    GaussianBlur,
    BoxBlur,
    MotionBlur,
    BucketFill,
    BilinearResize,
    BicubicResize,
    NearestNeighborResize,
}

impl Function {
    pub const ALL: [Function; 7] = [
        Function::GaussianBlur,
        Function::BoxBlur,
        Function::MotionBlur,
        Function::BucketFill,
        Function::BilinearResize,
        Function::BicubicResize,
        Function::NearestNeighborResize,
    ];

    /// Name as passed to (and echoed by) the external tool.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Function::GaussianBlur => "gaussianBlur",
            Function::BoxBlur => "boxBlur",
            Function::MotionBlur => "motionBlur",
            Function::BucketFill => "bucketFill",
            Function::BilinearResize => "bilinearResize",
            Function::BicubicResize => "bicubicResize",
            Function::NearestNeighborResize => "nearestNeighborResize",
        }
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Input image size category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Small,
    Medium,
    Large,
}

impl ImageSize {
    pub const ALL: [ImageSize; 3] = [ImageSize::Small, ImageSize::Medium, ImageSize::Large];
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageSize::Small => write!(f, "small"),
            ImageSize::Medium => write!(f, "medium"),
            ImageSize::Large => write!(f, "large"),
        }
    }
}

/// Numeric parameters shared by every invocation. The external tool
/// ignores the ones irrelevant to the selected function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepParams {
    pub sigma: f64,
    pub box_size: u32,
    pub motion_length: u32,
    pub bucket_fill_threshold: u32,
    pub bucket_fill_x: u32,
    pub bucket_fill_y: u32,
    pub resize_width_bilinear: u32,
    pub resize_height_bilinear: u32,
    pub resize_width_bicubic: u32,
    pub resize_height_bicubic: u32,
    pub resize_width_nearest_neighbor: u32,
    pub resize_height_nearest_neighbor: u32,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            sigma: 3.0,
            box_size: 9,
            motion_length: 15,
            bucket_fill_threshold: 75,
            bucket_fill_x: 800,
            bucket_fill_y: 170,
            resize_width_bilinear: 500,
            resize_height_bilinear: 745,
            resize_width_bicubic: 500,
            resize_height_bicubic: 745,
            resize_width_nearest_neighbor: 500,
            resize_height_nearest_neighbor: 745,
        }
    }
}

/// One fully parameterized invocation request. Created at sweep-definition
/// time, never mutated.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub function: Function,
    pub image_size: ImageSize,
    pub params: SweepParams,
}

impl RunSpec {
    /// Artifact file name for this combination: `{size}_{function}.txt`.
    pub fn artifact_name(&self) -> String {
        format!("{}_{}.txt", self.image_size, self.function)
    }

    /// Human-readable combination label used in errors and diagnostics.
    pub fn label(&self) -> String {
        format!("{}/{}", self.image_size, self.function)
    }

    /// Full key=value argument list. Every parameter is always passed.
    pub fn args(&self) -> Vec<String> {
        let p = &self.params;
        vec![
            format!("sigma={}", p.sigma),
            format!("boxSize={}", p.box_size),
            format!("motionLength={}", p.motion_length),
            format!("bucketFillThreshold={}", p.bucket_fill_threshold),
            format!("bucketFillX={}", p.bucket_fill_x),
            format!("bucketFillY={}", p.bucket_fill_y),
            format!("resizeWidthBilinear={}", p.resize_width_bilinear),
            format!("resizeHeightBilinear={}", p.resize_height_bilinear),
            format!("resizeWidthBicubic={}", p.resize_width_bicubic),
            format!("resizeHeightBicubic={}", p.resize_height_bicubic),
            format!(
                "resizeWidthNearestNeighbor={}",
                p.resize_width_nearest_neighbor
            ),
            format!(
                "resizeHeightNearestNeighbor={}",
                p.resize_height_nearest_neighbor
            ),
            format!("inputImageSize={}", self.image_size),
            format!("function={}", self.function),
        ]
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Metric record
// ────────────────────────────────────────────────────────────────────────────────

/// Sentinel written to the dataset for any metric whose pattern was absent.
pub const NOT_AVAILABLE: &str = "N/A";

/// Structured numeric facts extracted from one artifact. `None` means the
/// corresponding pattern was not found; it always serializes as [`NOT_AVAILABLE`]
/// so the dataset stays rectangular.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricRecord {
    pub input_file_size: Option<String>,
    pub function: Option<String>,
    pub pixel_count: Option<u64>,
    pub parsing_time_single: Option<u64>,
    pub parsing_time_multi: Option<u64>,
    pub parsing_speedup: Option<f64>,
    pub exec_time_single: Option<u64>,
    pub exec_time_multi: Option<u64>,
    pub exec_speedup: Option<f64>,
}

impl MetricRecord {
    /// Row in dataset column order, with `N/A` for missing fields.
    pub fn to_row(&self) -> [String; 9] {
        [
            fmt_str(&self.input_file_size),
            fmt_str(&self.function),
            fmt_u64(self.pixel_count),
            fmt_u64(self.parsing_time_single),
            fmt_u64(self.parsing_time_multi),
            fmt_f64(self.parsing_speedup),
            fmt_u64(self.exec_time_single),
            fmt_u64(self.exec_time_multi),
            fmt_f64(self.exec_speedup),
        ]
    }
}

fn fmt_str(v: &Option<String>) -> String {
    v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn fmt_u64(v: Option<u64>) -> String {
    v.map(|x| x.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn fmt_f64(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}", x))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_the_matrix() {
        assert_eq!(Function::ALL.len(), 7);
        assert_eq!(Function::GaussianBlur.to_string(), "gaussianBlur");
        assert_eq!(Function::NearestNeighborResize.to_string(), "nearestNeighborResize");
        assert_eq!(ImageSize::Medium.to_string(), "medium");
    }

    #[test]
    fn artifact_names_match_combination() {
        let spec = RunSpec {
            function: Function::BoxBlur,
            image_size: ImageSize::Large,
            params: SweepParams::default(),
        };
        assert_eq!(spec.artifact_name(), "large_boxBlur.txt");
        assert_eq!(spec.label(), "large/boxBlur");
    }

    #[test]
    fn args_carry_every_parameter() {
        let spec = RunSpec {
            function: Function::BucketFill,
            image_size: ImageSize::Small,
            params: SweepParams::default(),
        };
        let args = spec.args();
        assert_eq!(args.len(), 14);
        assert!(args.contains(&"bucketFillThreshold=75".to_string()));
        assert!(args.contains(&"inputImageSize=small".to_string()));
        assert!(args.contains(&"function=bucketFill".to_string()));
        // Parameters irrelevant to bucketFill are still passed.
        assert!(args.contains(&"resizeWidthBicubic=500".to_string()));
    }

    #[test]
    fn missing_fields_render_as_sentinel() {
        let rec = MetricRecord {
            function: Some("boxBlur".to_string()),
            exec_speedup: Some(3.33),
            ..Default::default()
        };
        let row = rec.to_row();
        assert_eq!(row[0], NOT_AVAILABLE);
        assert_eq!(row[1], "boxBlur");
        assert_eq!(row[2], NOT_AVAILABLE);
        assert_eq!(row[8], "3.33");
    }
}
