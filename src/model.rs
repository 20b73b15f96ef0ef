//! Scaling models: per-function degree-2 fits of execution time over
//! pixel count, separately for single- and multi-threaded measurements.

use crate::dataset::Dataset;
use crate::{HarnessError, HarnessResult};
use linregress::{FormulaRegressionBuilder, RegressionDataBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Coefficients of `time = c0 + c1·px + c2·px²`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuadraticFit {
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

impl QuadraticFit {
    pub fn eval(&self, x: f64) -> f64 {
        self.c0 + self.c1 * x + self.c2 * x * x
    }
}

/// Fitted scaling model for one function, plus the raw points behind it.
/// Recomputed from the dataset each analysis run, never persisted as state;
/// `models.json` is an export, not an input.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionModel {
    pub function: String,
    pub single: Option<QuadraticFit>,
    pub multi: Option<QuadraticFit>,
    pub single_points: Vec<(f64, f64)>,
    pub multi_points: Vec<(f64, f64)>,
    /// Per-function diagnostics (insufficient data, solver failures).
    pub diagnostics: Vec<String>,
}

impl FunctionModel {
    pub fn has_curves(&self) -> bool {
        self.single.is_some() || self.multi.is_some()
    }
}

/// Group the dataset by function and fit both thread modes per group.
///
/// A function that cannot be modeled gets diagnostics instead of curves;
/// it never aborts modeling of the other functions.
pub fn model_dataset(dataset: &Dataset) -> Vec<FunctionModel> {
    let mut groups: BTreeMap<String, Vec<&crate::MetricRecord>> = BTreeMap::new();
    for record in &dataset.records {
        if let Some(ref function) = record.function {
            groups.entry(function.clone()).or_default().push(record);
        }
    }

    let mut models = Vec::with_capacity(groups.len());
    for (function, records) in groups {
        let single_points: Vec<(f64, f64)> = records
            .iter()
            .filter_map(|r| Some((r.pixel_count? as f64, r.exec_time_single? as f64)))
            .collect();
        let multi_points: Vec<(f64, f64)> = records
            .iter()
            .filter_map(|r| Some((r.pixel_count? as f64, r.exec_time_multi? as f64)))
            .collect();

        let mut diagnostics = Vec::new();
        let single = fit_or_diagnose(&function, "single thread", &single_points, &mut diagnostics);
        let multi = fit_or_diagnose(&function, "multiple threads", &multi_points, &mut diagnostics);

        models.push(FunctionModel {
            function,
            single,
            multi,
            single_points,
            multi_points,
            diagnostics,
        });
    }
    models
}

fn fit_or_diagnose(
    function: &str,
    mode: &str,
    points: &[(f64, f64)],
    diagnostics: &mut Vec<String>,
) -> Option<QuadraticFit> {
    match fit_quadratic(function, points) {
        Ok(fit) => Some(fit),
        Err(e) => {
            diagnostics.push(format!("{}: {}", mode, e));
            None
        }
    }
}

/// Ordinary-least-squares degree-2 fit.
///
/// Requires at least 3 distinct x values. With exactly 3 the system is
/// determined and the regression library has no residual degrees of freedom
/// to grade, so the Vandermonde system is solved directly (means of y per x
/// when duplicates exist); with more points `linregress` fits
/// `y ~ x + x²`.
pub fn fit_quadratic(function: &str, points: &[(f64, f64)]) -> HarnessResult<QuadraticFit> {
    let mut distinct: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();

    if distinct.len() < 3 {
        return Err(HarnessError::InsufficientData {
            function: function.to_string(),
            distinct_points: distinct.len(),
        });
    }

    if distinct.len() == 3 {
        let xs = [distinct[0], distinct[1], distinct[2]];
        let ys = xs.map(|x| {
            let matching: Vec<f64> = points
                .iter()
                .filter(|(px, _)| *px == x)
                .map(|(_, y)| *y)
                .collect();
            matching.iter().sum::<f64>() / matching.len() as f64
        });
        return solve_vandermonde(function, xs, ys);
    }

    let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
    let xs: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
    let x2s: Vec<f64> = xs.iter().map(|x| x * x).collect();

    let data = RegressionDataBuilder::new()
        .build_from([("y", ys), ("x", xs), ("x2", x2s)])
        .map_err(|e| HarnessError::Fit {
            function: function.to_string(),
            detail: e.to_string(),
        })?;
    let fitted = FormulaRegressionBuilder::new()
        .data(&data)
        .formula("y ~ x + x2")
        .fit()
        .map_err(|e| HarnessError::Fit {
            function: function.to_string(),
            detail: e.to_string(),
        })?;

    let params = fitted.parameters();
    Ok(QuadraticFit {
        c0: params[0],
        c1: params[1],
        c2: params[2],
    })
}

/// Exact solve of the 3×3 Vandermonde system for three distinct x values.
fn solve_vandermonde(function: &str, xs: [f64; 3], ys: [f64; 3]) -> HarnessResult<QuadraticFit> {
    let mut m = [
        [1.0, xs[0], xs[0] * xs[0], ys[0]],
        [1.0, xs[1], xs[1] * xs[1], ys[1]],
        [1.0, xs[2], xs[2] * xs[2], ys[2]],
    ];

    // Gaussian elimination with partial pivoting.
    for col in 0..3 {
        let pivot = (col..3)
            .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
            .unwrap();
        if m[pivot][col].abs() < f64::EPSILON {
            return Err(HarnessError::Fit {
                function: function.to_string(),
                detail: "singular system in exact quadratic solve".to_string(),
            });
        }
        m.swap(col, pivot);
        for row in (col + 1)..3 {
            let factor = m[row][col] / m[col][col];
            for k in col..4 {
                m[row][k] -= factor * m[col][k];
            }
        }
    }
    let mut coeffs = [0.0f64; 3];
    for row in (0..3).rev() {
        let mut acc = m[row][3];
        for k in (row + 1)..3 {
            acc -= m[row][k] * coeffs[k];
        }
        coeffs[row] = acc / m[row][row];
    }

    Ok(QuadraticFit {
        c0: coeffs[0],
        c1: coeffs[1],
        c2: coeffs[2],
    })
}

/// Export the fitted models as pretty JSON next to the plots.
pub fn save_models_json(models: &[FunctionModel], path: &Path) -> HarnessResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(models).map_err(|e| HarnessError::Fit {
        function: "models.json".to_string(),
        detail: e.to_string(),
    })?;
    fs::write(path, json).map_err(|e| HarnessError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricRecord;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{} !~ {}", a, b);
    }

    #[test]
    fn exact_fit_from_three_points() {
        // y = 3 + 2x + x²
        let points = [(1.0, 6.0), (2.0, 11.0), (3.0, 18.0)];
        let fit = fit_quadratic("gaussianBlur", &points).unwrap();
        approx(fit.c0, 3.0);
        approx(fit.c1, 2.0);
        approx(fit.c2, 1.0);
        approx(fit.eval(4.0), 27.0);
    }

    #[test]
    fn ols_fit_from_more_points() {
        // y = 1 + 2x + 0.5x², noise-free, 5 distinct xs.
        let points: Vec<(f64, f64)> = [1.0, 2.0, 3.0, 4.0, 5.0]
            .iter()
            .map(|&x| (x, 1.0 + 2.0 * x + 0.5 * x * x))
            .collect();
        let fit = fit_quadratic("boxBlur", &points).unwrap();
        approx(fit.c0, 1.0);
        approx(fit.c1, 2.0);
        approx(fit.c2, 0.5);
    }

    #[test]
    fn duplicate_xs_average_before_exact_solve() {
        // Two samples per x; means lie on y = x².
        let points = [
            (1.0, 0.5),
            (1.0, 1.5),
            (2.0, 3.5),
            (2.0, 4.5),
            (3.0, 8.5),
            (3.0, 9.5),
        ];
        let fit = fit_quadratic("motionBlur", &points).unwrap();
        approx(fit.c0, 0.0);
        approx(fit.c1, 0.0);
        approx(fit.c2, 1.0);
    }

    #[test]
    fn two_distinct_points_is_insufficient() {
        let points = [(1.0, 2.0), (2.0, 5.0), (2.0, 5.0)];
        let err = fit_quadratic("bucketFill", &points).unwrap_err();
        match err {
            HarnessError::InsufficientData {
                function,
                distinct_points,
            } => {
                assert_eq!(function, "bucketFill");
                assert_eq!(distinct_points, 2);
            }
            other => panic!("expected InsufficientData, got {}", other),
        }
    }

    fn record(function: &str, px: u64, single: Option<u64>, multi: Option<u64>) -> MetricRecord {
        MetricRecord {
            function: Some(function.to_string()),
            pixel_count: Some(px),
            exec_time_single: single,
            exec_time_multi: multi,
            ..Default::default()
        }
    }

    #[test]
    fn sparse_function_gets_diagnostics_without_blocking_others() {
        let dataset = Dataset {
            records: vec![
                // gaussianBlur: 3 sizes, both modes.
                record("gaussianBlur", 10_000, Some(300), Some(90)),
                record("gaussianBlur", 40_000, Some(1200), Some(360)),
                record("gaussianBlur", 160_000, Some(4800), Some(1440)),
                // boxBlur: only 2 distinct pixel counts.
                record("boxBlur", 10_000, Some(50), Some(20)),
                record("boxBlur", 40_000, Some(200), Some(80)),
            ],
        };

        let models = model_dataset(&dataset);
        assert_eq!(models.len(), 2);

        let boxblur = models.iter().find(|m| m.function == "boxBlur").unwrap();
        assert!(!boxblur.has_curves());
        assert_eq!(boxblur.diagnostics.len(), 2);

        let gaussian = models.iter().find(|m| m.function == "gaussianBlur").unwrap();
        assert!(gaussian.single.is_some());
        assert!(gaussian.multi.is_some());
        assert!(gaussian.diagnostics.is_empty());
    }

    #[test]
    fn sentinel_fields_are_excluded_from_the_points() {
        let dataset = Dataset {
            records: vec![
                record("bucketFill", 10_000, Some(10), None),
                record("bucketFill", 40_000, Some(40), None),
                record("bucketFill", 160_000, Some(160), None),
            ],
        };
        let models = model_dataset(&dataset);
        assert_eq!(models.len(), 1);
        assert!(models[0].single.is_some());
        assert!(models[0].multi.is_none());
        assert!(models[0].multi_points.is_empty());
    }
}
