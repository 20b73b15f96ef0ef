//! Comparison plots: raw timings and fitted curves per function.

use crate::model::{FunctionModel, QuadraticFit};
use crate::{HarnessError, HarnessResult};
use charming::{
    component::{Axis, Legend, Title},
    element::{ItemStyle, LineStyle, NameLocation},
    series::{Line, Scatter},
    Chart, HtmlRenderer,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Samples along the fitted curve between the observed pixel extremes.
const CURVE_SAMPLES: usize = 100;

/// Render one function's single- vs. multi-thread comparison to
/// `{plot_dir}/{function}.html`. Functions without any fitted curve are
/// skipped by the caller.
pub fn render_function_plot(model: &FunctionModel, plot_dir: &Path) -> HarnessResult<PathBuf> {
    fs::create_dir_all(plot_dir).map_err(|e| HarnessError::io(plot_dir, e))?;

    let title = format!("{}: execution time vs. input size", model.function);
    let mut chart = Chart::new()
        .background_color("white")
        .title(Title::new().text(title.clone()))
        .x_axis(
            Axis::new()
                .name("pixel count")
                .name_location(NameLocation::Middle)
                .name_gap(25),
        )
        .y_axis(
            Axis::new()
                .name("execution time")
                .name_location(NameLocation::Middle)
                .name_gap(60),
        );

    let mut legends: Vec<String> = Vec::new();

    for (points, fit, label, color) in [
        (
            &model.single_points,
            &model.single,
            "single thread",
            "blue",
        ),
        (&model.multi_points, &model.multi, "multiple threads", "green"),
    ] {
        if !points.is_empty() {
            let scatter_data: Vec<Vec<f64>> = points.iter().map(|&(x, y)| vec![x, y]).collect();
            chart = chart.series(
                Scatter::new()
                    .data(scatter_data)
                    .name(label)
                    .symbol_size(10.0)
                    .item_style(ItemStyle::new().color(color)),
            );
            legends.push(label.to_string());
        }
        if let Some(fit) = fit {
            let fitted_label = format!("{} (fitted)", label);
            chart = chart.series(
                Line::new()
                    .data(sample_curve(fit, points))
                    .name(&fitted_label)
                    .line_style(LineStyle::new().width(2))
                    .item_style(ItemStyle::new().color(color)),
            );
            legends.push(fitted_label);
        }
    }

    chart = chart.legend(Legend::new().data(legends).top("8%").left("center"));

    let plot_file = plot_dir.join(format!("{}.html", model.function));
    HtmlRenderer::new(title, 1000, 800)
        .save(&chart, &plot_file)
        .map_err(|e| HarnessError::Render {
            path: plot_file.clone(),
            detail: format!("{e:?}"),
        })?;
    Ok(plot_file)
}

/// Evaluate the fitted curve at evenly spaced xs across the observed range.
fn sample_curve(fit: &QuadraticFit, points: &[(f64, f64)]) -> Vec<Vec<f64>> {
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, _) in points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    if !min_x.is_finite() || min_x == max_x {
        return Vec::new();
    }
    let step = (max_x - min_x) / (CURVE_SAMPLES - 1) as f64;
    (0..CURVE_SAMPLES)
        .map(|i| {
            let x = min_x + step * i as f64;
            vec![x, fit.eval(x)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_samples_span_the_observed_range() {
        let fit = QuadraticFit {
            c0: 1.0,
            c1: 0.0,
            c2: 1.0,
        };
        let points = [(2.0, 5.0), (10.0, 101.0), (6.0, 37.0)];
        let samples = sample_curve(&fit, &points);
        assert_eq!(samples.len(), CURVE_SAMPLES);
        assert_eq!(samples[0], vec![2.0, 5.0]);
        let last = samples.last().unwrap();
        assert!((last[0] - 10.0).abs() < 1e-9);
        assert!((last[1] - 101.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_ranges_produce_no_curve() {
        let fit = QuadraticFit {
            c0: 0.0,
            c1: 1.0,
            c2: 0.0,
        };
        assert!(sample_curve(&fit, &[]).is_empty());
        assert!(sample_curve(&fit, &[(3.0, 3.0), (3.0, 4.0)]).is_empty());
    }
}
