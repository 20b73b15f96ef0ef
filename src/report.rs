//! Terminal summary tables and inline diagnostics.

use crate::dataset::Dataset;
use crate::invoker::SweepSummary;
use crate::model::FunctionModel;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Table};

/// Print the sweep outcome, listing every failed combination.
pub fn print_sweep_summary(summary: &SweepSummary) {
    println!(
        "\n{} {} completed, {} failed",
        "Sweep:".bold(),
        summary.completed.len(),
        summary.failed.len()
    );
    for (spec, err) in &summary.failed {
        println!("  {} {}: {}", "✗".red(), spec.label(), err);
    }
}

/// Print the aggregated dataset as a table, one row per artifact.
pub fn print_dataset(dataset: &Dataset) {
    println!("\n{}", "━━━ Extracted metrics ━━━".bold().cyan());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![
        "Size",
        "Function",
        "Pixels",
        "Parse 1T",
        "Parse nT",
        "Parse ×",
        "Exec 1T",
        "Exec nT",
        "Exec ×",
    ]);

    for record in &dataset.records {
        let row = record.to_row();
        table.add_row(row.iter().map(Cell::new).collect::<Vec<_>>());
    }
    println!("{table}");

    let gaps = dataset
        .records
        .iter()
        .map(|r| r.to_row().iter().filter(|v| *v == crate::NOT_AVAILABLE).count())
        .sum::<usize>();
    if gaps > 0 {
        println!(
            "  {}",
            format!("{} field(s) missing from the transcripts (N/A)", gaps).yellow()
        );
    }
}

/// Print the fitted scaling models, with diagnostics for functions that
/// could not be modeled.
pub fn print_models(models: &[FunctionModel]) {
    println!("\n{}", "━━━ Scaling models (time = c0 + c1·px + c2·px²) ━━━".bold().cyan());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![
        "Function",
        "Mode",
        "Points",
        "c0",
        "c1",
        "c2",
    ]);

    for model in models {
        for (mode, fit, points) in [
            ("single", &model.single, &model.single_points),
            ("multi", &model.multi, &model.multi_points),
        ] {
            match fit {
                Some(fit) => {
                    table.add_row(vec![
                        Cell::new(&model.function),
                        Cell::new(mode),
                        Cell::new(points.len()),
                        Cell::new(format!("{:.4}", fit.c0)),
                        Cell::new(format!("{:.6}", fit.c1)),
                        Cell::new(format!("{:.6e}", fit.c2)),
                    ]);
                }
                None => {
                    table.add_row(vec![
                        Cell::new(&model.function),
                        Cell::new(mode),
                        Cell::new(points.len()),
                        Cell::new("-"),
                        Cell::new("-"),
                        Cell::new("-"),
                    ]);
                }
            }
        }
    }
    println!("{table}");

    for model in models {
        for diagnostic in &model.diagnostics {
            println!("  {} {}: {}", "⚠".yellow(), model.function.bold(), diagnostic);
        }
    }
}

/// Final completion line.
pub fn print_completion(stages: &[&str]) {
    println!(
        "\n{} {}",
        "Done:".bold().green(),
        stages.join(" → ")
    );
}
