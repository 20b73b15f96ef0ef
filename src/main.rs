//! imgproc-bench: benchmark harness for an external image-processor
//! executable.
//!
//! Usage:
//!   imgproc-bench                          # sweep, extract, plot
//!   imgproc-bench --sweep                  # only run the external sweep
//!   imgproc-bench --extract --plot         # reuse existing artifacts
//!   imgproc-bench --plot                   # refit from the existing CSV
//!   imgproc-bench --timeout-secs 300       # bound each invocation

use clap::Parser;
use colored::Colorize;
use imgproc_bench::invoker::{self, InvokerConfig};
use imgproc_bench::{dataset, model, plot, report};
use imgproc_bench::{HarnessError, HarnessResult, SweepParams};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "imgproc-bench",
    about = "Drive the external image-processor across functions × sizes and model its scaling"
)]
struct Cli {
    /// Run the external sweep (7 functions × 3 image sizes).
    #[arg(long)]
    sweep: bool,

    /// Extract metrics from captured artifacts into the CSV dataset.
    #[arg(long)]
    extract: bool,

    /// Fit scaling models and render per-function comparison plots.
    #[arg(long)]
    plot: bool,

    /// Path of the external image-processor executable.
    #[arg(long, default_value = "./image-processor")]
    executable: PathBuf,

    /// Directory receiving one transcript artifact per combination.
    #[arg(long, default_value = "runs")]
    out_dir: PathBuf,

    /// Dataset CSV path, rewritten on every extraction pass.
    #[arg(long, default_value = "runData.csv")]
    csv: PathBuf,

    /// Directory receiving per-function HTML plots and models.json.
    #[arg(long, default_value = "plots")]
    plot_dir: PathBuf,

    /// Per-invocation timeout in seconds (unbounded when omitted).
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Gaussian blur sigma.
    #[arg(long, default_value_t = 3.0)]
    sigma: f64,

    /// Box blur kernel size.
    #[arg(long, default_value_t = 9)]
    box_size: u32,

    /// Motion blur length.
    #[arg(long, default_value_t = 15)]
    motion_length: u32,

    /// Bucket fill threshold.
    #[arg(long, default_value_t = 75)]
    bucket_fill_threshold: u32,

    /// Bucket fill seed point, x.
    #[arg(long, default_value_t = 800)]
    bucket_fill_x: u32,

    /// Bucket fill seed point, y.
    #[arg(long, default_value_t = 170)]
    bucket_fill_y: u32,
}

/// Which pipeline stages to run. Passed explicitly into [`run_pipeline`];
/// there is no process-wide stage state.
#[derive(Debug, Clone, Copy)]
struct PipelineConfig {
    run_sweep: bool,
    extract_metrics: bool,
    render_plots: bool,
}

impl PipelineConfig {
    /// No stage flags means the full pipeline.
    fn from_cli(cli: &Cli) -> Self {
        let any = cli.sweep || cli.extract || cli.plot;
        Self {
            run_sweep: !any || cli.sweep,
            extract_metrics: !any || cli.extract,
            render_plots: !any || cli.plot,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = PipelineConfig::from_cli(&cli);
    if let Err(e) = run_pipeline(config, &cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_pipeline(config: PipelineConfig, cli: &Cli) -> HarnessResult<()> {
    if cli.timeout_secs == Some(0) {
        return Err(HarnessError::Config(
            "--timeout-secs must be positive".to_string(),
        ));
    }

    let mut stages: Vec<&str> = Vec::new();

    if config.run_sweep {
        println!(
            "{} {} across {} combinations",
            "▶ Sweeping".bold().green(),
            cli.executable.display(),
            imgproc_bench::Function::ALL.len() * imgproc_bench::ImageSize::ALL.len()
        );
        let invoker_config = InvokerConfig {
            executable: cli.executable.clone(),
            out_dir: cli.out_dir.clone(),
            timeout: cli.timeout_secs.map(Duration::from_secs),
            params: SweepParams {
                sigma: cli.sigma,
                box_size: cli.box_size,
                motion_length: cli.motion_length,
                bucket_fill_threshold: cli.bucket_fill_threshold,
                bucket_fill_x: cli.bucket_fill_x,
                bucket_fill_y: cli.bucket_fill_y,
                ..SweepParams::default()
            },
        };
        let summary = invoker::run_sweep(&invoker_config)?;
        report::print_sweep_summary(&summary);
        stages.push("sweep");
    }

    let extracted = if config.extract_metrics {
        println!(
            "\n{} {} → {}",
            "▶ Extracting".bold().green(),
            cli.out_dir.display(),
            cli.csv.display()
        );
        let dataset = dataset::aggregate(&cli.out_dir, &cli.csv)?;
        report::print_dataset(&dataset);
        stages.push("extract");
        Some(dataset)
    } else {
        None
    };

    if config.render_plots {
        // Modeling can run from a previously persisted dataset.
        let dataset = match extracted {
            Some(dataset) => dataset,
            None => dataset::load(&cli.csv)?,
        };
        println!("\n{} {} records", "▶ Modeling".bold().green(), dataset.records.len());
        let models = model::model_dataset(&dataset);
        for function_model in models.iter().filter(|m| m.has_curves()) {
            let path = plot::render_function_plot(function_model, &cli.plot_dir)?;
            println!("  plot written to {}", path.display());
        }
        model::save_models_json(&models, &cli.plot_dir.join("models.json"))?;
        report::print_models(&models);
        stages.push("plot");
    }

    report::print_completion(&stages);
    Ok(())
}
