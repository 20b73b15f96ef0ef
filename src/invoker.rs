//! External process sweep: one invocation per (function, image-size)
//! combination, each fully awaited before the next begins.

use crate::{Function, HarnessError, HarnessResult, ImageSize, RunSpec, SweepParams};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

/// How often a timed child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone)]
pub struct InvokerConfig {
    /// Path of the external image-processor executable.
    pub executable: PathBuf,
    /// Directory receiving one `{size}_{function}.txt` artifact per run.
    pub out_dir: PathBuf,
    /// Optional per-invocation timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub params: SweepParams,
}

/// Outcome of a full sweep. Failed combinations never abort the sweep;
/// they are collected here for the final report.
#[derive(Debug, Default)]
pub struct SweepSummary {
    pub completed: Vec<RunSpec>,
    pub failed: Vec<(RunSpec, HarnessError)>,
}

/// Run the full functions × image-sizes cross product sequentially.
///
/// Creating the output directory is the only fatal failure here; every
/// per-combination error is recorded and the sweep moves on.
pub fn run_sweep(cfg: &InvokerConfig) -> HarnessResult<SweepSummary> {
    fs::create_dir_all(&cfg.out_dir).map_err(|e| HarnessError::io(&cfg.out_dir, e))?;

    let mut summary = SweepSummary::default();
    for function in Function::ALL {
        for image_size in ImageSize::ALL {
            let spec = RunSpec {
                function,
                image_size,
                params: cfg.params.clone(),
            };
            print!("  {} ... ", spec.label());
            match run_one(cfg, &spec) {
                Ok(()) => {
                    println!("{}", "ok".green());
                    summary.completed.push(spec);
                }
                Err(e) => {
                    println!("{}", "FAILED".red());
                    eprintln!("    {}", e.to_string().red());
                    summary.failed.push((spec, e));
                }
            }
        }
    }
    Ok(summary)
}

/// Execute one combination and persist its artifact.
///
/// The transcript (echoed command line + captured stdout + stderr) is
/// composed in memory and only written after a zero exit status, so a
/// failed invocation leaves no half-written artifact behind. Re-running
/// overwrites the previous artifact for the combination.
pub fn run_one(cfg: &InvokerConfig, spec: &RunSpec) -> HarnessResult<()> {
    let args = spec.args();
    let child = Command::new(&cfg.executable)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| HarnessError::Invocation {
            combination: spec.label(),
            detail: format!("failed to start {}: {}", cfg.executable.display(), e),
        })?;

    let output = match cfg.timeout {
        Some(timeout) => await_with_timeout(child, timeout, spec)?,
        None => child.wait_with_output().map_err(|e| HarnessError::Invocation {
            combination: spec.label(),
            detail: format!("failed to collect output: {}", e),
        })?,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(HarnessError::Invocation {
            combination: spec.label(),
            detail: format!("{}: {}", output.status, stderr.trim()),
        });
    }

    let mut transcript = format!("{} {}\n", cfg.executable.display(), args.join(" "));
    transcript.push_str(&String::from_utf8_lossy(&output.stdout));
    transcript.push_str(&String::from_utf8_lossy(&output.stderr));

    let artifact = cfg.out_dir.join(spec.artifact_name());
    fs::write(&artifact, transcript).map_err(|e| HarnessError::io(&artifact, e))?;
    Ok(())
}

/// Await a child with a deadline, polling `try_wait`.
///
/// On expiry the child is killed and reaped, and the combination reports a
/// dedicated timeout error instead of hanging the sweep.
fn await_with_timeout(
    mut child: Child,
    timeout: Duration,
    spec: &RunSpec,
) -> HarnessResult<Output> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => {
                return child
                    .wait_with_output()
                    .map_err(|e| HarnessError::Invocation {
                        combination: spec.label(),
                        detail: format!("failed to collect output: {}", e),
                    });
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(HarnessError::Timeout {
                        combination: spec.label(),
                        secs: timeout.as_secs(),
                    });
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                return Err(HarnessError::Invocation {
                    combination: spec.label(),
                    detail: format!("failed to poll child: {}", e),
                });
            }
        }
    }
}
