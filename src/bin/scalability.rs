//! Experiment runner for the scalability of the pivoted Cholesky factorization.
//!
//! The orchestrator sweeps a range of problem sizes `n`. For each size and each
//! parallelism mode it spawns an isolated worker process that builds a Gaussian
//! kernel over `n` points, factorizes it, and reports time and peak memory as a
//! single CSV row on stdout. Running each measurement in its own process keeps
//! the peak RSS of one run from leaking into the next.
//!
//! Points are drawn uniformly from the unit cube unless `--points` names a file,
//! in which case the first `n` points of the file are used.

use anyhow::{Context, Result, anyhow, ensure};
use clap::{Parser, ValueEnum};
use faer::Par;
use pivoted_cholesky::{
    StoppingCriterion, factorize,
    kernel::PointKernel,
    utils::{
        data_loader::load_points,
        perf::measure,
        synthetic::{gaussian_kernel, random_points},
    },
};
use serde::{Deserialize, Serialize};
use std::{
    path::PathBuf,
    process::{Command, Stdio},
};

/// Environment variable that switches the process into worker mode.
const MODE_ENV_VAR: &str = "PIVCHOL_SCALABILITY_MODE";

/// Parallelism used for the per-row column update.
#[derive(ValueEnum, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Copy)]
#[serde(rename_all = "kebab-case")]
enum ParallelMode {
    Seq,
    Rayon,
}

impl ParallelMode {
    fn par(self) -> Par {
        match self {
            ParallelMode::Seq => Par::Seq,
            ParallelMode::Rayon => Par::rayon(0),
        }
    }
}

/// Command-line arguments for the orchestrator process.
#[derive(Parser, Debug)]
#[clap(
    name = "scalability-runner",
    about = "Measures time and memory of the pivoted Cholesky factorization as n grows."
)]
struct ScalabilityArgs {
    /// The smallest number of points.
    #[clap(long)]
    n_start: usize,
    /// The largest number of points.
    #[clap(long)]
    n_end: usize,
    /// The step between consecutive problem sizes.
    #[clap(long)]
    n_step: usize,
    #[clap(flatten)]
    problem: ProblemArgs,
    /// Parallelism modes to measure for every problem size.
    #[clap(long, value_enum, num_args = 1.., default_values_t = [ParallelMode::Seq, ParallelMode::Rayon])]
    modes: Vec<ParallelMode>,
    /// Path to the output CSV file.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

/// Problem description shared by the orchestrator and its workers.
#[derive(clap::Args, Debug, Clone)]
struct ProblemArgs {
    /// Dimension of the synthetic points. Ignored with `--points`.
    #[clap(long, default_value_t = 3)]
    dim: usize,
    /// Seed for the synthetic points.
    #[clap(long, default_value_t = 42)]
    seed: u64,
    /// Length scale of the Gaussian kernel.
    #[clap(long, default_value_t = 0.2)]
    length_scale: f64,
    /// Stop when the residual trace drops below this fraction of the initial trace.
    #[clap(long, default_value_t = 1e-6)]
    relative_tolerance: f64,
    /// Upper bound on the rank of the factor.
    #[clap(long)]
    max_rank: Option<usize>,
    /// Read points from this file instead of generating them.
    #[clap(long, value_name = "PATH")]
    points: Option<PathBuf>,
}

impl ProblemArgs {
    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "--dim".to_string(),
            self.dim.to_string(),
            "--seed".to_string(),
            self.seed.to_string(),
            "--length-scale".to_string(),
            self.length_scale.to_string(),
            "--relative-tolerance".to_string(),
            self.relative_tolerance.to_string(),
        ];
        if let Some(max_rank) = self.max_rank {
            args.extend(["--max-rank".to_string(), max_rank.to_string()]);
        }
        if let Some(points) = &self.points {
            args.extend(["--points".to_string(), points.display().to_string()]);
        }
        args
    }

    fn criterion(&self) -> StoppingCriterion {
        match self.max_rank {
            Some(m) => StoppingCriterion::NumberOfEigenfunctions(m),
            None => StoppingCriterion::RelativeTolerance(self.relative_tolerance),
        }
    }
}

/// Command-line arguments for a worker process.
#[derive(Parser, Debug)]
struct WorkerArgs {
    /// Number of points for this run.
    #[clap(long)]
    n: usize,
    #[clap(flatten)]
    problem: ProblemArgs,
}

/// A single row of the output CSV, produced by one worker run.
#[derive(Debug, Serialize, Deserialize)]
struct ScalabilityResult {
    mode: ParallelMode,
    n: usize,
    rank: usize,
    trace: f64,
    time_s: f64,
    rss_kb: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    if let Ok(mode_str) = std::env::var(MODE_ENV_VAR) {
        let mode = ParallelMode::from_str(&mode_str, true)
            .map_err(|_| anyhow!("Invalid mode string in env var: {}", mode_str))?;
        run_worker(mode)
    } else {
        run_orchestrator()
    }
}

/// Sweeps the problem sizes and collects one worker result per size and mode.
/// Rows are flushed as they arrive, so a failed run keeps the earlier data.
fn run_orchestrator() -> Result<()> {
    let args = ScalabilityArgs::parse();
    ensure!(args.n_step > 0, "--n-step must be positive");
    ensure!(
        args.n_start > 0 && args.n_start <= args.n_end,
        "Invalid size range {}..={}",
        args.n_start,
        args.n_end
    );
    log::info!("Orchestrator starting scalability experiment...");

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create CSV writer for {:?}", &args.output))?;
    let current_exe = std::env::current_exe()?;

    for n in (args.n_start..=args.n_end).step_by(args.n_step) {
        log::info!("Processing problem size: n = {n}");

        for &mode in &args.modes {
            let mode_name = mode
                .to_possible_value()
                .ok_or_else(|| anyhow!("Mode {mode:?} has no command-line name"))?;
            let output = Command::new(&current_exe)
                .arg("--n")
                .arg(n.to_string())
                .args(args.problem.to_cli_args())
                .env(MODE_ENV_VAR, mode_name.get_name())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .spawn()
                .with_context(|| format!("Failed to spawn worker for mode {mode:?}"))?
                .wait_with_output()?;

            if !output.status.success() {
                log::error!(
                    "Worker for mode {:?} at n = {} failed with status: {}. Skipping.",
                    mode,
                    n,
                    output.status
                );
                continue;
            }

            let mut rdr = csv::ReaderBuilder::new()
                .has_headers(false)
                .from_reader(output.stdout.as_slice());
            match rdr.deserialize::<ScalabilityResult>().next() {
                Some(Ok(record)) => {
                    log::info!(
                        "Worker finished. Result: n={}, rank={}, time={:.3}s, rss={}KB",
                        record.n,
                        record.rank,
                        record.time_s,
                        record.rss_kb
                    );
                    writer.serialize(&record)?;
                    writer.flush()?;
                }
                Some(Err(e)) => {
                    log::error!("Failed to parse worker output as CSV: {}. Skipping record.", e);
                }
                None => {
                    log::warn!("Worker for {:?} produced no output. Skipping record.", mode);
                }
            }
        }
    }

    log::info!(
        "Scalability experiment complete. Results saved to {:?}.",
        &args.output
    );
    Ok(())
}

/// Runs one factorization in isolation and prints its measurements as a CSV row.
fn run_worker(mode: ParallelMode) -> Result<()> {
    let args = WorkerArgs::parse();
    let problem = &args.problem;

    let points = match &problem.points {
        Some(path) => {
            let mut set = load_points(path)
                .with_context(|| format!("Failed to load points from {path:?}"))?;
            ensure!(
                set.points.len() >= args.n,
                "{path:?} holds {} points, but n = {} were requested",
                set.points.len(),
                args.n
            );
            set.points.truncate(args.n);
            set.points
        }
        None => random_points(args.n, problem.dim, problem.seed),
    };

    let length_scale = problem.length_scale;
    let kernel = PointKernel::new(&points, |x: &Vec<f64>, y: &Vec<f64>| {
        gaussian_kernel(x, y, length_scale)
    });

    let (result, measurement) = measure(|| factorize(&kernel, problem.criterion(), mode.par()));
    let factorization = result?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(std::io::stdout());
    writer.serialize(ScalabilityResult {
        mode,
        n: args.n,
        rank: factorization.rank(),
        trace: factorization.trace(),
        time_s: measurement.time_s,
        rss_kb: measurement.peak_rss_kb,
    })?;
    writer.flush()?;

    log::info!("Worker for {mode:?} finished.");
    Ok(())
}
