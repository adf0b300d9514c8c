//! Command-line parsing for the light-chain trajectory tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::ScaleKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "kappa",
    version,
    about = "Kappa light-chain two-phase curve fitting and threshold projection"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit both phases, print the summary/table/chart/notes, and optionally export.
    Report(ReportArgs),
    /// Append a measurement to the data file.
    Add(AddArgs),
    /// Write a synthetic data file (seeded).
    Sample(SampleArgs),
}

/// Options for `kappa report`.
#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    /// Data file (JSON with `measurements` and `settings`).
    #[arg(short = 'd', long, env = "KAPPA_DATA", default_value = "data.json")]
    pub data: PathBuf,

    /// Notes template file (JSON with `title` and `sections`).
    #[arg(long, env = "KAPPA_NOTES")]
    pub notes: Option<PathBuf>,

    /// Cutover date between phases (overrides `settings.split_date`).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub split_date: Option<NaiveDate>,

    /// Last projected date (overrides `settings.projection_end_date`).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end_date: Option<NaiveDate>,

    /// VGPR threshold in mg/L (overrides `settings.vgpr_threshold`).
    #[arg(long)]
    pub vgpr: Option<f64>,

    /// CR threshold in mg/L (overrides `settings.cr_threshold`).
    #[arg(long)]
    pub cr: Option<f64>,

    /// Solver iteration cap.
    #[arg(long, default_value_t = 10_000)]
    pub max_iter: usize,

    /// Relative SSE decrease tolerance.
    #[arg(long, default_value_t = 1e-10)]
    pub ftol: f64,

    /// Relative step size tolerance.
    #[arg(long, default_value_t = 1e-10)]
    pub xtol: f64,

    /// Gradient tolerance.
    #[arg(long, default_value_t = 1e-12)]
    pub gtol: f64,

    /// Upper bound on the decay amplitude A.
    #[arg(long, default_value_t = 1000.0)]
    pub decay_max_amplitude: f64,

    /// Upper bound on the decay rate k (per day).
    #[arg(long, default_value_t = 1.0)]
    pub decay_max_rate: f64,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Vertical scale of the plot.
    #[arg(long, value_enum, default_value_t = ScaleKind::Linear)]
    pub scale: ScaleKind,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the results table (derived rows) to CSV.
    #[arg(long)]
    pub export_table: Option<PathBuf>,

    /// Export fitted models and projected curves to JSON.
    #[arg(long)]
    pub export_curve: Option<PathBuf>,

    /// Debug-level logging (unless `RUST_LOG` is set).
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Options for `kappa add`.
#[derive(Debug, Args, Clone)]
pub struct AddArgs {
    /// Data file to update (created if missing).
    #[arg(short = 'd', long, env = "KAPPA_DATA", default_value = "data.json")]
    pub data: PathBuf,

    /// Measurement date.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: NaiveDate,

    /// Kappa free light chain (mg/L).
    #[arg(long)]
    pub kappa: f64,

    /// Lambda free light chain (mg/L).
    #[arg(long)]
    pub lambda: f64,
}

/// Options for `kappa sample`.
#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output path for the generated data file.
    #[arg(short = 'o', long, default_value = "data.json")]
    pub out: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First measurement date.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start: Option<NaiveDate>,

    /// Sampling intervals before the cutover.
    #[arg(long, default_value_t = 10)]
    pub pre: usize,

    /// Sampling intervals after the cutover.
    #[arg(long, default_value_t = 8)]
    pub post: usize,

    /// Days between measurements.
    #[arg(long, default_value_t = 7)]
    pub interval_days: i64,

    /// Log-space noise standard deviation.
    #[arg(long, default_value_t = 0.03)]
    pub noise: f64,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}
