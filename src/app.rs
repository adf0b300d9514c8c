//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the data file and merges its settings with CLI overrides
//! - runs the two-phase projection pipeline
//! - prints reports/plots/notes
//! - writes optional exports

use clap::Parser;
use tracing::{debug, info};

use crate::cli::{AddArgs, Command, ReportArgs, SampleArgs};
use crate::data::{SampleSpec, generate_sample};
use crate::domain::{ProjectionConfig, ReportConfig, Threshold};
use crate::error::AppError;
use crate::io::{DataFile, Measurement, Settings, read_data_file, write_data_file};
use crate::math::{ParamBounds, SolverOptions};
use crate::models::DECAY_LOWER;

pub mod pipeline;

/// Entry point for the `kappa` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // We want `kappa` and `kappa --scale log` to behave like `kappa report ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => {
            crate::logging::init(args.verbose);
            handle_report(args)
        }
        Command::Add(args) => {
            crate::logging::init(false);
            handle_add(args)
        }
        Command::Sample(args) => {
            crate::logging::init(false);
            handle_sample(args)
        }
    }
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let data = read_data_file(&args.data)?;
    let config = report_config_from_args(&args, &data.settings)?;
    let series = data.to_series()?;
    info!(
        observations = series.len(),
        data = %args.data.display(),
        "loaded measurements"
    );

    let run = pipeline::run_projection(series, &config.projection)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run, &config.projection)
    );
    println!("{}", crate::report::format_results_table(&run.derived));

    if config.plot {
        let plot = crate::plot::render_run_plot(
            &run,
            &config.projection,
            config.plot_width,
            config.plot_height,
            config.plot_scale,
        );
        println!("{plot}");
    }

    if let Some(path) = &config.notes_path {
        let notes = crate::report::read_notes_file(path)?;
        let values = crate::report::note_values(&run, &config.projection);
        println!("{}", crate::report::render_notes(&notes, &values)?);
    }

    // Optional exports.
    if let Some(path) = &config.export_table {
        crate::io::write_derived_csv(path, &run.derived)?;
        info!(path = %path.display(), "wrote results table");
    }
    if let Some(path) = &config.export_curve {
        crate::io::write_curve_json(path, &run)?;
        info!(path = %path.display(), "wrote curve file");
    }

    Ok(())
}

fn handle_add(args: AddArgs) -> Result<(), AppError> {
    let mut data = if args.data.exists() {
        read_data_file(&args.data)?
    } else {
        debug!(path = %args.data.display(), "data file missing, starting a new one");
        DataFile::default()
    };

    data.push_measurement(Measurement {
        date: args.date,
        kappa: args.kappa,
        lambda: args.lambda,
    })?;
    write_data_file(&args.data, &data)?;

    println!(
        "Added {}: kappa={:.1} lambda={:.1} ({} measurements in {})",
        args.date,
        args.kappa,
        args.lambda,
        data.measurements.len(),
        args.data.display()
    );
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    if args.out.exists() && !args.force {
        return Err(AppError::new(
            2,
            format!(
                "Refusing to overwrite '{}' (pass --force).",
                args.out.display()
            ),
        ));
    }

    let defaults = SampleSpec::default();
    let spec = SampleSpec {
        start: args.start.unwrap_or(defaults.start),
        pre_intervals: args.pre,
        post_intervals: args.post,
        interval_days: args.interval_days,
        noise_sigma: args.noise,
        seed: args.seed,
        ..defaults
    };
    let data = generate_sample(&spec)?;
    write_data_file(&args.out, &data)?;

    println!(
        "Wrote {} synthetic measurements to {}",
        data.measurements.len(),
        args.out.display()
    );
    Ok(())
}

/// Merge data-file settings with CLI overrides.
///
/// CLI flags win; a setting missing from both is an error.
pub fn report_config_from_args(
    args: &ReportArgs,
    settings: &Settings,
) -> Result<ReportConfig, AppError> {
    let cutover = required(args.split_date.or(settings.split_date), "split_date")?;
    let projection_end = required(
        args.end_date.or(settings.projection_end_date),
        "projection_end_date",
    )?;
    let vgpr = required(args.vgpr.or(settings.vgpr_threshold), "vgpr_threshold")?;
    let cr = required(args.cr.or(settings.cr_threshold), "cr_threshold")?;

    let solver = SolverOptions {
        max_iter: args.max_iter,
        ftol: args.ftol,
        xtol: args.xtol,
        gtol: args.gtol,
        ..SolverOptions::default()
    };
    let decay_bounds = ParamBounds::new(
        DECAY_LOWER.to_vec(),
        vec![args.decay_max_amplitude, args.decay_max_rate],
    )?;

    Ok(ReportConfig {
        projection: ProjectionConfig {
            cutover,
            projection_end,
            thresholds: vec![Threshold::new("VGPR", vgpr), Threshold::new("CR", cr)],
            solver,
            decay_bounds,
        },
        notes_path: args.notes.clone(),
        plot: args.plot && !args.no_plot,
        plot_scale: args.scale,
        plot_width: args.width,
        plot_height: args.height,
        export_table: args.export_table.clone(),
        export_curve: args.export_curve.clone(),
    })
}

fn required<T>(value: Option<T>, key: &str) -> Result<T, AppError> {
    value.ok_or_else(|| {
        AppError::new(
            2,
            format!("Missing setting '{key}' (set it in the data file or pass the flag)."),
        )
    })
}

/// Rewrite argv so `kappa` defaults to `kappa report`.
///
/// Rules:
/// - `kappa`                      -> `kappa report`
/// - `kappa --scale log ...`      -> `kappa report --scale log ...`
/// - `kappa --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("report".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "report" | "add" | "sample");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "report flags".
    if arg1.starts_with('-') {
        argv.insert(1, "report".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn report_args(extra: &[&str]) -> ReportArgs {
        let mut full = vec!["kappa", "report"];
        full.extend_from_slice(extra);
        match crate::cli::Cli::parse_from(full).command {
            Command::Report(args) => args,
            other => panic!("expected report, got {other:?}"),
        }
    }

    #[test]
    fn bare_and_flag_first_invocations_become_report() {
        assert_eq!(rewrite_args(argv(&["kappa"])), argv(&["kappa", "report"]));
        assert_eq!(
            rewrite_args(argv(&["kappa", "--scale", "log"])),
            argv(&["kappa", "report", "--scale", "log"])
        );
        assert_eq!(
            rewrite_args(argv(&["kappa", "--help"])),
            argv(&["kappa", "--help"])
        );
        assert_eq!(
            rewrite_args(argv(&["kappa", "sample"])),
            argv(&["kappa", "sample"])
        );
    }

    #[test]
    fn cli_overrides_file_settings() {
        let settings = Settings {
            split_date: NaiveDate::from_ymd_opt(2025, 6, 10),
            projection_end_date: NaiveDate::from_ymd_opt(2026, 6, 30),
            vgpr_threshold: Some(10.0),
            cr_threshold: Some(5.0),
        };
        let args = report_args(&["--cr", "4", "--end-date", "2026-12-31", "--no-plot"]);
        let config = report_config_from_args(&args, &settings).unwrap();

        let p = &config.projection;
        assert_eq!(p.cutover, NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
        assert_eq!(p.projection_end, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
        assert_eq!(p.thresholds[0], Threshold::new("VGPR", 10.0));
        assert_eq!(p.thresholds[1], Threshold::new("CR", 4.0));
        assert_eq!(p.decay_bounds.upper(), &[1000.0, 1.0]);
        assert!(!config.plot);
    }

    #[test]
    fn missing_setting_is_a_usage_error() {
        let args = report_args(&[]);
        let err = report_config_from_args(&args, &Settings::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("split_date"));
    }

    #[test]
    fn inverted_decay_bounds_are_rejected() {
        let settings = Settings {
            split_date: NaiveDate::from_ymd_opt(2025, 6, 10),
            projection_end_date: NaiveDate::from_ymd_opt(2026, 6, 30),
            vgpr_threshold: Some(10.0),
            cr_threshold: Some(5.0),
        };
        let args = report_args(&["--decay-max-rate=-1"]);
        assert!(report_config_from_args(&args, &settings).is_err());
    }
}
