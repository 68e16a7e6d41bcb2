//! Runs one SIR integration and writes its outputs.

pub mod args;
pub mod chart;
pub mod logging;
pub mod report;

use anyhow::{Context, Result};
use log::info;
use sir_core::analysis::{summarize, EpidemicSummary};
use std::path::PathBuf;

pub use args::Args;

pub const TRAJECTORY_FILE: &str = "trajectory.csv";
pub const SUMMARY_FILE: &str = "summary.json";
pub const CHART_FILE: &str = "sir.svg";

/// Files written by [`run`] and the summary they were built from.
#[derive(Debug)]
pub struct RunOutputs {
    pub trajectory_csv: PathBuf,
    pub summary_json: PathBuf,
    pub chart_svg: Option<PathBuf>,
    pub summary: EpidemicSummary,
}

pub fn run(args: &Args) -> Result<RunOutputs> {
    let config = args.resolve_config()?;
    let params = config.parameters().context("Invalid model parameters")?;
    let initial = config.initial_conditions();
    info!(
        "N = {}, I0 = {}, R0 = {}, beta = {}, gamma = {} (basic reproduction number {:.3})",
        params.population(),
        initial.infected,
        initial.recovered,
        params.contact_rate(),
        params.recovery_rate(),
        params.basic_reproduction_number()
    );

    let trajectory = config.run().context("SIR integration failed")?;
    let summary = summarize(&params, &initial, &trajectory)?;
    info!(
        "infections peak at {:.1} on t = {:.2}; at t = {} S = {:.2}, I = {:.2}, R = {:.2}",
        summary.peak_infected,
        summary.peak_time,
        summary.final_time,
        summary.final_state.susceptible,
        summary.final_state.infected,
        summary.final_state.recovered
    );

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let trajectory_csv = args.output_dir.join(TRAJECTORY_FILE);
    report::write_trajectory_csv(&trajectory_csv, &trajectory)?;
    info!("wrote {}", trajectory_csv.display());

    let summary_json = args.output_dir.join(SUMMARY_FILE);
    report::write_summary_json(&summary_json, &summary)?;
    info!("wrote {}", summary_json.display());

    let chart_svg = if args.no_chart {
        None
    } else {
        let path = args.output_dir.join(CHART_FILE);
        let document = chart::render_svg(&trajectory, &chart::ChartOptions::default());
        svg::save(&path, &document)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
        Some(path)
    };

    Ok(RunOutputs {
        trajectory_csv,
        summary_json,
        chart_svg,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use clap::Parser;

    fn args_for(dir: &std::path::Path, extra: &[&str]) -> Args {
        let mut argv = vec!["sir", "--output-dir", dir.to_str().unwrap()];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn default_run_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = run(&args_for(dir.path(), &[])).unwrap();

        assert!(outputs.trajectory_csv.exists());
        assert!(outputs.summary_json.exists());
        assert!(outputs.chart_svg.as_ref().unwrap().exists());

        let csv = std::fs::read_to_string(&outputs.trajectory_csv).unwrap();
        assert_eq!(csv.lines().count(), 161);

        let json = std::fs::read_to_string(&outputs.summary_json).unwrap();
        let summary: EpidemicSummary = serde_json::from_str(&json).unwrap();
        assert_abs_diff_eq!(summary.peak_time, outputs.summary.peak_time, epsilon = 1e-9);
        assert_abs_diff_eq!(
            summary.final_state.susceptible,
            outputs.summary.final_state.susceptible,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(summary.basic_reproduction_number, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn no_chart_skips_svg() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = run(&args_for(dir.path(), &["--no-chart", "--solver", "rk4"])).unwrap();
        assert!(outputs.chart_svg.is_none());
        assert!(!dir.path().join(CHART_FILE).exists());
    }

    #[test]
    fn invalid_parameters_are_reported_without_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let err = run(&args_for(&out, &["--recovery-rate", "0"])).expect_err("gamma = 0");
        assert!(format!("{err:#}").contains("recovery rate"), "{err:#}");
        assert!(!out.exists());
    }
}
