//! Command-line arguments and how they override a loaded configuration.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use sir_core::{AdaptiveSettings, IntegrationMethod, SirConfig};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SolverChoice {
    /// Fixed-step RK4 on the output grid
    Rk4,
    /// Tsit5 with local error control
    Adaptive,
}

/// Integrate the SIR epidemic model and chart the result.
#[derive(Parser, Debug)]
#[command(name = "sir")]
pub struct Args {
    /// Optional path to a JSON run configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory receiving trajectory.csv, summary.json and sir.svg
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Total population N
    #[arg(long)]
    pub population: Option<f64>,

    /// Initially infected count I0
    #[arg(long)]
    pub initial_infected: Option<f64>,

    /// Initially recovered count R0
    #[arg(long)]
    pub initial_recovered: Option<f64>,

    /// Contact rate beta
    #[arg(long)]
    pub contact_rate: Option<f64>,

    /// Recovery rate gamma (1 / mean infectious period)
    #[arg(long)]
    pub recovery_rate: Option<f64>,

    /// Last sample time
    #[arg(long)]
    pub end_time: Option<f64>,

    /// Number of evenly spaced samples
    #[arg(long)]
    pub points: Option<usize>,

    /// Integration method, replacing the one from the config file
    #[arg(long, value_enum)]
    pub solver: Option<SolverChoice>,

    /// Skip rendering sir.svg
    #[arg(long)]
    pub no_chart: bool,

    /// Maximum log level written to stderr
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,
}

impl Args {
    /// Loads the config file (or the defaults) and applies the overrides.
    pub fn resolve_config(&self) -> Result<SirConfig> {
        let mut config = match &self.config {
            Some(path) => SirConfig::from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => SirConfig::default(),
        };

        if let Some(value) = self.population {
            config.population = value;
        }
        if let Some(value) = self.initial_infected {
            config.initial_infected = value;
        }
        if let Some(value) = self.initial_recovered {
            config.initial_recovered = value;
        }
        if let Some(value) = self.contact_rate {
            config.contact_rate = value;
        }
        if let Some(value) = self.recovery_rate {
            config.recovery_rate = value;
        }
        if let Some(value) = self.end_time {
            config.grid.end = value;
        }
        if let Some(value) = self.points {
            config.grid.points = value;
        }
        match (self.solver, config.method) {
            (Some(SolverChoice::Rk4), IntegrationMethod::Adaptive(_)) => {
                config.method = IntegrationMethod::Rk4 { substeps: 1 };
            }
            (Some(SolverChoice::Adaptive), IntegrationMethod::Rk4 { .. }) => {
                config.method = IntegrationMethod::Adaptive(AdaptiveSettings::default());
            }
            _ => {}
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn every_flag_has_help_text() {
        let command = Args::command();
        for arg in command.get_arguments() {
            let id = arg.get_id().as_str();
            if id == "help" || id == "version" {
                continue;
            }
            assert!(arg.get_help().is_some(), "--{id} has no help text");
        }
    }

    #[test]
    fn defaults_reproduce_reference_config() {
        let args = Args::parse_from(["sir"]);
        assert_eq!(args.resolve_config().unwrap(), SirConfig::default());
        assert_eq!(args.log_level, LevelFilter::Info);
        assert!(!args.no_chart);
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "population": 2000, "contact_rate": 0.4, "method": {{ "solver": "rk4", "substeps": 3 }} }}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = Args::parse_from([
            "sir",
            "--config",
            &path,
            "--contact-rate",
            "0.3",
            "--points",
            "50",
        ]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.population, 2000.0);
        assert_eq!(config.contact_rate, 0.3);
        assert_eq!(config.grid.points, 50);
        assert_eq!(config.method, IntegrationMethod::Rk4 { substeps: 3 });
    }

    #[test]
    fn solver_flag_switches_method() {
        let args = Args::parse_from(["sir", "--solver", "rk4"]);
        assert_eq!(
            args.resolve_config().unwrap().method,
            IntegrationMethod::Rk4 { substeps: 1 }
        );
    }

    #[test]
    fn missing_config_file_names_the_path() {
        let args = Args::parse_from(["sir", "--config", "/nonexistent/sir.json"]);
        let err = args.resolve_config().expect_err("file does not exist");
        assert!(format!("{err:#}").contains("/nonexistent/sir.json"), "{err:#}");
    }
}
