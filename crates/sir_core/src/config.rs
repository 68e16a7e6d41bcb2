use crate::{
    error::Result,
    grid::TimeGrid,
    integrate::{simulate, IntegrationMethod},
    model::{InitialConditions, SirParameters},
    trajectory::Trajectory,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Evenly spaced sampling grid, as written in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub start: f64,
    pub end: f64,
    pub points: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 160.0,
            points: 160,
        }
    }
}

/// A complete run description. Missing fields fall back to the reference
/// outbreak: N = 1000, one initial case, β = 0.2, γ = 0.1, 160 samples over
/// 160 days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SirConfig {
    pub population: f64,
    pub initial_infected: f64,
    pub initial_recovered: f64,
    pub contact_rate: f64,
    pub recovery_rate: f64,
    pub grid: GridSpec,
    pub method: IntegrationMethod,
}

impl Default for SirConfig {
    fn default() -> Self {
        Self {
            population: 1000.0,
            initial_infected: 1.0,
            initial_recovered: 0.0,
            contact_rate: 0.2,
            recovery_rate: 0.1,
            grid: GridSpec::default(),
            method: IntegrationMethod::default(),
        }
    }
}

impl SirConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn parameters(&self) -> Result<SirParameters> {
        SirParameters::new(self.population, self.contact_rate, self.recovery_rate)
    }

    pub fn initial_conditions(&self) -> InitialConditions {
        InitialConditions::new(self.initial_infected, self.initial_recovered)
    }

    pub fn time_grid(&self) -> Result<TimeGrid> {
        TimeGrid::linspace(self.grid.start, self.grid.end, self.grid.points)
    }

    /// Validates every input, then integrates.
    pub fn run(&self) -> Result<Trajectory> {
        let params = self.parameters()?;
        let grid = self.time_grid()?;
        simulate(&params, &self.initial_conditions(), &grid, &self.method)
    }
}
