use crate::error::{Result, SirError};
use crate::traits::DynamicalSystem;
use serde::{Deserialize, Serialize};

/// Index of each compartment in the state vector handed to the steppers.
pub const SUSCEPTIBLE: usize = 0;
pub const INFECTED: usize = 1;
pub const RECOVERED: usize = 2;

/// Constant parameters of a closed-population SIR run. Only constructible
/// through [`SirParameters::new`], which validates them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SirParameters {
    population: f64,
    contact_rate: f64,
    recovery_rate: f64,
}

fn require_positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SirError::InvalidParameter { name, value })
    }
}

impl SirParameters {
    /// `population` is N, `contact_rate` is β and `recovery_rate` is γ.
    pub fn new(population: f64, contact_rate: f64, recovery_rate: f64) -> Result<Self> {
        Ok(Self {
            population: require_positive("population", population)?,
            contact_rate: require_positive("contact rate", contact_rate)?,
            recovery_rate: require_positive("recovery rate", recovery_rate)?,
        })
    }

    pub fn population(&self) -> f64 {
        self.population
    }

    pub fn contact_rate(&self) -> f64 {
        self.contact_rate
    }

    pub fn recovery_rate(&self) -> f64 {
        self.recovery_rate
    }

    /// R0 = β / γ.
    pub fn basic_reproduction_number(&self) -> f64 {
        self.contact_rate / self.recovery_rate
    }

    /// Fraction of the population that must be immune for I to decline.
    /// Zero when R0 <= 1.
    pub fn herd_immunity_threshold(&self) -> f64 {
        (1.0 - 1.0 / self.basic_reproduction_number()).max(0.0)
    }

    /// Mean infectious period 1 / γ.
    pub fn infectious_period(&self) -> f64 {
        1.0 / self.recovery_rate
    }
}

/// Compartment counts at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SirState {
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
}

impl SirState {
    pub fn total(&self) -> f64 {
        self.susceptible + self.infected + self.recovered
    }

    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.susceptible, self.infected, self.recovered]
    }

    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match values {
            [susceptible, infected, recovered] => Ok(Self {
                susceptible: *susceptible,
                infected: *infected,
                recovered: *recovered,
            }),
            _ => Err(SirError::DimensionMismatch {
                expected: 3,
                actual: values.len(),
            }),
        }
    }
}

/// Initial infected and recovered counts; susceptibles fill the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    pub infected: f64,
    pub recovered: f64,
}

impl InitialConditions {
    pub fn new(infected: f64, recovered: f64) -> Self {
        Self {
            infected,
            recovered,
        }
    }

    /// Builds (N - I0 - R0, I0, R0), rejecting counts that do not fit in N.
    pub fn state(&self, params: &SirParameters) -> Result<SirState> {
        for (name, value) in [("infected", self.infected), ("recovered", self.recovered)] {
            if !value.is_finite() || value < 0.0 {
                return Err(SirError::NegativeInitialCount { name, value });
            }
        }
        let population = params.population();
        if self.infected + self.recovered > population {
            return Err(SirError::InitialCountsExceedPopulation {
                infected: self.infected,
                recovered: self.recovered,
                population,
            });
        }
        Ok(SirState {
            susceptible: population - self.infected - self.recovered,
            infected: self.infected,
            recovered: self.recovered,
        })
    }
}

/// The SIR vector field:
///
/// dS/dt = -β S I / N
/// dI/dt =  β S I / N - γ I
/// dR/dt =  γ I
#[derive(Debug, Clone, Copy)]
pub struct SirModel {
    params: SirParameters,
}

impl SirModel {
    pub fn new(params: SirParameters) -> Self {
        Self { params }
    }

    pub fn parameters(&self) -> &SirParameters {
        &self.params
    }
}

impl DynamicalSystem<f64> for SirModel {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let s = x[SUSCEPTIBLE];
        let i = x[INFECTED];
        let infections = self.params.contact_rate * s * i / self.params.population;
        let recoveries = self.params.recovery_rate * i;
        out[SUSCEPTIBLE] = -infections;
        out[INFECTED] = infections - recoveries;
        out[RECOVERED] = recoveries;
    }
}
