use crate::{
    error::{Result, SirError},
    model::{InitialConditions, SirParameters, SirState, INFECTED},
    trajectory::Trajectory,
};
use nalgebra::DMatrix;
use roots::{find_root_brent, SimpleConvergency};
use serde::{Deserialize, Serialize};

/// Outcome of the epidemic once I has returned to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalSize {
    pub susceptible: f64,
    pub recovered: f64,
    /// Fraction of the initially susceptible population that was infected.
    pub attack_rate: f64,
}

/// Solves s∞ = s0 · exp(-R0 · (1 - s∞ - r0)) for the fraction s∞ of the
/// population left susceptible.
pub fn final_size(params: &SirParameters, initial: &InitialConditions) -> Result<FinalSize> {
    let start = initial.state(params)?;
    let n = params.population();
    let s0 = start.susceptible / n;
    let i0 = start.infected / n;
    let r0 = start.recovered / n;
    let reproduction = params.basic_reproduction_number();

    let susceptible = if s0 == 0.0 || i0 == 0.0 {
        start.susceptible
    } else {
        let relation = |s: f64| s - s0 * (-reproduction * (1.0 - s - r0)).exp();
        let mut convergency = SimpleConvergency {
            eps: 1e-14f64,
            max_iter: 200,
        };
        find_root_brent(0.0, s0, relation, &mut convergency)
            .map(|s_inf| s_inf * n)
            .map_err(|err| SirError::RootFinding(format!("final size relation: {err:?}")))?
    };

    Ok(FinalSize {
        susceptible,
        recovered: n - susceptible,
        attack_rate: if start.susceptible > 0.0 {
            (start.susceptible - susceptible) / start.susceptible
        } else {
            0.0
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexNumber {
    pub re: f64,
    pub im: f64,
}

/// Linearisation of the vector field at one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityReport {
    /// Row-major 3x3 Jacobian.
    pub jacobian: Vec<f64>,
    /// Spectrum of the full Jacobian. The R column is zero, so 0 is always
    /// one of these.
    pub eigenvalues: Vec<ComplexNumber>,
    /// Linear growth rate of the infected compartment, β S / N - γ. Equals
    /// β - γ at the disease-free equilibrium and turns negative once
    /// S < N / R0.
    pub growth_rate: f64,
}

pub fn jacobian(params: &SirParameters, state: &SirState) -> Vec<f64> {
    let beta_n = params.contact_rate() / params.population();
    let gamma = params.recovery_rate();
    let (s, i) = (state.susceptible, state.infected);
    vec![
        -beta_n * i,
        -beta_n * s,
        0.0,
        beta_n * i,
        beta_n * s - gamma,
        0.0,
        0.0,
        gamma,
        0.0,
    ]
}

pub fn stability(params: &SirParameters, state: &SirState) -> Result<StabilityReport> {
    if state.to_vec().iter().any(|v| !v.is_finite()) {
        return Err(SirError::InvalidState(format!(
            "cannot linearise at a non-finite state {state:?}"
        )));
    }

    let jacobian = jacobian(params, state);
    let matrix = DMatrix::from_row_slice(3, 3, &jacobian);
    let eigenvalues: Vec<ComplexNumber> = matrix
        .complex_eigenvalues()
        .iter()
        .map(|lambda| ComplexNumber {
            re: lambda.re,
            im: lambda.im,
        })
        .collect();
    let growth_rate = jacobian[INFECTED * 3 + INFECTED];

    Ok(StabilityReport {
        jacobian,
        eigenvalues,
        growth_rate,
    })
}

/// Headline numbers for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpidemicSummary {
    pub basic_reproduction_number: f64,
    pub herd_immunity_threshold: f64,
    pub initial_growth_rate: f64,
    pub peak_time: f64,
    pub peak_infected: f64,
    pub final_time: f64,
    pub final_state: SirState,
    /// Fraction of the initial susceptibles infected by the end of the grid.
    pub attack_rate: f64,
    pub final_size: FinalSize,
    pub max_population_drift: f64,
}

pub fn summarize(
    params: &SirParameters,
    initial: &InitialConditions,
    trajectory: &Trajectory,
) -> Result<EpidemicSummary> {
    let empty = || SirError::InvalidTimeGrid("trajectory has no samples".into());
    let start = trajectory.initial_state().ok_or_else(empty)?;
    let end = trajectory.final_state().ok_or_else(empty)?;
    let (peak_time, peak_infected) = trajectory.peak_infected().ok_or_else(empty)?;
    let final_time = trajectory.time[trajectory.len() - 1];

    Ok(EpidemicSummary {
        basic_reproduction_number: params.basic_reproduction_number(),
        herd_immunity_threshold: params.herd_immunity_threshold(),
        initial_growth_rate: stability(params, &start)?.growth_rate,
        peak_time,
        peak_infected,
        final_time,
        final_state: end,
        attack_rate: if start.susceptible > 0.0 {
            (start.susceptible - end.susceptible) / start.susceptible
        } else {
            0.0
        },
        final_size: final_size(params, initial)?,
        max_population_drift: trajectory.max_population_drift(params.population()),
    })
}
