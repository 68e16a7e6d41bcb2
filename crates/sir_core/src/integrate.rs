use crate::{
    error::{Result, SirError},
    grid::TimeGrid,
    model::{InitialConditions, SirModel, SirParameters, SirState},
    solvers::{Tsit5, RK4},
    traits::{DynamicalSystem, EmbeddedSteppable, Steppable},
    trajectory::Trajectory,
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Error-control settings for the adaptive Tsit5 driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveSettings {
    pub rtol: f64,
    pub atol: f64,
    /// Multiplier applied to the optimal step size estimate.
    pub safety: f64,
    pub min_factor: f64,
    pub max_factor: f64,
    /// Budget of attempted steps (accepted + rejected) for the whole grid.
    pub max_steps: usize,
    pub min_step: f64,
    pub initial_step: Option<f64>,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-10,
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 5.0,
            max_steps: 100_000,
            min_step: 1e-12,
            initial_step: None,
        }
    }
}

impl AdaptiveSettings {
    fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SirError::InvalidSolverSettings(msg));
        if !(self.rtol >= 0.0 && self.atol >= 0.0 && self.rtol + self.atol > 0.0) {
            return invalid(format!(
                "tolerances must be non-negative and not both zero (rtol = {}, atol = {})",
                self.rtol, self.atol
            ));
        }
        if !(self.safety > 0.0 && self.safety <= 1.0) {
            return invalid(format!("safety must lie in (0, 1] (got {})", self.safety));
        }
        if !(self.min_factor > 0.0 && self.min_factor < 1.0 && self.max_factor > 1.0) {
            return invalid(format!(
                "step factors must satisfy 0 < min_factor < 1 < max_factor (got {} and {})",
                self.min_factor, self.max_factor
            ));
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be greater than zero".into());
        }
        if !(self.min_step > 0.0 && self.min_step.is_finite()) {
            return invalid(format!("min_step must be positive (got {})", self.min_step));
        }
        if let Some(h) = self.initial_step {
            if !(h > 0.0 && h.is_finite()) {
                return invalid(format!("initial_step must be positive (got {h})"));
            }
        }
        Ok(())
    }
}

fn default_substeps() -> usize {
    1
}

/// How the solution is advanced between grid points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "solver", rename_all = "snake_case")]
pub enum IntegrationMethod {
    /// Fixed-step RK4 on the output grid, each interval split into
    /// `substeps` equal steps.
    Rk4 {
        #[serde(default = "default_substeps")]
        substeps: usize,
    },
    /// Tsit5 with local error control. Steps are cut short so that every
    /// grid point is hit exactly.
    Adaptive(AdaptiveSettings),
}

impl Default for IntegrationMethod {
    fn default() -> Self {
        IntegrationMethod::Adaptive(AdaptiveSettings::default())
    }
}

impl IntegrationMethod {
    pub fn validate(&self) -> Result<()> {
        match self {
            IntegrationMethod::Rk4 { substeps } if *substeps == 0 => Err(
                SirError::InvalidSolverSettings("substeps must be at least 1".into()),
            ),
            IntegrationMethod::Rk4 { .. } => Ok(()),
            IntegrationMethod::Adaptive(settings) => settings.validate(),
        }
    }
}

fn ensure_finite(state: &[f64], t: f64) -> Result<()> {
    if state.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SirError::NonFiniteState { t })
    }
}

/// Integrates `system` from `initial` at the first grid point and returns the
/// state at every grid point. The first entry is `initial` unchanged.
pub fn integrate_on_grid<S: DynamicalSystem<f64>>(
    system: &S,
    initial: &[f64],
    grid: &TimeGrid,
    method: &IntegrationMethod,
) -> Result<Vec<Vec<f64>>> {
    let dim = system.dimension();
    if initial.len() != dim {
        return Err(SirError::DimensionMismatch {
            expected: dim,
            actual: initial.len(),
        });
    }
    ensure_finite(initial, grid.start())?;
    method.validate()?;

    match method {
        IntegrationMethod::Rk4 { substeps } => integrate_fixed(system, initial, grid, *substeps),
        IntegrationMethod::Adaptive(settings) => {
            integrate_adaptive(system, initial, grid, settings)
        }
    }
}

fn integrate_fixed<S: DynamicalSystem<f64>>(
    system: &S,
    initial: &[f64],
    grid: &TimeGrid,
    substeps: usize,
) -> Result<Vec<Vec<f64>>> {
    let points = grid.as_slice();
    let mut solver = RK4::new(initial.len());
    let mut state = initial.to_vec();
    let mut t = points[0];
    let mut samples = Vec::with_capacity(points.len());
    samples.push(state.clone());

    for &target in &points[1..] {
        if target > t {
            let dt = (target - t) / substeps as f64;
            for _ in 0..substeps {
                solver.step(system, &mut t, &mut state, dt);
            }
            t = target;
            ensure_finite(&state, t)?;
        }
        samples.push(state.clone());
    }

    debug!(
        "rk4 integration finished: {} grid points, {} steps",
        points.len(),
        (points.len() - 1) * substeps
    );
    Ok(samples)
}

/// RMS of the error scaled by atol + rtol * max(|y|, |y_next|). A component
/// with zero error contributes nothing, even where the scale is zero.
fn error_norm(state: &[f64], candidate: &[f64], error: &[f64], settings: &AdaptiveSettings) -> f64 {
    if candidate.iter().any(|v| !v.is_finite()) {
        return f64::INFINITY;
    }
    let sum: f64 = state
        .iter()
        .zip(candidate)
        .zip(error)
        .map(|((y, y_next), e)| {
            if *e == 0.0 {
                return 0.0;
            }
            let scale = settings.atol + settings.rtol * y.abs().max(y_next.abs());
            (e / scale).powi(2)
        })
        .sum();
    (sum / state.len() as f64).sqrt()
}

fn integrate_adaptive<S: DynamicalSystem<f64>>(
    system: &S,
    initial: &[f64],
    grid: &TimeGrid,
    settings: &AdaptiveSettings,
) -> Result<Vec<Vec<f64>>> {
    let points = grid.as_slice();
    let dim = initial.len();
    let mut stepper = Tsit5::new(dim);
    let mut candidate = vec![0.0; dim];
    let mut error = vec![0.0; dim];
    let mut state = initial.to_vec();
    let mut t = points[0];
    let mut samples = Vec::with_capacity(points.len());
    samples.push(state.clone());

    let span = grid.end() - grid.start();
    let mut h = settings
        .initial_step
        .unwrap_or(if span > 0.0 { span * 1e-3 } else { 1e-3 });
    let (mut accepted, mut rejected) = (0usize, 0usize);

    for &target in &points[1..] {
        while t < target {
            let remaining = target - t;
            let lands = h >= remaining;
            let dt = if lands { remaining } else { h };

            stepper.try_step(system, t, &state, dt, &mut candidate, &mut error);
            let err = error_norm(&state, &candidate, &error, settings);

            let factor = if !err.is_finite() {
                settings.min_factor
            } else if err == 0.0 {
                settings.max_factor
            } else {
                (settings.safety * err.powf(-0.2)).clamp(settings.min_factor, settings.max_factor)
            };

            if err <= 1.0 {
                t = if lands { target } else { t + dt };
                state.copy_from_slice(&candidate);
                accepted += 1;
                h = if lands { h.max(dt * factor) } else { dt * factor };
                trace!("accepted step to t = {t} (dt = {dt:e}, err = {err:.3e})");
            } else {
                rejected += 1;
                h = dt * factor.min(1.0);
                trace!("rejected step at t = {t} (dt = {dt:e}, err = {err:.3e})");
            }

            if t < target && h < settings.min_step {
                if !err.is_finite() {
                    return Err(SirError::NonFiniteState { t: t + dt });
                }
                return Err(SirError::StepSizeUnderflow { t, dt: h });
            }
            if t < target && accepted + rejected >= settings.max_steps {
                return Err(SirError::MaxStepsExceeded {
                    max_steps: settings.max_steps,
                    t,
                    target,
                });
            }
        }
        samples.push(state.clone());
    }

    debug!(
        "adaptive integration finished: {} grid points, {accepted} accepted and {rejected} rejected steps",
        points.len()
    );
    Ok(samples)
}

/// Validates the inputs, then integrates the SIR model over `grid`.
pub fn simulate(
    params: &SirParameters,
    initial: &InitialConditions,
    grid: &TimeGrid,
    method: &IntegrationMethod,
) -> Result<Trajectory> {
    let start = initial.state(params)?;
    method.validate()?;

    debug!(
        "integrating SIR model: N = {}, beta = {}, gamma = {}, R0 = {:.3}, {} grid points on [{}, {}]",
        params.population(),
        params.contact_rate(),
        params.recovery_rate(),
        params.basic_reproduction_number(),
        grid.len(),
        grid.start(),
        grid.end()
    );

    let model = SirModel::new(*params);
    let samples = integrate_on_grid(&model, &start.to_vec(), grid, method)?;

    let mut trajectory = Trajectory::with_capacity(samples.len());
    for (&t, sample) in grid.as_slice().iter().zip(&samples) {
        trajectory.push(t, &SirState::from_slice(sample)?);
    }
    Ok(trajectory)
}
