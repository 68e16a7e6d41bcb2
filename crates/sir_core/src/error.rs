use thiserror::Error;

/// Errors raised while validating inputs or integrating the model.
#[derive(Debug, Error)]
pub enum SirError {
    #[error("{name} must be a finite positive number (got {value})")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("initial {name} count must be finite and non-negative (got {value})")]
    NegativeInitialCount { name: &'static str, value: f64 },

    #[error(
        "initial infected ({infected}) plus recovered ({recovered}) exceeds population ({population})"
    )]
    InitialCountsExceedPopulation {
        infected: f64,
        recovered: f64,
        population: f64,
    },

    #[error("invalid time grid: {0}")]
    InvalidTimeGrid(String),

    #[error("invalid solver settings: {0}")]
    InvalidSolverSettings(String),

    #[error("state dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("step size underflow at t = {t} (dt = {dt:e})")]
    StepSizeUnderflow { t: f64, dt: f64 },

    #[error("exceeded {max_steps} integration steps before reaching t = {target} (stopped at t = {t})")]
    MaxStepsExceeded { max_steps: usize, t: f64, target: f64 },

    #[error("state became non-finite at t = {t}")]
    NonFiniteState { t: f64 },

    #[error("root finding failed: {0}")]
    RootFinding(String),

    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SirError>;
