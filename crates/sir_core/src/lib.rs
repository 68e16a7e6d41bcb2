pub mod analysis;
pub mod config;
pub mod error;
pub mod grid;
pub mod integrate;
pub mod model;
pub mod solvers;
pub mod trajectory;
/// The `sir_core` crate integrates the SIR epidemic compartment model for a
/// closed population.
///
/// Key components:
/// - **Traits**: `Scalar`, `DynamicalSystem` (vector fields), `Steppable` and
///   `EmbeddedSteppable` (solvers).
/// - **Solvers**: fixed-step RK4 and the Tsit5 5(4) pair.
/// - **Model**: validated parameters, initial conditions and the SIR vector field.
/// - **Integrate**: grid-sampled integration, fixed-step or adaptive.
/// - **Analysis**: final size, linear stability and run summaries.
/// - **Config**: JSON run descriptions with reference defaults.
pub mod traits;

pub use config::SirConfig;
pub use error::{Result, SirError};
pub use grid::TimeGrid;
pub use integrate::{simulate, AdaptiveSettings, IntegrationMethod};
pub use model::{InitialConditions, SirModel, SirParameters, SirState};
pub use trajectory::Trajectory;
