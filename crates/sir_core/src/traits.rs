use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars by the steppers.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A continuous-time system dx/dt = f(t, x).
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer receiving dx/dt
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// A solver that advances a system by one fixed step.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// state: current state (updated after step)
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}

/// A solver carrying an embedded lower-order solution, used for error control.
pub trait EmbeddedSteppable<T: Scalar> {
    /// Attempts a step of size dt from (t, state) without touching `state`.
    /// candidate: receives the higher-order solution at t + dt
    /// error: receives the local error estimate for each component
    fn try_step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: T,
        state: &[T],
        dt: T,
        candidate: &mut [T],
        error: &mut [T],
    );
}
