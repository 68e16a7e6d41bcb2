use crate::traits::{DynamicalSystem, EmbeddedSteppable, Scalar, Steppable};

fn constant<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap()
}

/// Writes `out[i] = base[i] + dt * Σ_j weights[j] * stages[j][i]`.
fn combine<T: Scalar>(out: &mut [T], base: &[T], dt: T, weights: &[T], stages: &[&[T]]) {
    for i in 0..base.len() {
        let mut acc = T::zero();
        for (w, k) in weights.iter().zip(stages) {
            acc = acc + *w * k[i];
        }
        out[i] = base[i] + dt * acc;
    }
}

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![T::zero(); dim],
            k2: vec![T::zero(); dim],
            k3: vec![T::zero(); dim],
            k4: vec![T::zero(); dim],
            tmp: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let half = constant::<T>(0.5);
        let sixth = constant::<T>(1.0 / 6.0);
        let two = constant::<T>(2.0);
        let t0 = *t;

        system.apply(t0, state, &mut self.k1);

        combine(&mut self.tmp, state, dt, &[half], &[self.k1.as_slice()]);
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2);

        combine(&mut self.tmp, state, dt, &[half], &[self.k2.as_slice()]);
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3);

        combine(&mut self.tmp, state, dt, &[T::one()], &[self.k3.as_slice()]);
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        let weights = [sixth, two * sixth, two * sixth, sixth];
        combine(
            &mut self.tmp,
            state,
            dt,
            &weights,
            &[&self.k1[..], &self.k2[..], &self.k3[..], &self.k4[..]],
        );
        state.copy_from_slice(&self.tmp);

        *t = t0 + dt;
    }
}

/// Tsitouras 5(4) tableau.
mod tsit5 {
    pub const C: [f64; 6] = [0.0, 0.161, 0.327, 0.9, 0.9800255409045097, 1.0];

    pub const A2: [f64; 1] = [0.161];
    pub const A3: [f64; 2] = [-0.008480655492356989, 0.335480655492357];
    pub const A4: [f64; 3] = [2.897153057105493, -6.359448489975075, 4.3622954328695815];
    pub const A5: [f64; 4] = [
        5.325864828439257,
        -11.748883564062828,
        7.4955393428898365,
        -0.09249506636175525,
    ];
    pub const A6: [f64; 5] = [
        5.86145544294642,
        -12.92096931784711,
        8.159367898576159,
        -0.071584973281401,
        -0.028269050394068383,
    ];

    /// Fifth-order weights; also the last row of A (FSAL).
    pub const B: [f64; 6] = [
        0.09646076681806523,
        0.01,
        0.4798896504144996,
        1.379008574103742,
        -3.290069515436081,
        2.324710524099774,
    ];

    /// Difference between the fifth- and fourth-order weights, last entry
    /// applied to f(t + dt, y_next).
    pub const BTILDE: [f64; 7] = [
        -0.00178001105222577714,
        -0.0008164344596567469,
        0.007880878010261995,
        -0.1447110071732629,
        0.5823571654525552,
        -0.45808210592918697,
        0.015151515151515152,
    ];
}

/// Tsitouras 5/4 Solver
pub struct Tsit5<T: Scalar> {
    k: [Vec<T>; 7],
    tmp: Vec<T>,
    next: Vec<T>,
}

impl<T: Scalar> Tsit5<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k: std::array::from_fn(|_| vec![T::zero(); dim]),
            tmp: vec![T::zero(); dim],
            next: vec![T::zero(); dim],
        }
    }

    /// Evaluates stages k1..k6 and writes the fifth-order solution into `out`.
    fn advance(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t0: T,
        state: &[T],
        dt: T,
        out: &mut [T],
    ) {
        let c = tsit5::C.map(constant::<T>);
        let rows: [&[f64]; 5] = [&tsit5::A2, &tsit5::A3, &tsit5::A4, &tsit5::A5, &tsit5::A6];

        system.apply(t0, state, &mut self.k[0]);

        for (stage, row) in rows.iter().enumerate() {
            let weights: Vec<T> = row.iter().map(|&a| constant(a)).collect();
            {
                let (done, _) = self.k.split_at(stage + 1);
                let stages: Vec<&[T]> = done.iter().map(|k| k.as_slice()).collect();
                combine(&mut self.tmp, state, dt, &weights, &stages);
            }
            system.apply(t0 + c[stage + 1] * dt, &self.tmp, &mut self.k[stage + 1]);
        }

        let weights = tsit5::B.map(constant::<T>);
        let stages: Vec<&[T]> = self.k[..6].iter().map(|k| k.as_slice()).collect();
        combine(out, state, dt, &weights, &stages);
    }
}

impl<T: Scalar> Steppable<T> for Tsit5<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let mut next = std::mem::take(&mut self.next);
        self.advance(system, *t, state, dt, &mut next);
        state.copy_from_slice(&next);
        self.next = next;
        *t = *t + dt;
    }
}

impl<T: Scalar> EmbeddedSteppable<T> for Tsit5<T> {
    fn try_step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: T,
        state: &[T],
        dt: T,
        candidate: &mut [T],
        error: &mut [T],
    ) {
        self.advance(system, t, state, dt, candidate);
        system.apply(t + dt, candidate, &mut self.k[6]);

        let weights = tsit5::BTILDE.map(constant::<T>);
        for i in 0..state.len() {
            let mut acc = T::zero();
            for (w, k) in weights.iter().zip(&self.k) {
                acc = acc + *w * k[i];
            }
            error[i] = dt * acc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Decay {
        rate: f64,
    }

    impl DynamicalSystem<f64> for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -self.rate * x[0];
        }
    }

    struct Rotation;

    impl DynamicalSystem<f64> for Rotation {
        fn dimension(&self) -> usize {
            2
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -x[1];
            out[1] = x[0];
        }
    }

    #[test]
    fn rk4_tracks_exponential_decay() {
        let system = Decay { rate: 0.5 };
        let mut solver = RK4::new(1);
        let mut t = 0.0;
        let mut state = [2.0];
        for _ in 0..100 {
            solver.step(&system, &mut t, &mut state, 0.05);
        }
        assert_relative_eq!(t, 5.0, epsilon = 1e-12);
        assert_relative_eq!(state[0], 2.0 * (-2.5f64).exp(), max_relative = 1e-7);
    }

    #[test]
    fn tsit5_is_more_accurate_than_rk4_on_rotation() {
        let system = Rotation;
        let mut rk4 = RK4::new(2);
        let mut tsit5 = Tsit5::new(2);
        let (mut t_rk, mut t_ts) = (0.0, 0.0);
        let mut x_rk = [1.0, 0.0];
        let mut x_ts = [1.0, 0.0];
        for _ in 0..20 {
            rk4.step(&system, &mut t_rk, &mut x_rk, 0.1);
            tsit5.step(&system, &mut t_ts, &mut x_ts, 0.1);
        }
        let exact = [2.0f64.cos(), 2.0f64.sin()];
        let err_rk = (x_rk[0] - exact[0]).abs() + (x_rk[1] - exact[1]).abs();
        let err_ts = (x_ts[0] - exact[0]).abs() + (x_ts[1] - exact[1]).abs();
        assert!(err_ts < err_rk, "tsit5 error {err_ts} vs rk4 error {err_rk}");
        assert!(err_ts < 1e-6);
    }

    #[test]
    fn tsit5_tableau_is_consistent() {
        let rows: [&[f64]; 6] = [
            &tsit5::A2,
            &tsit5::A3,
            &tsit5::A4,
            &tsit5::A5,
            &tsit5::A6,
            &tsit5::B,
        ];
        let nodes = [tsit5::C[1], tsit5::C[2], tsit5::C[3], tsit5::C[4], tsit5::C[5], 1.0];
        for (row, c) in rows.iter().zip(nodes) {
            assert_relative_eq!(row.iter().sum::<f64>(), c, epsilon = 1e-12);
        }
        assert_relative_eq!(tsit5::BTILDE.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn tsit5_converges_at_fifth_order() {
        let error_with = |dt: f64, steps: usize| {
            let mut solver = Tsit5::new(2);
            let mut t = 0.0;
            let mut x = [1.0, 0.0];
            for _ in 0..steps {
                solver.step(&Rotation, &mut t, &mut x, dt);
            }
            (x[0] - 4.0f64.cos()).abs() + (x[1] - 4.0f64.sin()).abs()
        };
        let coarse = error_with(0.2, 20);
        let fine = error_with(0.1, 40);
        let ratio = coarse / fine;
        assert!(ratio > 24.0, "halving dt reduced the error only {ratio}x");
    }

    #[test]
    fn try_step_leaves_input_untouched_and_estimates_small_error() {
        let system = Decay { rate: 1.0 };
        let mut solver = Tsit5::new(1);
        let state = [1.0];
        let mut candidate = [0.0];
        let mut error = [0.0];
        solver.try_step(&system, 0.0, &state, 0.1, &mut candidate, &mut error);

        assert_eq!(state[0], 1.0);
        assert_relative_eq!(candidate[0], (-0.1f64).exp(), max_relative = 1e-7);
        assert!(error[0].abs() < 1e-6, "error estimate {}", error[0]);
    }

    #[test]
    fn repeated_steps_match_trial_steps() {
        let system = Rotation;
        let mut stepper = Tsit5::new(2);
        let mut trial = Tsit5::new(2);
        let mut t = 0.0;
        let mut x = [1.0, 0.0];
        let mut expected = [1.0, 0.0];
        let mut candidate = [0.0; 2];
        let mut error = [0.0; 2];
        for _ in 0..5 {
            trial.try_step(&system, t, &expected, 0.1, &mut candidate, &mut error);
            expected = candidate;
            stepper.step(&system, &mut t, &mut x, 0.1);
            assert_eq!(x, expected);
        }
    }

    #[test]
    fn error_estimate_shrinks_with_step_size() {
        let system = Decay { rate: 3.0 };
        let mut solver = Tsit5::new(1);
        let mut candidate = [0.0];
        let mut coarse = [0.0];
        let mut fine = [0.0];
        solver.try_step(&system, 0.0, &[1.0], 0.4, &mut candidate, &mut coarse);
        solver.try_step(&system, 0.0, &[1.0], 0.1, &mut candidate, &mut fine);
        assert!(fine[0].abs() < coarse[0].abs());
    }
}
