use crate::model::SirState;
use serde::{Deserialize, Serialize};

/// Sampled S, I, R series, one entry per grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub time: Vec<f64>,
    pub susceptible: Vec<f64>,
    pub infected: Vec<f64>,
    pub recovered: Vec<f64>,
}

impl Trajectory {
    pub(crate) fn with_capacity(len: usize) -> Self {
        Self {
            time: Vec::with_capacity(len),
            susceptible: Vec::with_capacity(len),
            infected: Vec::with_capacity(len),
            recovered: Vec::with_capacity(len),
        }
    }

    pub(crate) fn push(&mut self, t: f64, state: &SirState) {
        self.time.push(t);
        self.susceptible.push(state.susceptible);
        self.infected.push(state.infected);
        self.recovered.push(state.recovered);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn state_at(&self, index: usize) -> Option<SirState> {
        Some(SirState {
            susceptible: *self.susceptible.get(index)?,
            infected: *self.infected.get(index)?,
            recovered: *self.recovered.get(index)?,
        })
    }

    pub fn initial_state(&self) -> Option<SirState> {
        self.state_at(0)
    }

    pub fn final_state(&self) -> Option<SirState> {
        self.state_at(self.len().checked_sub(1)?)
    }

    /// Iterates over (t, state) pairs in grid order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, SirState)> + '_ {
        (0..self.len()).filter_map(move |idx| Some((self.time[idx], self.state_at(idx)?)))
    }

    /// Time and size of the largest sampled infected count. Ties keep the
    /// earliest sample.
    pub fn peak_infected(&self) -> Option<(f64, f64)> {
        self.time
            .iter()
            .zip(&self.infected)
            .fold(None, |best: Option<(f64, f64)>, (&t, &i)| match best {
                Some((_, peak)) if peak >= i => best,
                _ => Some((t, i)),
            })
    }

    /// Largest |S + I + R - N| over all samples.
    pub fn max_population_drift(&self, population: f64) -> f64 {
        self.iter()
            .map(|(_, state)| (state.total() - population).abs())
            .fold(0.0, f64::max)
    }
}
