use crate::error::{Result, SirError};
use serde::{Deserialize, Serialize};

/// Ordered, non-decreasing sample times at which a solution is reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct TimeGrid {
    points: Vec<f64>,
}

impl TimeGrid {
    pub fn new(points: Vec<f64>) -> Result<Self> {
        if points.is_empty() {
            return Err(SirError::InvalidTimeGrid(
                "grid must contain at least one point".into(),
            ));
        }
        if let Some(bad) = points.iter().find(|t| !t.is_finite()) {
            return Err(SirError::InvalidTimeGrid(format!(
                "grid points must be finite (got {bad})"
            )));
        }
        if let Some(idx) = points.windows(2).position(|w| w[1] < w[0]) {
            return Err(SirError::InvalidTimeGrid(format!(
                "grid must be non-decreasing ({} follows {} at index {})",
                points[idx + 1],
                points[idx],
                idx + 1
            )));
        }
        Ok(Self { points })
    }

    /// `points` evenly spaced samples over [start, end], both ends included.
    pub fn linspace(start: f64, end: f64, points: usize) -> Result<Self> {
        if points == 0 {
            return Err(SirError::InvalidTimeGrid(
                "linspace needs at least one point".into(),
            ));
        }
        if !start.is_finite() || !end.is_finite() || end < start {
            return Err(SirError::InvalidTimeGrid(format!(
                "linspace range must be finite with end >= start (got {start}..{end})"
            )));
        }
        if points == 1 {
            return Self::new(vec![start]);
        }
        let span = end - start;
        let last = (points - 1) as f64;
        let mut values: Vec<f64> = (0..points)
            .map(|i| start + span * (i as f64) / last)
            .collect();
        values[points - 1] = end;
        Self::new(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.points[0]
    }

    pub fn end(&self) -> f64 {
        self.points[self.points.len() - 1]
    }
}

impl TryFrom<Vec<f64>> for TimeGrid {
    type Error = SirError;

    fn try_from(points: Vec<f64>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<TimeGrid> for Vec<f64> {
    fn from(grid: TimeGrid) -> Self {
        grid.points
    }
}
