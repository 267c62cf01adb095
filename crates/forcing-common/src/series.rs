//! Extracted points and the per-step series built from them.

use serde::{Deserialize, Serialize};

/// Coordinate tolerance (target CRS units) when comparing point positions
/// between time steps.
pub const POSITION_TOLERANCE: f64 = 1e-6;

/// A grid value with its position in the domain's planar CRS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPoint {
    pub value: f64,
    pub x: f64,
    pub y: f64,
}

impl ExtractedPoint {
    pub fn new(value: f64, x: f64, y: f64) -> Self {
        Self { value, x, y }
    }

    fn same_position(&self, other: &ExtractedPoint, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl From<(f64, f64, f64)> for ExtractedPoint {
    fn from((value, x, y): (f64, f64, f64)) -> Self {
        Self { value, x, y }
    }
}

/// One vector of points per time step, ordered by time.
///
/// Steps carry no timestamp; step `i` is `i * dt` seconds after the first.
pub type TimeSeries = Vec<Vec<ExtractedPoint>>;

/// Offset subtracted from every output coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Shift {
    pub dx: f64,
    pub dy: f64,
}

impl Shift {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.dx, y - self.dy)
    }
}

impl From<(f64, f64)> for Shift {
    fn from((dx, dy): (f64, f64)) -> Self {
        Self { dx, dy }
    }
}

/// A step whose points do not line up with the first step.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlignmentError {
    #[error("step {step} has {actual} points, step 0 has {expected}")]
    PointCount {
        step: usize,
        expected: usize,
        actual: usize,
    },

    #[error("point {point} of step {step} is not at the position it has in step 0")]
    Position { step: usize, point: usize },
}

/// Verify every step has the same points, in the same order, as step 0.
pub fn check_alignment(series: &[Vec<ExtractedPoint>]) -> Result<(), AlignmentError> {
    let Some(first) = series.first() else {
        return Ok(());
    };

    for (step, points) in series.iter().enumerate().skip(1) {
        if points.len() != first.len() {
            return Err(AlignmentError::PointCount {
                step,
                expected: first.len(),
                actual: points.len(),
            });
        }
        if let Some(point) = points
            .iter()
            .zip(first)
            .position(|(p, q)| !p.same_position(q, POSITION_TOLERANCE))
        {
            return Err(AlignmentError::Position { step, point });
        }
    }
    Ok(())
}
