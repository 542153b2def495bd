//! Knee detection on a ranked cumulative curve.
//!
//! The elbow is the point farthest (perpendicular distance) from the chord
//! joining the first and last points of the curve.

use serde::{Deserialize, Serialize};

/// Relative tolerance below which two distances count as equal.
const DISTANCE_TOLERANCE: f64 = 1e-9;

/// Index of the point with maximum perpendicular distance from the chord
/// between the first and last points.
///
/// Returns 0 for fewer than two points, for a zero-length chord, and for a
/// curve lying on its chord. Ties go to the earliest index.
///
/// Panics if `x` and `y` differ in length.
pub fn find_elbow(x: &[f64], y: &[f64]) -> usize {
    assert_eq!(x.len(), y.len(), "find_elbow: x and y must have equal length");
    let n = x.len();
    if n < 2 {
        return 0;
    }

    let (x0, y0) = (x[0], y[0]);
    let (dx, dy) = (x[n - 1] - x0, y[n - 1] - y0);
    let chord = dx.hypot(dy);
    if chord == 0.0 || !chord.is_finite() {
        return 0;
    }
    let (ux, uy) = (dx / chord, dy / chord);
    let tolerance = DISTANCE_TOLERANCE * chord.max(1.0);

    let mut best_index = 0;
    let mut best_distance = 0.0;
    for i in 0..n {
        let (px, py) = (x[i] - x0, y[i] - y0);
        let projection = px * ux + py * uy;
        let distance = (px - projection * ux).hypot(py - projection * uy);
        if distance > best_distance + tolerance {
            best_index = i;
            best_distance = distance;
        }
    }
    best_index
}

/// A ranked cumulative curve (ranks 1..=N) with its elbow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElbowCurve {
    pub ranks: Vec<f64>,
    pub cumulative: Vec<f64>,
    pub elbow_index: usize,
}

impl ElbowCurve {
    /// Running sum of `contributions` against ranks 1..=N. NaN entries add 0.
    pub fn from_contributions(contributions: &[f64]) -> Self {
        let ranks: Vec<f64> = (1..=contributions.len()).map(|r| r as f64).collect();
        let cumulative: Vec<f64> = contributions
            .iter()
            .scan(0.0, |acc, &c| {
                if !c.is_nan() {
                    *acc += c;
                }
                Some(*acc)
            })
            .collect();
        let elbow_index = find_elbow(&ranks, &cumulative);
        Self {
            ranks,
            cumulative,
            elbow_index,
        }
    }

    /// Number of items up to and including the elbow.
    pub fn optimal_rank(&self) -> usize {
        self.elbow_index + 1
    }

    pub fn optimal_cumulative(&self) -> f64 {
        self.cumulative.get(self.elbow_index).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}
