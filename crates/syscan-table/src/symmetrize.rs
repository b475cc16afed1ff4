use serde::{Deserialize, Serialize};

/// Symmetric replacement of an asymmetric uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Symmetrized {
    /// Symmetric magnitude, never negative.
    pub magnitude: f64,
    /// Offset to add to the central value.
    pub shift: f64,
}

/// Symmetrizes the signed deviations `up` and `down` of a central value.
///
/// Uses the D'Agostini prescription: with `delta = (up + down) / 2` and
/// `avg = (up - down) / 2`, the shift is `delta` and the magnitude is
/// `sqrt(avg^2 + 2 delta^2)`. Swapped or same-signed inputs are accepted.
pub fn symmetrize(up: f64, down: f64) -> Symmetrized {
    let delta = 0.5 * (up + down);
    let average = 0.5 * (up - down);
    Symmetrized {
        magnitude: (average * average + 2.0 * delta * delta).sqrt(),
        shift: delta,
    }
}

/// Sum of the shifts of all sources of one point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShiftAccumulator {
    total: f64,
}

impl ShiftAccumulator {
    /// Symmetrizes a pair, records its shift and returns the magnitude.
    pub fn symmetrize(&mut self, up: f64, down: f64) -> f64 {
        let result = symmetrize(up, down);
        self.total += result.shift;
        result.magnitude
    }

    /// Records a shift computed elsewhere.
    pub fn add(&mut self, shift: f64) {
        self.total += shift;
    }

    /// Accumulated shift.
    pub fn total(&self) -> f64 {
        self.total
    }
}
