//! Unsigned power magnitude

use super::PowerVector;
use crate::error::RangeError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unsigned motor power in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f64", into = "f64"))]
pub struct PowerMagnitude(f64);

impl PowerMagnitude {
    /// No power
    pub const ZERO: Self = Self(0.0);
    /// Full power
    pub const FULL: Self = Self(1.0);

    /// Create a magnitude, rejecting values outside `[0, 1]`
    pub fn new(raw: f64) -> Result<Self, RangeError> {
        RangeError::check(raw, 0.0, 1.0).map(Self)
    }

    /// Raw value
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Subtract another magnitude
    ///
    /// Fails when the difference would be negative.
    pub fn subtract(self, other: PowerMagnitude) -> Result<PowerMagnitude, RangeError> {
        PowerMagnitude::new(self.0 - other.0)
    }

    /// Ratio of two magnitudes
    ///
    /// The quotient is a plain number and may exceed 1. Re-validate with
    /// [`PowerMagnitude::new`] before treating it as power again.
    pub fn divide_by(self, other: PowerMagnitude) -> f64 {
        self.0 / other.0
    }
}

impl From<PowerVector> for PowerMagnitude {
    fn from(vector: PowerVector) -> Self {
        // |v| of a valid vector is always within [0, 1]
        Self(libm::fabs(vector.value()))
    }
}

impl TryFrom<f64> for PowerMagnitude {
    type Error = RangeError;

    fn try_from(raw: f64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<PowerMagnitude> for f64 {
    fn from(m: PowerMagnitude) -> f64 {
        m.0
    }
}
