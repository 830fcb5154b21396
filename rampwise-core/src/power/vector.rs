//! Signed power vector

use super::{sign, PowerMagnitude};
use crate::error::RangeError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Travel direction of a power command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Positive power, increasing tick count
    #[default]
    Forward,
    /// Negative power, decreasing tick count
    Reverse,
}

impl Direction {
    /// +1 for forward, -1 for reverse
    pub const fn sign(self) -> i8 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }

    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// Signed motor power in `[-1, 1]`
///
/// Arithmetic results are re-validated. Intermediates that may legally
/// leave the interval (such as the difference of two extreme vectors)
/// should be computed on [`PowerVector::value`] and only the final,
/// clipped value wrapped again.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f64", into = "f64"))]
pub struct PowerVector(f64);

impl PowerVector {
    /// No power
    pub const ZERO: Self = Self(0.0);
    /// Full power forward
    pub const FULL_FORWARD: Self = Self(1.0);
    /// Full power reverse
    pub const FULL_REVERSE: Self = Self(-1.0);

    /// Create a vector, rejecting values outside `[-1, 1]`
    pub fn new(raw: f64) -> Result<Self, RangeError> {
        RangeError::check(raw, -1.0, 1.0).map(Self)
    }

    /// Create a vector by clipping `raw` into `[-1, 1]`
    ///
    /// NaN maps to zero power.
    pub fn saturating(raw: f64) -> Self {
        if raw.is_nan() {
            Self::ZERO
        } else {
            Self(raw.clamp(-1.0, 1.0))
        }
    }

    /// Combine a magnitude with an explicit direction
    pub fn from_magnitude(magnitude: PowerMagnitude, direction: Direction) -> Self {
        Self(magnitude.value() * f64::from(direction.sign()))
    }

    /// Raw signed value
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Unsigned size of this vector
    pub fn magnitude(self) -> PowerMagnitude {
        PowerMagnitude::from(self)
    }

    /// Sign of the vector: -1, 0 or +1
    pub fn direction(self) -> i8 {
        sign(self.0)
    }

    /// Negate in place
    pub fn reverse_direction(&mut self) {
        self.0 = -self.0;
    }

    /// Add, failing if the sum leaves `[-1, 1]`
    pub fn add(self, other: PowerVector) -> Result<PowerVector, RangeError> {
        PowerVector::new(self.0 + other.0)
    }

    /// Subtract, failing if the difference leaves `[-1, 1]`
    pub fn subtract(self, other: PowerVector) -> Result<PowerVector, RangeError> {
        PowerVector::new(self.0 - other.0)
    }

    /// Scale by a plain factor, failing if the product leaves `[-1, 1]`
    pub fn multiply(self, factor: f64) -> Result<PowerVector, RangeError> {
        PowerVector::new(self.0 * factor)
    }

    /// Divide by a plain divisor, failing if the quotient leaves `[-1, 1]`
    pub fn divide(self, divisor: f64) -> Result<PowerVector, RangeError> {
        PowerVector::new(self.0 / divisor)
    }
}

impl TryFrom<f64> for PowerVector {
    type Error = RangeError;

    fn try_from(raw: f64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<PowerVector> for f64 {
    fn from(v: PowerVector) -> f64 {
        v.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_bounds() {
        assert!(PowerVector::new(-1.0).is_ok());
        assert!(PowerVector::new(1.0).is_ok());
        assert!(PowerVector::new(-1.5).is_err());
        assert!(PowerVector::new(1.5).is_err());
    }

    #[test]
    fn test_direction_signum() {
        assert_eq!(PowerVector::new(0.3).unwrap().direction(), 1);
        assert_eq!(PowerVector::new(-0.3).unwrap().direction(), -1);
        assert_eq!(PowerVector::ZERO.direction(), 0);
        assert_eq!(PowerVector::new(-0.0).unwrap().direction(), 0);
    }

    #[test]
    fn test_reverse_direction() {
        let mut v = PowerVector::new(0.4).unwrap();
        v.reverse_direction();
        assert_eq!(v.value(), -0.4);
        v.reverse_direction();
        assert_eq!(v.value(), 0.4);
    }

    #[test]
    fn test_from_magnitude() {
        let m = PowerMagnitude::new(0.6).unwrap();
        assert_eq!(PowerVector::from_magnitude(m, Direction::Forward).value(), 0.6);
        assert_eq!(PowerVector::from_magnitude(m, Direction::Reverse).value(), -0.6);
    }

    #[test]
    fn test_extreme_difference_needs_plain_intermediate() {
        let a = PowerVector::FULL_FORWARD;
        let b = PowerVector::FULL_REVERSE;
        assert!(a.subtract(b).is_err());
        let delta = a.value() - b.value();
        assert_eq!(delta, 2.0);
        assert_eq!(PowerVector::saturating(delta), PowerVector::FULL_FORWARD);
    }

    #[test]
    fn test_arithmetic() {
        let a = PowerVector::new(0.5).unwrap();
        let b = PowerVector::new(0.25).unwrap();
        assert_eq!(a.add(b).unwrap().value(), 0.75);
        assert_eq!(a.subtract(b).unwrap().value(), 0.25);
        assert_eq!(a.multiply(-2.0).unwrap().value(), -1.0);
        assert_eq!(b.divide(0.5).unwrap().value(), 0.5);
        assert!(a.multiply(3.0).is_err());
        assert!(a.divide(0.1).is_err());
    }

    #[test]
    fn test_saturating() {
        assert_eq!(PowerVector::saturating(-7.0).value(), -1.0);
        assert_eq!(PowerVector::saturating(0.3).value(), 0.3);
        assert_eq!(PowerVector::saturating(f64::NAN), PowerVector::ZERO);
    }
}
