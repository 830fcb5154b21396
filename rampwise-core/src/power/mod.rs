//! Bounded power values
//!
//! [`PowerMagnitude`] is an unsigned size in `[0, 1]`; [`PowerVector`] is a
//! signed command in `[-1, 1]`. Both validate on construction and are plain
//! `Copy` values afterwards.

pub mod magnitude;
pub mod vector;

pub use magnitude::PowerMagnitude;
pub use vector::{Direction, PowerVector};

/// Sign of a power value as -1, 0 or +1
///
/// Unlike `f64::signum`, zero (of either sign) maps to 0.
pub fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}
