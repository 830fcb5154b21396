//! Error taxonomy
//!
//! Only construction and precondition failures are errors. Timeouts, tick
//! budgets, stalls and cancellation are normal loop exits and are reported
//! through [`Termination`](crate::motion::Termination) instead.

use core::fmt;

use crate::traits::MotorError;

/// A raw power value fell outside the legal interval of its type
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangeError {
    /// Offending value
    pub value: f64,
    /// Lower bound of the legal interval (inclusive)
    pub min: f64,
    /// Upper bound of the legal interval (inclusive)
    pub max: f64,
}

impl RangeError {
    /// Check `value` against `[min, max]`
    ///
    /// NaN is never in range.
    pub(crate) fn check(value: f64, min: f64, max: f64) -> Result<f64, RangeError> {
        if value >= min && value <= max {
            Ok(value)
        } else {
            Err(RangeError { value, min, max })
        }
    }
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} outside [{}, {}]", self.value, self.min, self.max)
    }
}

/// Configuration field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigField {
    TicksPerRevolution,
    RatedRpm,
    PowerIncrement,
    CyclePeriod,
    StallTolerance,
    StallWindow,
    TurnGain,
    DriveGain,
    LockThreshold,
    WheelDiameter,
    GearReduction,
}

/// Errors raised by the control engine
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError {
    /// Power value outside its legal interval
    OutOfRange(RangeError),
    /// Tick budget below zero
    NegativeTickBudget(i32),
    /// Timeout below zero (ms)
    NegativeTimeout(i64),
    /// Stall tolerance below zero (ticks)
    NegativeStallTolerance(i32),
    /// Stall window below zero (ms)
    NegativeStallWindow(i64),
    /// Slow-down requested where `|start| <= |end|`
    InvalidSlowDown {
        /// Power at the start of the phase
        start: f64,
        /// Power at the end of the phase
        end: f64,
    },
    /// A configuration value is out of range
    InvalidConfig(ConfigField),
    /// The motor binding rejected a command
    Motor(MotorError),
}

impl From<RangeError> for ControlError {
    fn from(e: RangeError) -> Self {
        ControlError::OutOfRange(e)
    }
}

impl From<MotorError> for ControlError {
    fn from(e: MotorError) -> Self {
        ControlError::Motor(e)
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::OutOfRange(e) => write!(f, "power {}", e),
            ControlError::NegativeTickBudget(t) => write!(f, "negative tick budget {}", t),
            ControlError::NegativeTimeout(ms) => write!(f, "negative timeout {} ms", ms),
            ControlError::NegativeStallTolerance(t) => {
                write!(f, "negative stall tolerance {} ticks", t)
            }
            ControlError::NegativeStallWindow(ms) => write!(f, "negative stall window {} ms", ms),
            ControlError::InvalidSlowDown { start, end } => {
                write!(f, "slow-down from {} to {} does not reduce power", start, end)
            }
            ControlError::InvalidConfig(field) => write!(f, "invalid config field {:?}", field),
            ControlError::Motor(e) => write!(f, "motor error {:?}", e),
        }
    }
}

/// Validate a caller-supplied tick budget
pub fn check_tick_budget(ticks: i32) -> Result<u32, ControlError> {
    u32::try_from(ticks).map_err(|_| ControlError::NegativeTickBudget(ticks))
}

/// Validate a caller-supplied timeout or duration in milliseconds
pub fn check_timeout(ms: i64) -> Result<u64, ControlError> {
    u64::try_from(ms).map_err(|_| ControlError::NegativeTimeout(ms))
}
