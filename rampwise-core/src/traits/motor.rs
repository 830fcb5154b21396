//! Encoder-equipped DC motor capability

use crate::config::MotorModel;
use crate::power::PowerVector;

/// Errors reported by a motor binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// Motor driver is disabled
    Disabled,
    /// Driver reported a fault (overcurrent, undervoltage)
    Fault,
    /// PWM or GPIO peripheral rejected the write
    Bus,
}

/// A DC motor with a quadrature encoder
///
/// One control loop is the only writer of a given motor at any time.
pub trait EncoderMotor {
    /// Current encoder position in ticks
    ///
    /// The count is relative to power-on and may be negative.
    fn tick_count(&mut self) -> i32;

    /// Power most recently applied
    fn power(&self) -> PowerVector;

    /// Apply a new power command
    fn set_power(&mut self, power: PowerVector) -> Result<(), MotorError>;

    /// Whether the binding is still executing a command of its own
    ///
    /// Bindings without closed-loop hardware report whether power is applied.
    fn is_busy(&self) -> bool;

    /// Rated characteristics of this motor
    fn model(&self) -> MotorModel;

    /// Enter the braking hold state
    ///
    /// The default only removes power; bindings that can short the
    /// windings should override this.
    fn brake(&mut self) -> Result<(), MotorError> {
        self.set_power(PowerVector::ZERO)
    }
}

impl<M: EncoderMotor + ?Sized> EncoderMotor for &mut M {
    fn tick_count(&mut self) -> i32 {
        (**self).tick_count()
    }

    fn power(&self) -> PowerVector {
        (**self).power()
    }

    fn set_power(&mut self, power: PowerVector) -> Result<(), MotorError> {
        (**self).set_power(power)
    }

    fn is_busy(&self) -> bool {
        (**self).is_busy()
    }

    fn model(&self) -> MotorModel {
        (**self).model()
    }

    fn brake(&mut self) -> Result<(), MotorError> {
        (**self).brake()
    }
}
