//! Motor models
//!
//! Physical motors differ only in encoder resolution and rated speed, so a
//! model is a small data record rather than a type per motor.

use crate::error::{ConfigField, ControlError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rated characteristics of a motor and encoder pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotorModel {
    /// Encoder ticks per output shaft revolution
    pub ticks_per_revolution: u32,
    /// Output shaft speed at full power (RPM)
    pub rated_rpm: u32,
}

impl MotorModel {
    /// AndyMark NeveRest 20
    pub const NEVEREST_20: Self = Self::new(560, 315);
    /// AndyMark NeveRest 40
    pub const NEVEREST_40: Self = Self::new(1120, 160);
    /// AndyMark NeveRest 60
    pub const NEVEREST_60: Self = Self::new(1680, 105);
    /// Tetrix TorqueNADO
    pub const TETRIX_TORQUENADO: Self = Self::new(1440, 100);
    /// Tetrix MAX DC motor
    pub const TETRIX_MAX: Self = Self::new(1440, 152);
    /// REV HD Hex with 40:1 gearbox
    pub const REV_HD_HEX_40: Self = Self::new(1120, 150);
    /// REV Core Hex
    pub const REV_CORE_HEX: Self = Self::new(288, 125);

    /// Create a model
    pub const fn new(ticks_per_revolution: u32, rated_rpm: u32) -> Self {
        Self {
            ticks_per_revolution,
            rated_rpm,
        }
    }

    /// Encoder ticks per millisecond at full power
    pub fn ticks_per_ms(&self) -> f64 {
        self.ticks_per_revolution as f64 * self.rated_rpm as f64 / 60_000.0
    }

    /// Reject models that would make tick-rate estimates meaningless
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.ticks_per_revolution == 0 {
            return Err(ControlError::InvalidConfig(ConfigField::TicksPerRevolution));
        }
        if self.rated_rpm == 0 {
            return Err(ControlError::InvalidConfig(ConfigField::RatedRpm));
        }
        Ok(())
    }
}

impl Default for MotorModel {
    fn default() -> Self {
        Self::NEVEREST_40
    }
}
