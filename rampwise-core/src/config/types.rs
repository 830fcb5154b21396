//! Control loop tuning
//!
//! Defaults match a 50 ms control cycle on FTC-class drive motors.

use core::f64::consts::PI;

use super::motor::MotorModel;
use crate::error::{ConfigField, ControlError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default control cycle period
pub const DEFAULT_CYCLE_PERIOD_MS: u32 = 50;

/// Default power change per cycle (full power in one second)
pub const DEFAULT_POWER_INCREMENT: f64 = 0.05;

/// Default heading-lock threshold in degrees
pub const DEFAULT_LOCK_THRESHOLD_DEG: f64 = 1.0;

/// Ramp tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RampConfig {
    /// Largest power change applied in one cycle
    pub power_increment_per_cycle: f64,
    /// Control cycle period (ms)
    pub cycle_period_ms: u32,
    /// A tick budget counts as consumed within this many ticks of its end
    pub tick_tolerance: u32,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            power_increment_per_cycle: DEFAULT_POWER_INCREMENT,
            cycle_period_ms: DEFAULT_CYCLE_PERIOD_MS,
            tick_tolerance: 10,
        }
    }
}

impl RampConfig {
    /// Check tuning values
    pub fn validate(&self) -> Result<(), ControlError> {
        let inc = self.power_increment_per_cycle;
        if !(inc > 0.0 && inc <= 1.0) {
            return Err(ControlError::InvalidConfig(ConfigField::PowerIncrement));
        }
        if self.cycle_period_ms == 0 {
            return Err(ControlError::InvalidConfig(ConfigField::CyclePeriod));
        }
        Ok(())
    }
}

/// Stall detection tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StallConfig {
    /// Movement below this many ticks counts as standing still
    pub tolerance_ticks: i32,
    /// Standing still for longer than this trips the monitor (ms)
    pub window_ms: i64,
}

impl Default for StallConfig {
    fn default() -> Self {
        Self {
            tolerance_ticks: 5,
            window_ms: 200,
        }
    }
}

impl StallConfig {
    /// Create a stall configuration, rejecting negative values
    pub fn new(tolerance_ticks: i32, window_ms: i64) -> Result<Self, ControlError> {
        let config = Self {
            tolerance_ticks,
            window_ms,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check tuning values
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.tolerance_ticks < 0 {
            return Err(ControlError::NegativeStallTolerance(self.tolerance_ticks));
        }
        if self.window_ms < 0 {
            return Err(ControlError::NegativeStallWindow(self.window_ms));
        }
        Ok(())
    }
}

/// Gyro steering tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HeadingConfig {
    /// Proportional gain while turning in place or holding
    pub turn_gain: f64,
    /// Proportional gain while driving straight
    pub drive_gain: f64,
    /// Heading errors at or below this are treated as zero (degrees)
    pub lock_threshold_deg: f64,
    /// Control cycle period (ms)
    pub cycle_period_ms: u32,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            turn_gain: 0.1,
            drive_gain: 0.15,
            lock_threshold_deg: DEFAULT_LOCK_THRESHOLD_DEG,
            cycle_period_ms: DEFAULT_CYCLE_PERIOD_MS,
        }
    }
}

impl HeadingConfig {
    /// Check tuning values
    pub fn validate(&self) -> Result<(), ControlError> {
        if !(self.turn_gain > 0.0) {
            return Err(ControlError::InvalidConfig(ConfigField::TurnGain));
        }
        if !(self.drive_gain > 0.0) {
            return Err(ControlError::InvalidConfig(ConfigField::DriveGain));
        }
        if !(self.lock_threshold_deg >= 0.0) {
            return Err(ControlError::InvalidConfig(ConfigField::LockThreshold));
        }
        if self.cycle_period_ms == 0 {
            return Err(ControlError::InvalidConfig(ConfigField::CyclePeriod));
        }
        Ok(())
    }
}

/// Drive wheel geometry for converting distances to encoder ticks
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DriveGeometry {
    /// Wheel diameter (inches)
    pub wheel_diameter_in: f64,
    /// Motor revolutions per wheel revolution
    pub gear_reduction: f64,
}

impl Default for DriveGeometry {
    fn default() -> Self {
        Self {
            wheel_diameter_in: 4.0,
            gear_reduction: 1.0,
        }
    }
}

impl DriveGeometry {
    /// Encoder ticks per inch of travel
    pub fn ticks_per_inch(&self, model: MotorModel) -> f64 {
        model.ticks_per_revolution as f64 * self.gear_reduction / (self.wheel_diameter_in * PI)
    }

    /// Signed tick distance for a signed travel in inches
    pub fn ticks_for_inches(&self, model: MotorModel, inches: f64) -> i32 {
        libm::round(inches * self.ticks_per_inch(model)) as i32
    }

    /// Check geometry values
    pub fn validate(&self) -> Result<(), ControlError> {
        if !(self.wheel_diameter_in > 0.0) {
            return Err(ControlError::InvalidConfig(ConfigField::WheelDiameter));
        }
        if !(self.gear_reduction > 0.0) {
            return Err(ControlError::InvalidConfig(ConfigField::GearReduction));
        }
        Ok(())
    }
}

/// Complete control engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControlConfig {
    /// Drive motor model
    pub motor: MotorModel,
    /// Ramp tuning
    pub ramp: RampConfig,
    /// Stall detection tuning
    pub stall: StallConfig,
    /// Gyro steering tuning
    pub heading: HeadingConfig,
    /// Drive wheel geometry
    pub drive: DriveGeometry,
    /// Watch for stalls during tick excursions as well
    pub stall_guard: bool,
}

impl ControlConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ControlError> {
        self.motor.validate()?;
        self.ramp.validate()?;
        self.stall.validate()?;
        self.heading.validate()?;
        self.drive.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(ControlConfig::default().validate().is_ok());
    }

    #[test]
    fn test_ramp_increment_bounds() {
        let mut ramp = RampConfig::default();
        ramp.power_increment_per_cycle = 0.0;
        assert_eq!(
            ramp.validate(),
            Err(ControlError::InvalidConfig(ConfigField::PowerIncrement))
        );
        ramp.power_increment_per_cycle = f64::NAN;
        assert!(ramp.validate().is_err());
        ramp.power_increment_per_cycle = 1.0;
        assert!(ramp.validate().is_ok());
    }

    #[test]
    fn test_stall_negative_rejected() {
        assert_eq!(
            StallConfig::new(-1, 100),
            Err(ControlError::NegativeStallTolerance(-1))
        );
        assert_eq!(
            StallConfig::new(5, -100),
            Err(ControlError::NegativeStallWindow(-100))
        );
        assert!(StallConfig::new(0, 0).is_ok());
    }

    #[test]
    fn test_heading_validate() {
        let mut heading = HeadingConfig::default();
        assert!(heading.validate().is_ok());
        heading.lock_threshold_deg = -1.0;
        assert_eq!(
            heading.validate(),
            Err(ControlError::InvalidConfig(ConfigField::LockThreshold))
        );
    }

    #[test]
    fn test_ticks_for_inches() {
        // Classic pushbot: 1440 CPR, 2:1 reduction, 4" wheels
        let geometry = DriveGeometry {
            wheel_diameter_in: 4.0,
            gear_reduction: 2.0,
        };
        let tpi = geometry.ticks_per_inch(MotorModel::TETRIX_MAX);
        assert!((tpi - 229.18).abs() < 0.01);
        assert_eq!(geometry.ticks_for_inches(MotorModel::TETRIX_MAX, -10.0), -2292);
    }
}
