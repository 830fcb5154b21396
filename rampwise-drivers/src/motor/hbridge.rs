//! H-bridge DC motor with encoder feedback
//!
//! This binding provides:
//! - PWM duty from the power magnitude
//! - Direction pin from the power sign
//! - Minimum duty handling (below which the motor won't start)
//! - Mirrored mounting, flipping both power and encoder sign
//!
//! Ramping is not done here; the control engine decides power per cycle.
//!
//! ```ignore
//! let mut motor = HBridgeMotor::new(pwm, dir_pin, encoder, HBridgeConfig::default());
//! motor.enable(true);
//! motor.set_power(PowerVector::new(0.5)?)?;
//! ```

use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;

use rampwise_core::config::MotorModel;
use rampwise_core::power::PowerVector;
use rampwise_core::traits::{EncoderMotor, MotorError};

use super::encoder::EncoderCounter;

/// H-bridge motor configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HBridgeConfig {
    /// Rated characteristics of the attached motor
    pub model: MotorModel,
    /// Motor is mounted mirrored (left side of a drive base)
    pub reversed: bool,
    /// Minimum duty cycle percentage (below this the motor won't start)
    pub min_duty: u8,
}

impl Default for HBridgeConfig {
    fn default() -> Self {
        Self {
            model: MotorModel::default(),
            reversed: false,
            min_duty: 0,
        }
    }
}

/// DC motor behind an H-bridge driver
pub struct HBridgeMotor<P, D, E> {
    pwm: P,
    dir: D,
    encoder: E,
    config: HBridgeConfig,
    power: PowerVector,
    enabled: bool,
    /// Direction pin level last written; unknown until the first write
    forward: Option<bool>,
}

impl<P, D, E> HBridgeMotor<P, D, E>
where
    P: SetDutyCycle,
    D: OutputPin,
    E: EncoderCounter,
{
    /// Create a disabled motor binding
    pub fn new(pwm: P, dir: D, encoder: E, config: HBridgeConfig) -> Self {
        Self {
            pwm,
            dir,
            encoder,
            config,
            power: PowerVector::ZERO,
            enabled: false,
            forward: None,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &HBridgeConfig {
        &self.config
    }

    /// Enable or disable the driver
    ///
    /// Disabling removes power immediately.
    pub fn enable(&mut self, enabled: bool) -> Result<(), MotorError> {
        if !enabled {
            self.write(PowerVector::ZERO)?;
        }
        self.enabled = enabled;
        Ok(())
    }

    /// Check whether the driver is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Duty cycle for a power magnitude
    ///
    /// Maps (0, 1] onto [min_duty, 100%] so that any non-zero power turns
    /// the motor; zero stays off.
    fn scale_duty(&self, magnitude: f64) -> u16 {
        if magnitude <= 0.0 {
            return 0;
        }
        let max = f64::from(self.pwm.max_duty_cycle());
        let min = f64::from(self.config.min_duty.min(100)) / 100.0;
        let fraction = min + magnitude.min(1.0) * (1.0 - min);
        libm::round(fraction * max) as u16
    }

    fn write(&mut self, power: PowerVector) -> Result<(), MotorError> {
        let forward = (power.direction() >= 0) != self.config.reversed;
        if self.forward != Some(forward) {
            if self.forward.is_some() {
                // Never flip direction under load
                self.pwm.set_duty_cycle(0).map_err(|_| MotorError::Bus)?;
            }
            self.dir
                .set_state(PinState::from(forward))
                .map_err(|_| MotorError::Bus)?;
            self.forward = Some(forward);
        }
        let duty = self.scale_duty(power.magnitude().value());
        self.pwm.set_duty_cycle(duty).map_err(|_| MotorError::Bus)?;
        self.power = power;
        Ok(())
    }
}

impl<P, D, E> EncoderMotor for HBridgeMotor<P, D, E>
where
    P: SetDutyCycle,
    D: OutputPin,
    E: EncoderCounter,
{
    fn tick_count(&mut self) -> i32 {
        let count = self.encoder.count();
        if self.config.reversed {
            count.wrapping_neg()
        } else {
            count
        }
    }

    fn power(&self) -> PowerVector {
        self.power
    }

    fn set_power(&mut self, power: PowerVector) -> Result<(), MotorError> {
        if !self.enabled && power != PowerVector::ZERO {
            return Err(MotorError::Disabled);
        }
        self.write(power)
    }

    fn is_busy(&self) -> bool {
        self.power != PowerVector::ZERO
    }

    fn model(&self) -> MotorModel {
        self.config.model
    }
}
