//! Simulated encoder motor
//!
//! Speed is proportional to applied power at the model's rated tick rate,
//! scaled by a load factor. Position is integrated lazily against the
//! shared [`SimClock`], so any number of readers see a consistent value.

use core::cell::Cell;

use rampwise_core::config::MotorModel;
use rampwise_core::power::PowerVector;
use rampwise_core::traits::{Clock, EncoderMotor, MotorError};

use super::clock::SimClock;

/// First-order DC motor model
///
/// Control loops take `&SimMotor` as their motor handle, which leaves the
/// motor readable by a [`SimGyro`](super::SimGyro) at the same time.
pub struct SimMotor<'a> {
    clock: &'a SimClock,
    model: MotorModel,
    /// Fraction of rated speed reached at full power
    load: f64,
    /// Mechanical travel limits (ticks)
    limits: Option<(i32, i32)>,
    power: Cell<PowerVector>,
    position: Cell<f64>,
    updated_ms: Cell<u64>,
    peak: Cell<f64>,
    writes: Cell<u32>,
}

impl<'a> SimMotor<'a> {
    /// Create a stopped, unloaded motor at tick zero
    pub fn new(clock: &'a SimClock, model: MotorModel) -> Self {
        Self {
            clock,
            model,
            load: 1.0,
            limits: None,
            power: Cell::new(PowerVector::ZERO),
            position: Cell::new(0.0),
            updated_ms: Cell::new(clock.now_ms()),
            peak: Cell::new(0.0),
            writes: Cell::new(0),
        }
    }

    /// Run below rated speed, as under a mechanical load
    pub fn with_load(mut self, load: f64) -> Self {
        self.load = load.clamp(0.0, 1.0);
        self
    }

    /// Stop travel at hard limits, as a jammed mechanism would
    pub fn with_limits(mut self, min: i32, max: i32) -> Self {
        self.limits = Some((min.min(max), min.max(max)));
        self
    }

    /// Start from a non-zero encoder count
    pub fn with_position(self, ticks: i32) -> Self {
        self.position.set(f64::from(ticks));
        self
    }

    /// Exact integrated position (ticks)
    pub fn position(&self) -> f64 {
        self.integrate();
        self.position.get()
    }

    /// Largest power magnitude ever applied
    pub fn peak_power(&self) -> f64 {
        self.peak.get()
    }

    /// Number of power writes
    pub fn writes(&self) -> u32 {
        self.writes.get()
    }

    fn integrate(&self) {
        let now = self.clock.now_ms();
        let dt = now.saturating_sub(self.updated_ms.get()) as f64;
        let speed = self.power.get().value() * self.model.ticks_per_ms() * self.load;
        let mut position = self.position.get() + speed * dt;
        if let Some((min, max)) = self.limits {
            position = position.clamp(f64::from(min), f64::from(max));
        }
        self.position.set(position);
        self.updated_ms.set(now);
    }
}

impl EncoderMotor for &SimMotor<'_> {
    fn tick_count(&mut self) -> i32 {
        libm::round(self.position()) as i32
    }

    fn power(&self) -> PowerVector {
        self.power.get()
    }

    fn set_power(&mut self, power: PowerVector) -> Result<(), MotorError> {
        self.integrate();
        let magnitude = power.magnitude().value();
        if magnitude > self.peak.get() {
            self.peak.set(magnitude);
        }
        self.power.set(power);
        self.writes.set(self.writes.get().saturating_add(1));
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.power.get() != PowerVector::ZERO
    }

    fn model(&self) -> MotorModel {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrates_at_rated_speed() {
        let clock = SimClock::new();
        let motor = SimMotor::new(&clock, MotorModel::TETRIX_TORQUENADO);
        let mut handle = &motor;

        handle.set_power(PowerVector::FULL_FORWARD).unwrap();
        clock.advance(100);
        assert_eq!(handle.tick_count(), 240);
        handle.set_power(PowerVector::new(-0.5).unwrap()).unwrap();
        clock.advance(100);
        assert_eq!(handle.tick_count(), 120);
        assert_eq!(motor.peak_power(), 1.0);
    }

    #[test]
    fn test_limits_and_load() {
        let clock = SimClock::new();
        let motor = SimMotor::new(&clock, MotorModel::TETRIX_TORQUENADO)
            .with_load(0.5)
            .with_limits(-50, 100);
        let mut handle = &motor;

        handle.set_power(PowerVector::FULL_FORWARD).unwrap();
        clock.advance(50);
        assert_eq!(handle.tick_count(), 60);
        clock.advance(1000);
        assert_eq!(handle.tick_count(), 100);
        handle.set_power(PowerVector::FULL_REVERSE).unwrap();
        clock.advance(1000);
        assert_eq!(handle.tick_count(), -50);
    }
}
