//! Test doubles for loop-level unit tests
//!
//! Time only advances when a loop waits for its next cycle; motors
//! integrate their position lazily against the shared clock.

use core::cell::Cell;

use crate::config::MotorModel;
use crate::power::PowerVector;
use crate::traits::{ControlContext, ControlEvent, EncoderMotor, Gyro, MotorError, Telemetry};

pub struct FakeClock(Cell<u64>);

impl FakeClock {
    pub fn new() -> Self {
        Self(Cell::new(0))
    }

    pub fn now(&self) -> u64 {
        self.0.get()
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

pub struct FakeContext<'a> {
    clock: &'a FakeClock,
    active_until: Option<u64>,
}

impl<'a> FakeContext<'a> {
    pub fn new(clock: &'a FakeClock) -> Self {
        Self {
            clock,
            active_until: None,
        }
    }

    pub fn active_until(mut self, ms: u64) -> Self {
        self.active_until = Some(ms);
        self
    }
}

impl ControlContext for FakeContext<'_> {
    fn is_active(&self) -> bool {
        self.active_until.map_or(true, |t| self.clock.now() < t)
    }

    fn elapsed_ms(&self) -> u64 {
        self.clock.now()
    }

    async fn wait_for_next_cycle(&mut self, period_ms: u32) {
        self.clock.advance(u64::from(period_ms));
    }
}

/// Motor whose speed is proportional to power
pub struct FakeMotor<'a> {
    clock: &'a FakeClock,
    model: MotorModel,
    power: Cell<PowerVector>,
    position: Cell<f64>,
    updated_ms: Cell<u64>,
    block_at: Option<i32>,
    peak: Cell<f64>,
}

impl<'a> FakeMotor<'a> {
    pub fn new(clock: &'a FakeClock, model: MotorModel) -> Self {
        Self {
            clock,
            model,
            power: Cell::new(PowerVector::ZERO),
            position: Cell::new(0.0),
            updated_ms: Cell::new(clock.now()),
            block_at: None,
            peak: Cell::new(0.0),
        }
    }

    /// Mechanical stop: position never passes `ticks` in either direction
    pub fn block_at(&mut self, ticks: i32) {
        self.block_at = Some(ticks);
    }

    pub fn peak_power(&self) -> f64 {
        self.peak.get()
    }

    fn integrate(&self) {
        let now = self.clock.now();
        let dt = (now - self.updated_ms.get()) as f64;
        let mut position =
            self.position.get() + self.power.get().value() * self.model.ticks_per_ms() * dt;
        if let Some(stop) = self.block_at {
            let stop = f64::from(stop.abs());
            position = position.clamp(-stop, stop);
        }
        self.position.set(position);
        self.updated_ms.set(now);
    }
}

impl EncoderMotor for FakeMotor<'_> {
    fn tick_count(&mut self) -> i32 {
        self.integrate();
        self.position.get().round() as i32
    }

    fn power(&self) -> PowerVector {
        self.power.get()
    }

    fn set_power(&mut self, power: PowerVector) -> Result<(), MotorError> {
        self.integrate();
        self.peak.set(self.peak.get().max(power.value().abs()));
        self.power.set(power);
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.power.get() != PowerVector::ZERO
    }

    fn model(&self) -> MotorModel {
        self.model
    }
}

/// Gyro with a fixed reading
pub struct FixedGyro(pub f64);

impl Gyro for FixedGyro {
    fn heading_degrees(&mut self) -> f64 {
        self.0
    }
}

/// Gyro that replays readings, then repeats the last one
pub struct SequenceGyro<'a> {
    readings: &'a [f64],
    next: usize,
}

impl<'a> SequenceGyro<'a> {
    pub fn new(readings: &'a [f64]) -> Self {
        Self { readings, next: 0 }
    }

    pub fn reads(&self) -> usize {
        self.next
    }
}

impl Gyro for SequenceGyro<'_> {
    fn heading_degrees(&mut self) -> f64 {
        let i = self.next.min(self.readings.len() - 1);
        self.next += 1;
        self.readings[i]
    }
}

#[derive(Default)]
pub struct RecordingTelemetry {
    pub events: Vec<ControlEvent>,
}

impl RecordingTelemetry {
    pub fn cycles(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ControlEvent::CycleApplied { .. }))
            .count()
    }
}

impl Telemetry for RecordingTelemetry {
    fn record(&mut self, event: &ControlEvent) {
        self.events.push(*event);
    }
}
