//! Simulated gyro for a differential drive

use core::f64::consts::PI;

use rampwise_core::config::{DriveGeometry, MotorModel};
use rampwise_core::traits::Gyro;

use super::motor::SimMotor;

/// Heading derived from the wheel travel difference
///
/// Left wheel ahead of the right turns the robot clockwise, which reads as
/// a growing heading.
pub struct SimGyro<'a> {
    left: &'a SimMotor<'a>,
    right: &'a SimMotor<'a>,
    degrees_per_tick: f64,
    initial_deg: f64,
}

impl<'a> SimGyro<'a> {
    /// Gyro with an explicit turn rate per tick of wheel difference
    pub fn new(left: &'a SimMotor<'a>, right: &'a SimMotor<'a>, degrees_per_tick: f64) -> Self {
        Self {
            left,
            right,
            degrees_per_tick,
            initial_deg: 0.0,
        }
    }

    /// Gyro for wheels `track_width_in` apart
    pub fn for_drive(
        left: &'a SimMotor<'a>,
        right: &'a SimMotor<'a>,
        model: MotorModel,
        geometry: DriveGeometry,
        track_width_in: f64,
    ) -> Self {
        let inches_per_tick = 1.0 / geometry.ticks_per_inch(model);
        let degrees_per_tick = inches_per_tick / track_width_in * 180.0 / PI;
        Self::new(left, right, degrees_per_tick)
    }

    /// Start from a non-zero heading
    pub fn with_initial_heading(mut self, degrees: f64) -> Self {
        self.initial_deg = degrees;
        self
    }
}

impl Gyro for SimGyro<'_> {
    fn heading_degrees(&mut self) -> f64 {
        let difference = self.left.position() - self.right.position();
        self.initial_deg + difference * self.degrees_per_tick
    }
}
