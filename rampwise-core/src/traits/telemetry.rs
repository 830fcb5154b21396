//! Telemetry sink
//!
//! Each control loop owns an injected sink; there is no process-wide logger.

use crate::motion::Termination;

/// Which kind of loop produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhaseKind {
    /// Ramp toward a higher magnitude
    SpeedUp,
    /// Ramp toward a lower magnitude
    SlowDown,
    /// Constant power for a fixed duration
    Hold,
    /// Stall polling at constant power
    StallWatch,
    /// Gyro turn in place
    Turn,
    /// Gyro heading hold
    HeadingHold,
    /// Gyro-corrected straight drive
    Drive,
}

/// Structured control-loop event
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlEvent {
    /// A loop phase began
    PhaseStarted {
        kind: PhaseKind,
        start_tick: i32,
        /// Tick at which the phase budget is consumed, if tick-bounded
        end_tick: Option<i32>,
        start_power: f64,
        target_power: f64,
    },
    /// Slow-down ramp crossed its computed deceleration point
    DecelerationStarted { tick: i32, start_decel_at: i32 },
    /// Power applied for one cycle
    CycleApplied { tick: i32, power: f64 },
    /// A loop phase ended
    PhaseFinished {
        kind: PhaseKind,
        termination: Termination,
        tick: i32,
        elapsed_ms: u64,
    },
    /// Stall monitor tripped
    StallDetected { tick: i32, still_ms: u64 },
    /// Differential steering applied
    SteeringApplied {
        error_deg: f64,
        steer: f64,
        left: f64,
        right: f64,
    },
    /// Heading error fell within the lock threshold
    HeadingLocked { heading_deg: f64 },
}

/// Destination for control-loop events
pub trait Telemetry {
    /// Record one event
    fn record(&mut self, event: &ControlEvent);
}

impl<T: Telemetry + ?Sized> Telemetry for &mut T {
    fn record(&mut self, event: &ControlEvent) {
        (**self).record(event)
    }
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn record(&mut self, _event: &ControlEvent) {}
}
