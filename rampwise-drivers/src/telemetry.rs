//! Telemetry sinks
//!
//! [`DefmtTelemetry`] forwards control events to the defmt logger: phase
//! boundaries at info, per-cycle power at trace, stalls at warn.

use rampwise_core::traits::{ControlEvent, Telemetry};

/// Sink that logs every event through defmt
#[derive(Debug, Clone, Copy, Default)]
pub struct DefmtTelemetry {
    /// Also log every applied cycle
    pub trace_cycles: bool,
}

impl DefmtTelemetry {
    /// Create a sink, optionally tracing every cycle
    pub fn new(trace_cycles: bool) -> Self {
        Self { trace_cycles }
    }
}

impl Telemetry for DefmtTelemetry {
    fn record(&mut self, event: &ControlEvent) {
        match *event {
            ControlEvent::PhaseStarted {
                kind,
                start_tick,
                end_tick,
                start_power,
                target_power,
            } => defmt::info!(
                "{} start: tick={} end={} power {} -> {}",
                kind,
                start_tick,
                end_tick,
                start_power,
                target_power
            ),
            ControlEvent::DecelerationStarted {
                tick,
                start_decel_at,
            } => defmt::debug!("decel at tick={} (planned {})", tick, start_decel_at),
            ControlEvent::CycleApplied { tick, power } => {
                if self.trace_cycles {
                    defmt::trace!("tick={} power={}", tick, power);
                }
            }
            ControlEvent::PhaseFinished {
                kind,
                termination,
                tick,
                elapsed_ms,
            } => defmt::info!(
                "{} done: {} at tick={} after {}ms",
                kind,
                termination,
                tick,
                elapsed_ms
            ),
            ControlEvent::StallDetected { tick, still_ms } => {
                defmt::warn!("stall at tick={} (still {}ms)", tick, still_ms)
            }
            ControlEvent::SteeringApplied {
                error_deg,
                steer,
                left,
                right,
            } => {
                if self.trace_cycles {
                    defmt::trace!(
                        "err={} steer={} left={} right={}",
                        error_deg,
                        steer,
                        left,
                        right
                    );
                }
            }
            ControlEvent::HeadingLocked { heading_deg } => {
                defmt::debug!("heading locked at {}", heading_deg)
            }
        }
    }
}
