//! Bounded power ramps
//!
//! Moves a motor's applied power toward a requested value by at most one
//! increment per control cycle. A phase ends when its tick budget is
//! consumed, its timeout elapses, its stall monitor trips, or the context
//! is cancelled. Phases without a tick budget end once power reaches the
//! target.
//!
//! Slow-down phases must start decelerating before the nominal end tick or
//! the motor overshoots. The deceleration point is estimated from the
//! motor's rated tick rate:
//!
//! ```text
//! ticks_needed   = (|p_start| - |p_end|) / increment * avg_ticks_per_cycle
//! start_decel_at = end_tick - direction * ticks_needed
//! ```

use super::Termination;
use crate::config::{MotorModel, RampConfig};
use crate::error::ControlError;
use crate::power::{sign, PowerVector};
use crate::safety::StallMonitor;
use crate::traits::{ControlContext, ControlEvent, EncoderMotor, PhaseKind, Telemetry};

/// Slack for float accumulation when deciding whether to snap to target
pub const RAMP_EPSILON: f64 = 1e-9;

/// Next power for one control cycle
///
/// Snaps to `requested` when it is within one increment, otherwise moves
/// one increment toward it.
pub fn ramp_step(current: f64, requested: f64, increment: f64) -> f64 {
    let delta = requested - current;
    if libm::fabs(delta) <= increment + RAMP_EPSILON {
        requested
    } else {
        current + increment * f64::from(sign(delta))
    }
}

/// Estimated encoder ticks per cycle while ramping between two powers
pub fn average_ticks_per_cycle(
    model: MotorModel,
    config: &RampConfig,
    power_start: f64,
    power_end: f64,
) -> f64 {
    let average_power = (libm::fabs(power_start) + libm::fabs(power_end)) / 2.0;
    model.ticks_per_ms() * average_power * config.cycle_period_ms as f64
}

/// Estimated encoder ticks covered while ramping from `power_start` down to `power_end`
pub fn ticks_needed_for_ramp(
    model: MotorModel,
    config: &RampConfig,
    power_start: f64,
    power_end: f64,
) -> f64 {
    let cycles =
        (libm::fabs(power_start) - libm::fabs(power_end)) / config.power_increment_per_cycle;
    cycles * average_ticks_per_cycle(model, config, power_start, power_end)
}

/// Tick number at which a slow-down must begin
///
/// `end_tick` is the tick at which the phase budget is consumed. Travel
/// direction follows the sign of `power_start`.
///
/// # Errors
/// [`ControlError::InvalidSlowDown`] unless `|power_start| > |power_end|`.
pub fn tick_to_start_decel(
    model: MotorModel,
    config: &RampConfig,
    power_start: PowerVector,
    power_end: PowerVector,
    end_tick: i32,
) -> Result<i32, ControlError> {
    check_slow_down(power_start, power_end)?;
    let needed = ticks_needed_for_ramp(model, config, power_start.value(), power_end.value());
    let direction = f64::from(power_start.direction());
    let at = end_tick as f64 - direction * libm::round(needed);
    Ok(at.clamp(i32::MIN as f64, i32::MAX as f64) as i32)
}

/// Whether `tick` lies between the deceleration point and the end tick
///
/// Inclusive at both ends and independent of travel direction, so it holds
/// for negative tick ranges too.
pub fn is_deceleration_running(tick: i32, start_decel_at: i32, end_tick: i32) -> bool {
    let (low, high) = if start_decel_at <= end_tick {
        (start_decel_at, end_tick)
    } else {
        (end_tick, start_decel_at)
    };
    tick >= low && tick <= high
}

fn check_slow_down(start: PowerVector, end: PowerVector) -> Result<(), ControlError> {
    if start.magnitude() > end.magnitude() {
        Ok(())
    } else {
        Err(ControlError::InvalidSlowDown {
            start: start.value(),
            end: end.value(),
        })
    }
}

/// Transient state of one ramp phase
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RampPhase {
    /// Speed-up or slow-down
    pub kind: PhaseKind,
    /// Tick count when the phase began
    pub start_tick: i32,
    /// Applied power when the phase began
    pub start_power: PowerVector,
    /// Power the phase ramps toward
    pub target_power: PowerVector,
    /// Ticks to travel, or `None` to run until power reaches target
    pub tick_budget: Option<u32>,
    /// Phase timeout (ms)
    pub timeout_ms: Option<u64>,
    /// +1, -1, or 0 when neither power moves the motor
    pub direction: i8,
    /// Slow-down deceleration point
    pub start_decel_at: Option<i32>,
    increment: f64,
    period_ms: u32,
    tick_tolerance: u32,
    decelerating: bool,
}

impl RampPhase {
    /// Ramp from `start_power` toward `target_power`, holding the target
    /// once reached until the budget is consumed
    pub fn speed_up(
        config: &RampConfig,
        start_tick: i32,
        start_power: PowerVector,
        target_power: PowerVector,
        tick_budget: Option<u32>,
        timeout_ms: Option<u64>,
    ) -> Self {
        let direction = match target_power.direction() {
            0 => start_power.direction(),
            d => d,
        };
        Self {
            kind: PhaseKind::SpeedUp,
            start_tick,
            start_power,
            target_power,
            tick_budget,
            timeout_ms,
            direction,
            start_decel_at: None,
            increment: config.power_increment_per_cycle,
            period_ms: config.cycle_period_ms,
            tick_tolerance: config.tick_tolerance,
            decelerating: false,
        }
    }

    /// Hold `start_power` until the deceleration point, then ramp to
    /// `target_power`
    ///
    /// Without a tick budget deceleration starts immediately.
    ///
    /// # Errors
    /// [`ControlError::InvalidSlowDown`] unless `|start_power| > |target_power|`.
    pub fn slow_down(
        config: &RampConfig,
        model: MotorModel,
        start_tick: i32,
        start_power: PowerVector,
        target_power: PowerVector,
        tick_budget: Option<u32>,
        timeout_ms: Option<u64>,
    ) -> Result<Self, ControlError> {
        check_slow_down(start_power, target_power)?;
        let mut phase = Self::speed_up(
            config,
            start_tick,
            start_power,
            target_power,
            tick_budget,
            timeout_ms,
        );
        phase.kind = PhaseKind::SlowDown;
        phase.direction = start_power.direction();
        phase.start_decel_at = match phase.end_tick() {
            Some(end) => Some(tick_to_start_decel(
                model,
                config,
                start_power,
                target_power,
                end,
            )?),
            None => None,
        };
        Ok(phase)
    }

    /// Tick at which the budget is consumed
    pub fn end_tick(&self) -> Option<i32> {
        self.tick_budget.map(|budget| {
            let end = i64::from(self.start_tick) + i64::from(self.direction) * i64::from(budget);
            end.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
        })
    }

    /// Ticks travelled in the phase direction
    pub fn ticks_moved(&self, tick: i32) -> i64 {
        (i64::from(tick) - i64::from(self.start_tick)) * i64::from(self.direction)
    }

    /// Whether the tick budget is consumed at `tick`
    pub fn budget_consumed(&self, tick: i32) -> bool {
        match self.tick_budget {
            Some(budget) => {
                let remaining = i64::from(budget) - self.ticks_moved(tick);
                remaining <= i64::from(self.tick_tolerance)
            }
            None => false,
        }
    }

    /// Whether a slow-down is past its deceleration point
    pub fn is_decelerating(&self) -> bool {
        self.decelerating
    }

    /// Power to ramp toward on this cycle
    pub fn requested_power(&mut self, tick: i32) -> f64 {
        if self.kind != PhaseKind::SlowDown {
            return self.target_power.value();
        }
        if !self.decelerating {
            self.decelerating = match (self.start_decel_at, self.end_tick()) {
                (Some(at), Some(end)) => is_deceleration_running(tick, at, end),
                _ => true,
            };
        }
        if self.decelerating {
            self.target_power.value()
        } else {
            self.start_power.value()
        }
    }
}

/// Drives one motor through ramp phases
///
/// Owns the motor handle and telemetry sink for the lifetime of the loop;
/// never share one motor between two controllers.
pub struct RampController<M, T> {
    motor: M,
    telemetry: T,
    config: RampConfig,
}

impl<M: EncoderMotor, T: Telemetry> RampController<M, T> {
    /// Create a controller, validating the tuning and the motor model
    pub fn new(motor: M, telemetry: T, config: RampConfig) -> Result<Self, ControlError> {
        config.validate()?;
        motor.model().validate()?;
        Ok(Self {
            motor,
            telemetry,
            config,
        })
    }

    /// Ramp tuning
    pub fn config(&self) -> &RampConfig {
        &self.config
    }

    /// Motor handle
    pub fn motor(&self) -> &M {
        &self.motor
    }

    /// Mutable motor handle
    pub fn motor_mut(&mut self) -> &mut M {
        &mut self.motor
    }

    /// Telemetry sink
    pub fn telemetry_mut(&mut self) -> &mut T {
        &mut self.telemetry
    }

    /// Release the motor and telemetry sink
    pub fn into_parts(self) -> (M, T) {
        (self.motor, self.telemetry)
    }

    /// Speed-up phase starting from the motor's current tick and power
    pub fn speed_up_phase(
        &mut self,
        target: PowerVector,
        tick_budget: Option<u32>,
        timeout_ms: Option<u64>,
    ) -> RampPhase {
        let tick = self.motor.tick_count();
        RampPhase::speed_up(
            &self.config,
            tick,
            self.motor.power(),
            target,
            tick_budget,
            timeout_ms,
        )
    }

    /// Slow-down phase starting from the motor's current tick and power
    pub fn slow_down_phase(
        &mut self,
        target: PowerVector,
        tick_budget: Option<u32>,
        timeout_ms: Option<u64>,
    ) -> Result<RampPhase, ControlError> {
        let tick = self.motor.tick_count();
        RampPhase::slow_down(
            &self.config,
            self.motor.model(),
            tick,
            self.motor.power(),
            target,
            tick_budget,
            timeout_ms,
        )
    }

    /// Run a phase to completion
    ///
    /// When `stall` is given it is polled after every cycle; seed it before
    /// calling. A phase that has ramped to zero power ends with
    /// `PowerReached` even if ticks remain in its budget. On cancellation
    /// power is left as last set.
    pub async fn run<C: ControlContext>(
        &mut self,
        ctx: &mut C,
        phase: &mut RampPhase,
        mut stall: Option<&mut StallMonitor>,
    ) -> Result<Termination, ControlError> {
        let started_ms = ctx.elapsed_ms();
        self.telemetry.record(&ControlEvent::PhaseStarted {
            kind: phase.kind,
            start_tick: phase.start_tick,
            end_tick: phase.end_tick(),
            start_power: phase.start_power.value(),
            target_power: phase.target_power.value(),
        });

        let termination = loop {
            if !ctx.is_active() {
                break Termination::Cancelled;
            }

            let current = self.motor.power().value();
            let tick = self.motor.tick_count();
            let was_decelerating = phase.is_decelerating();
            let requested = phase.requested_power(tick);
            if phase.is_decelerating() && !was_decelerating {
                self.telemetry.record(&ControlEvent::DecelerationStarted {
                    tick,
                    start_decel_at: phase.start_decel_at.unwrap_or(tick),
                });
            }

            let next = PowerVector::new(ramp_step(
                current,
                requested,
                phase.increment,
            ))?;
            self.motor.set_power(next)?;
            self.telemetry.record(&ControlEvent::CycleApplied {
                tick,
                power: next.value(),
            });

            ctx.wait_for_next_cycle(phase.period_ms).await;

            let tick = self.motor.tick_count();
            let now_ms = ctx.elapsed_ms();
            if let Some(monitor) = stall.as_deref_mut() {
                if monitor.poll(tick, now_ms) {
                    self.telemetry.record(&ControlEvent::StallDetected {
                        tick,
                        still_ms: monitor.still_ms(now_ms),
                    });
                    break Termination::Stalled;
                }
            }
            if phase.budget_consumed(tick) {
                break Termination::TickBudgetReached;
            }
            if next == phase.target_power
                && (phase.tick_budget.is_none() || next == PowerVector::ZERO)
            {
                // A stopped motor cannot consume the rest of its budget
                break Termination::PowerReached;
            }
            if let Some(timeout) = phase.timeout_ms {
                if now_ms.saturating_sub(started_ms) >= timeout {
                    break Termination::Timeout;
                }
            }
        };

        self.finish(&*ctx, phase.kind, termination, started_ms);
        Ok(termination)
    }

    /// Keep the current power for a duration, or until a stall
    ///
    /// With neither a duration nor a stall monitor this only ends on
    /// cancellation.
    pub async fn hold<C: ControlContext>(
        &mut self,
        ctx: &mut C,
        duration_ms: Option<u64>,
        mut stall: Option<&mut StallMonitor>,
    ) -> Termination {
        let kind = if stall.is_some() {
            PhaseKind::StallWatch
        } else {
            PhaseKind::Hold
        };
        let started_ms = ctx.elapsed_ms();
        let power = self.motor.power().value();
        let start_tick = self.motor.tick_count();
        self.telemetry.record(&ControlEvent::PhaseStarted {
            kind,
            start_tick,
            end_tick: None,
            start_power: power,
            target_power: power,
        });

        let termination = loop {
            if !ctx.is_active() {
                break Termination::Cancelled;
            }
            if let Some(duration) = duration_ms {
                if ctx.elapsed_ms().saturating_sub(started_ms) >= duration {
                    break Termination::DurationElapsed;
                }
            }

            ctx.wait_for_next_cycle(self.config.cycle_period_ms).await;

            if let Some(monitor) = stall.as_deref_mut() {
                let tick = self.motor.tick_count();
                let now_ms = ctx.elapsed_ms();
                if monitor.poll(tick, now_ms) {
                    self.telemetry.record(&ControlEvent::StallDetected {
                        tick,
                        still_ms: monitor.still_ms(now_ms),
                    });
                    break Termination::Stalled;
                }
            }
        };

        self.finish(&*ctx, kind, termination, started_ms);
        termination
    }

    /// Ramp the applied power to zero without a tick budget
    ///
    /// Returns `PowerReached` immediately when already stopped.
    pub async fn ramp_to_zero<C: ControlContext>(
        &mut self,
        ctx: &mut C,
    ) -> Result<Termination, ControlError> {
        if self.motor.power() == PowerVector::ZERO {
            return Ok(Termination::PowerReached);
        }
        let mut phase = self.slow_down_phase(PowerVector::ZERO, None, None)?;
        self.run(ctx, &mut phase, None).await
    }

    fn finish<C: ControlContext>(
        &mut self,
        ctx: &C,
        kind: PhaseKind,
        termination: Termination,
        started_ms: u64,
    ) {
        let tick = self.motor.tick_count();
        self.telemetry.record(&ControlEvent::PhaseFinished {
            kind,
            termination,
            tick,
            elapsed_ms: ctx.elapsed_ms().saturating_sub(started_ms),
        });
    }
}
