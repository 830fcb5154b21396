//! Excursion planning
//!
//! Splits a tick-count move into a speed-up half and a slow-down half and
//! runs them back to back, then brakes. Time-bounded and stall-bounded
//! variants ramp once to the requested power instead of splitting ticks.

use super::ramp::RampController;
use super::Termination;
use crate::config::{ControlConfig, StallConfig};
use crate::error::{check_tick_budget, check_timeout, ControlError};
use crate::power::PowerVector;
use crate::safety::StallMonitor;
use crate::traits::{ControlContext, EncoderMotor, Telemetry};

/// Split a tick budget into speed-up and slow-down shares
///
/// The speed-up half gets the extra tick of an odd budget.
pub fn split_ticks(ticks: u32) -> (u32, u32) {
    let up = ticks - ticks / 2;
    (up, ticks - up)
}

/// Sequences ramp phases for one motor
pub struct ExcursionPlanner<M, T> {
    ramp: RampController<M, T>,
    stall_guard: Option<StallConfig>,
}

impl<M: EncoderMotor, T: Telemetry> ExcursionPlanner<M, T> {
    /// Plan excursions with the given ramp controller
    pub fn new(ramp: RampController<M, T>) -> Self {
        Self {
            ramp,
            stall_guard: None,
        }
    }

    /// Build a planner from a full configuration
    pub fn from_config(motor: M, telemetry: T, config: &ControlConfig) -> Result<Self, ControlError> {
        config.validate()?;
        let planner = Self::new(RampController::new(motor, telemetry, config.ramp)?);
        if config.stall_guard {
            planner.with_stall_guard(config.stall)
        } else {
            Ok(planner)
        }
    }

    /// Also end tick excursions when the motor stalls
    pub fn with_stall_guard(mut self, config: StallConfig) -> Result<Self, ControlError> {
        config.validate()?;
        self.stall_guard = Some(config);
        Ok(self)
    }

    /// Underlying ramp controller
    pub fn ramp(&mut self) -> &mut RampController<M, T> {
        &mut self.ramp
    }

    /// Release the ramp controller
    pub fn into_inner(self) -> RampController<M, T> {
        self.ramp
    }

    /// Move `tick_budget` ticks at up to `power` within `timeout_ms`
    ///
    /// The first half of the ticks ramps from the current power to `power`,
    /// the remainder ramps back to zero, then the motor brakes. Returns the
    /// reason the last phase ended. On cancellation power is left as set.
    pub async fn ramp_to_target_ticks<C: ControlContext>(
        &mut self,
        ctx: &mut C,
        power: PowerVector,
        tick_budget: i32,
        timeout_ms: i64,
    ) -> Result<Termination, ControlError> {
        let budget = check_tick_budget(tick_budget)?;
        let timeout = check_timeout(timeout_ms)?;
        let (speed_up_ticks, _) = split_ticks(budget);
        let started_ms = ctx.elapsed_ms();
        let mut guard = self.stall_guard.map(StallMonitor::new).transpose()?;

        let mut phase = self
            .ramp
            .speed_up_phase(power, Some(speed_up_ticks), Some(timeout));
        let start_tick = phase.start_tick;
        let direction = phase.direction;
        self.seed(ctx, guard.as_mut());
        let termination = self.ramp.run(ctx, &mut phase, guard.as_mut()).await?;
        if termination != Termination::TickBudgetReached {
            return self.settle(termination);
        }

        // Slow-down covers whatever the speed-up left of the full budget
        let tick = self.ramp.motor_mut().tick_count();
        let moved = (i64::from(tick) - i64::from(start_tick)) * i64::from(direction);
        let remaining = (i64::from(budget) - moved).clamp(0, i64::from(u32::MAX)) as u32;
        let time_left = timeout.saturating_sub(ctx.elapsed_ms().saturating_sub(started_ms));

        if self.ramp.motor().power() == PowerVector::ZERO {
            return self.settle(termination);
        }
        let mut phase =
            self.ramp
                .slow_down_phase(PowerVector::ZERO, Some(remaining), Some(time_left))?;
        self.seed(ctx, guard.as_mut());
        let termination = self.ramp.run(ctx, &mut phase, guard.as_mut()).await?;
        self.settle(termination)
    }

    /// Ramp to `power`, hold it for `duration_ms`, then ramp back to zero
    pub async fn run_for_duration<C: ControlContext>(
        &mut self,
        ctx: &mut C,
        power: PowerVector,
        duration_ms: i64,
    ) -> Result<Termination, ControlError> {
        let duration = check_timeout(duration_ms)?;

        let mut phase = self.ramp.speed_up_phase(power, None, None);
        let termination = self.ramp.run(ctx, &mut phase, None).await?;
        if termination == Termination::Cancelled {
            return Ok(termination);
        }

        let termination = self.ramp.hold(ctx, Some(duration), None).await;
        if termination == Termination::Cancelled {
            return Ok(termination);
        }

        if self.ramp.ramp_to_zero(ctx).await? == Termination::Cancelled {
            return Ok(Termination::Cancelled);
        }
        self.settle(termination)
    }

    /// Ramp to `power` and keep it until the encoder stalls, then ramp to zero
    ///
    /// Movement below `tolerance_ticks` for longer than `window_ms` counts
    /// as a stall. The encoder is only watched after the speed-up, so slow
    /// early cycles never count. Only cancellation ends the wait otherwise.
    pub async fn run_until_stalled<C: ControlContext>(
        &mut self,
        ctx: &mut C,
        power: PowerVector,
        tolerance_ticks: i32,
        window_ms: i64,
    ) -> Result<Termination, ControlError> {
        let mut monitor = StallMonitor::new(StallConfig::new(tolerance_ticks, window_ms)?)?;

        // Watching starts once the requested power is applied
        let mut phase = self.ramp.speed_up_phase(power, None, None);
        let mut termination = self.ramp.run(ctx, &mut phase, None).await?;
        if termination == Termination::PowerReached {
            self.seed(ctx, Some(&mut monitor));
            termination = self.ramp.hold(ctx, None, Some(&mut monitor)).await;
        }
        if termination == Termination::Cancelled {
            return Ok(termination);
        }

        if self.ramp.ramp_to_zero(ctx).await? == Termination::Cancelled {
            return Ok(Termination::Cancelled);
        }
        self.settle(termination)
    }

    fn seed<C: ControlContext>(&mut self, ctx: &C, monitor: Option<&mut StallMonitor>) {
        if let Some(monitor) = monitor {
            let tick = self.ramp.motor_mut().tick_count();
            monitor.reset(tick, ctx.elapsed_ms());
        }
    }

    /// Brake unless the loop was cancelled
    fn settle(&mut self, termination: Termination) -> Result<Termination, ControlError> {
        if termination != Termination::Cancelled {
            self.ramp.motor_mut().brake()?;
        }
        Ok(termination)
    }
}
