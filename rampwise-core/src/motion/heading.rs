//! Gyro heading correction
//!
//! Proportional steering for a two-motor differential drive. Headings follow
//! the compass convention: degrees, clockwise positive, unwrapped. A
//! positive heading error means the robot has turned clockwise past its
//! target, so a positive steer slows the left wheel and speeds up the right.

use super::Termination;
use crate::config::HeadingConfig;
use crate::error::{check_timeout, ControlError};
use crate::power::{sign, PowerMagnitude, PowerVector};
use crate::traits::{ControlContext, ControlEvent, EncoderMotor, Gyro, PhaseKind, Telemetry};

/// Signed heading error in `(-180, 180]` degrees
///
/// Neither angle needs to be normalized beforehand.
pub fn heading_error(target: f64, current: f64) -> f64 {
    let mut error = libm::fmod(current - target, 360.0);
    if error > 180.0 {
        error -= 360.0;
    } else if error <= -180.0 {
        error += 360.0;
    }
    error
}

/// Steering correction clipped to `[-1, 1]`
pub fn compute_steer(error: f64, gain: f64) -> f64 {
    (error * gain).clamp(-1.0, 1.0)
}

/// Mix a drive speed with a steering correction
///
/// Returns `(left, right)`. When either side exceeds 1 both are divided by
/// the larger magnitude so their ratio is kept.
pub fn mix_drive(speed: f64, steer: f64) -> (f64, f64) {
    let left = speed - steer;
    let right = speed + steer;
    let max = libm::fabs(left).max(libm::fabs(right));
    if max > 1.0 {
        (left / max, right / max)
    } else {
        (left, right)
    }
}

/// Target bearing with its steering tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeadingTarget {
    /// Target heading (degrees, any real value)
    pub angle_deg: f64,
    /// Proportional gain
    pub gain: f64,
    /// Errors at or below this magnitude count as on target (degrees)
    pub lock_threshold_deg: f64,
}

impl HeadingTarget {
    /// Create a target from its angle, gain and lock threshold
    pub fn new(angle_deg: f64, gain: f64, lock_threshold_deg: f64) -> Self {
        Self {
            angle_deg,
            gain,
            lock_threshold_deg,
        }
    }

    /// Heading error for a gyro reading
    pub fn error(&self, current: f64) -> f64 {
        heading_error(self.angle_deg, current)
    }

    /// Whether `error` is within the lock threshold
    pub fn is_locked(&self, error: f64) -> bool {
        libm::fabs(error) <= self.lock_threshold_deg
    }

    /// Steering correction for `error`, zero when locked
    pub fn steer(&self, error: f64) -> f64 {
        if self.is_locked(error) {
            0.0
        } else {
            compute_steer(error, self.gain)
        }
    }
}

/// Gyro-steered differential drive
///
/// Owns both drive motors, the gyro and a telemetry sink. The two wheels
/// are always commanded together from one loop.
pub struct HeadingController<L, R, G, T> {
    left: L,
    right: R,
    gyro: G,
    telemetry: T,
    config: HeadingConfig,
}

impl<L, R, G, T> HeadingController<L, R, G, T>
where
    L: EncoderMotor,
    R: EncoderMotor,
    G: Gyro,
    T: Telemetry,
{
    /// Create a controller, validating the tuning and both motor models
    pub fn new(
        left: L,
        right: R,
        gyro: G,
        telemetry: T,
        config: HeadingConfig,
    ) -> Result<Self, ControlError> {
        config.validate()?;
        left.model().validate()?;
        right.model().validate()?;
        Ok(Self {
            left,
            right,
            gyro,
            telemetry,
            config,
        })
    }

    /// Steering tuning
    pub fn config(&self) -> &HeadingConfig {
        &self.config
    }

    /// Left drive motor
    pub fn left(&self) -> &L {
        &self.left
    }

    /// Right drive motor
    pub fn right(&self) -> &R {
        &self.right
    }

    /// Release motors, gyro and telemetry sink
    pub fn into_parts(self) -> (L, R, G, T) {
        (self.left, self.right, self.gyro, self.telemetry)
    }

    /// Turn in place until the heading locks
    ///
    /// Each cycle applies `-steer * power` to the left wheel and
    /// `+steer * power` to the right. Once locked both wheels receive
    /// `power` and the loop returns; there is no timeout, only cancellation.
    pub async fn turn_to_heading<C: ControlContext>(
        &mut self,
        ctx: &mut C,
        power: PowerMagnitude,
        angle_deg: f64,
    ) -> Result<Termination, ControlError> {
        let target = HeadingTarget::new(
            angle_deg,
            self.config.turn_gain,
            self.config.lock_threshold_deg,
        );
        let started_ms = ctx.elapsed_ms();
        self.start(PhaseKind::Turn, None, power.value());

        let termination = loop {
            if !ctx.is_active() {
                break Termination::Cancelled;
            }
            if self.on_heading(&target, power)? {
                break Termination::HeadingLocked;
            }
            ctx.wait_for_next_cycle(self.config.cycle_period_ms).await;
        };

        self.finish(&*ctx, PhaseKind::Turn, termination, started_ms);
        Ok(termination)
    }

    /// Keep correcting toward `angle_deg` for `duration_ms`, then stop
    ///
    /// Locking does not end the loop.
    pub async fn hold_heading<C: ControlContext>(
        &mut self,
        ctx: &mut C,
        power: PowerMagnitude,
        angle_deg: f64,
        duration_ms: i64,
    ) -> Result<Termination, ControlError> {
        let duration = check_timeout(duration_ms)?;
        let target = HeadingTarget::new(
            angle_deg,
            self.config.turn_gain,
            self.config.lock_threshold_deg,
        );
        let started_ms = ctx.elapsed_ms();
        self.start(PhaseKind::HeadingHold, None, power.value());

        let termination = loop {
            if !ctx.is_active() {
                break Termination::Cancelled;
            }
            if ctx.elapsed_ms().saturating_sub(started_ms) >= duration {
                break Termination::DurationElapsed;
            }
            self.on_heading(&target, power)?;
            ctx.wait_for_next_cycle(self.config.cycle_period_ms).await;
        };

        if termination != Termination::Cancelled {
            self.stop()?;
        }
        self.finish(&*ctx, PhaseKind::HeadingHold, termination, started_ms);
        Ok(termination)
    }

    /// Drive `distance_ticks` while steering toward `angle_deg`, then stop
    ///
    /// A negative distance drives in reverse. The move ends as soon as
    /// either wheel has covered the distance.
    pub async fn drive_straight<C: ControlContext>(
        &mut self,
        ctx: &mut C,
        power: PowerMagnitude,
        distance_ticks: i32,
        angle_deg: f64,
    ) -> Result<Termination, ControlError> {
        let direction = f64::from(sign(f64::from(distance_ticks)));
        let goal = i64::from(distance_ticks).abs();
        let target = HeadingTarget::new(
            angle_deg,
            self.config.drive_gain,
            self.config.lock_threshold_deg,
        );
        let speed = power.value();
        let left_start = self.left.tick_count();
        let right_start = self.right.tick_count();
        let end_tick = i64::from(left_start) + i64::from(distance_ticks);
        let started_ms = ctx.elapsed_ms();
        self.start(
            PhaseKind::Drive,
            Some(end_tick.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32),
            speed * direction,
        );

        let moved = |tick: i32, start: i32| (i64::from(tick) - i64::from(start)) * direction as i64;

        let termination = loop {
            if !ctx.is_active() {
                break Termination::Cancelled;
            }
            let left_moved = moved(self.left.tick_count(), left_start);
            let right_moved = moved(self.right.tick_count(), right_start);
            if left_moved >= goal || right_moved >= goal {
                break Termination::TickBudgetReached;
            }

            let heading = self.gyro.heading_degrees();
            let error = target.error(heading);
            let mut steer = target.steer(error);
            if direction < 0.0 {
                steer = -steer;
            }
            let (left, right) = mix_drive(speed, steer);
            let left = left * direction;
            let right = right * direction;
            self.apply(left, right)?;
            self.telemetry.record(&ControlEvent::SteeringApplied {
                error_deg: error,
                steer,
                left,
                right,
            });

            ctx.wait_for_next_cycle(self.config.cycle_period_ms).await;
        };

        if termination != Termination::Cancelled {
            self.stop()?;
        }
        self.finish(&*ctx, PhaseKind::Drive, termination, started_ms);
        Ok(termination)
    }

    /// One correction step; returns true when locked
    fn on_heading(&mut self, target: &HeadingTarget, power: PowerMagnitude) -> Result<bool, ControlError> {
        let heading = self.gyro.heading_degrees();
        let error = target.error(heading);
        let locked = target.is_locked(error);
        let steer = target.steer(error);
        let (left, right) = if locked {
            (power.value(), power.value())
        } else {
            (-steer * power.value(), steer * power.value())
        };

        self.apply(left, right)?;
        self.telemetry.record(&ControlEvent::SteeringApplied {
            error_deg: error,
            steer,
            left,
            right,
        });
        if locked {
            self.telemetry
                .record(&ControlEvent::HeadingLocked { heading_deg: heading });
        }
        Ok(locked)
    }

    fn apply(&mut self, left: f64, right: f64) -> Result<(), ControlError> {
        self.left.set_power(PowerVector::new(left)?)?;
        self.right.set_power(PowerVector::new(right)?)?;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ControlError> {
        self.left.brake()?;
        self.right.brake()?;
        Ok(())
    }

    fn start(&mut self, kind: PhaseKind, end_tick: Option<i32>, target_power: f64) {
        let start_tick = self.left.tick_count();
        let start_power = self.left.power().value();
        self.telemetry.record(&ControlEvent::PhaseStarted {
            kind,
            start_tick,
            end_tick,
            start_power,
            target_power,
        });
    }

    fn finish<C: ControlContext>(
        &mut self,
        ctx: &C,
        kind: PhaseKind,
        termination: Termination,
        started_ms: u64,
    ) {
        let tick = self.left.tick_count();
        self.telemetry.record(&ControlEvent::PhaseFinished {
            kind,
            termination,
            tick,
            elapsed_ms: ctx.elapsed_ms().saturating_sub(started_ms),
        });
    }
}
