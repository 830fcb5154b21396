//! Motion control loops
//!
//! Bounded power ramps, tick excursions and gyro heading correction. Every
//! loop runs one step per control cycle and yields to the
//! [`ControlContext`](crate::traits::ControlContext) between steps.

pub mod excursion;
pub mod heading;
pub mod ramp;

pub use excursion::{split_ticks, ExcursionPlanner};
pub use heading::{compute_steer, heading_error, HeadingController, HeadingTarget};
pub use ramp::{
    is_deceleration_running, ramp_step, tick_to_start_decel, RampController, RampPhase,
};

/// Why a control loop stopped
///
/// These are normal outcomes that callers branch on, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Termination {
    /// Tick budget consumed
    TickBudgetReached,
    /// Phase timeout elapsed
    Timeout,
    /// Context reported the robot is no longer active
    Cancelled,
    /// Stall monitor tripped
    Stalled,
    /// Applied power reached the phase target
    PowerReached,
    /// Requested duration elapsed
    DurationElapsed,
    /// Heading error within the lock threshold
    HeadingLocked,
}
