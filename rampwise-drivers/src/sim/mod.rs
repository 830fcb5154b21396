//! Deterministic simulation
//!
//! Host-side stand-ins for the hardware bindings: a clock that only moves
//! when a loop waits, proportional motors with optional travel limits, a
//! differential-drive gyro and a bounded event log. Loops run unmodified
//! against these and can be stepped with `embassy_futures::block_on`.

pub mod clock;
pub mod gyro;
pub mod log;
pub mod motor;

pub use clock::{SimClock, SimContext};
pub use gyro::SimGyro;
pub use log::EventLog;
pub use motor::SimMotor;
