//! Capability traits
//!
//! These traits define the interface between the control engine and the
//! hardware-binding layer that owns the physical motors, gyro and clock.

pub mod context;
pub mod gyro;
pub mod motor;
pub mod telemetry;

pub use context::{Clock, ControlContext};
pub use gyro::Gyro;
pub use motor::{EncoderMotor, MotorError};
pub use telemetry::{ControlEvent, NullTelemetry, PhaseKind, Telemetry};
