//! Motor bindings
//!
//! - H-bridge DC motor: PWM duty for magnitude, one pin for direction
//! - Quadrature encoder: software x4 decoding of two input pins

pub mod encoder;
pub mod hbridge;

pub use encoder::{EncoderCounter, QuadratureEncoder};
pub use hbridge::{HBridgeConfig, HBridgeMotor};
