//! Board-agnostic motor control engine
//!
//! This crate contains the control logic that does not depend on specific
//! hardware implementations:
//!
//! - Bounded power value types
//! - Capability traits (encoder motor, gyro, control context, telemetry)
//! - Trapezoidal power ramps and tick excursions
//! - Encoder stall detection
//! - Gyro heading correction for a differential drive
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod motion;
pub mod power;
pub mod safety;
pub mod traits;

#[cfg(test)]
mod testing;
