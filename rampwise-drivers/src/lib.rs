//! Hardware bindings for the rampwise control engine
//!
//! This crate provides concrete implementations of the capability traits
//! defined in rampwise-core:
//!
//! - H-bridge DC motor with quadrature encoder (embedded-hal 1.0)
//! - Paced control context over an async delay
//! - defmt telemetry sink
//! - Deterministic simulation for host-side dry runs
//! - TOML configuration loader

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[cfg(feature = "toml")]
pub mod config;
pub mod context;
pub mod motor;
pub mod sim;
#[cfg(feature = "defmt")]
pub mod telemetry;
