//! Configuration types
//!
//! Board-agnostic tuning structures. With the `serde` feature they can be
//! loaded from a config file; every table falls back to its defaults.

pub mod motor;
pub mod types;

pub use motor::*;
pub use types::*;
