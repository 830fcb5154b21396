//! Safety monitoring
//!
//! Detects mechanical stalls from encoder readings.

pub mod stall;

pub use stall::{StallMonitor, StallState};
