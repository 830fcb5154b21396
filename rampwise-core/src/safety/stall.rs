//! Encoder stall monitor
//!
//! Pure state machine: callers pass in tick readings and timestamps, the
//! monitor never reads a clock or a motor itself.

use crate::config::StallConfig;
use crate::error::ControlError;

/// Stall window state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StallState {
    /// Last poll moved by at least the tolerance
    Moving,
    /// Movement below tolerance; window timer running
    StallPending,
}

/// Stall monitor for one motor
///
/// Trips once the encoder has moved less than the configured tolerance for
/// longer than the configured window. Movement is measured against the
/// reading at the last detected movement, so slow creep still accumulates.
#[derive(Debug, Clone)]
pub struct StallMonitor {
    config: StallConfig,
    /// Tick count at the last detected movement
    last_ticks: Option<i32>,
    /// Timestamp of the last detected movement (ms)
    last_movement_ms: u64,
    state: StallState,
    stalled: bool,
}

impl StallMonitor {
    /// Create a monitor, rejecting negative tolerance or window
    pub fn new(config: StallConfig) -> Result<Self, ControlError> {
        config.validate()?;
        Ok(Self {
            config,
            last_ticks: None,
            last_movement_ms: 0,
            state: StallState::Moving,
            stalled: false,
        })
    }

    /// Restart the window from a known reading
    pub fn reset(&mut self, ticks: i32, now_ms: u64) {
        self.last_ticks = Some(ticks);
        self.last_movement_ms = now_ms;
        self.state = StallState::Moving;
        self.stalled = false;
    }

    /// Feed one reading
    ///
    /// Returns true while the motor is stalled. The first reading after
    /// construction only seeds the window.
    pub fn poll(&mut self, ticks: i32, now_ms: u64) -> bool {
        let Some(last) = self.last_ticks else {
            self.reset(ticks, now_ms);
            return false;
        };

        let moved = (i64::from(ticks) - i64::from(last)).abs();
        if moved < i64::from(self.config.tolerance_ticks) {
            self.state = StallState::StallPending;
            // window_ms is validated non-negative
            let window = self.config.window_ms as u64;
            if self.still_ms(now_ms) > window {
                self.stalled = true;
            }
        } else {
            self.reset(ticks, now_ms);
        }

        self.stalled
    }

    /// Milliseconds since the last detected movement
    pub fn still_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_movement_ms)
    }

    /// Current window state
    pub fn state(&self) -> StallState {
        self.state
    }

    /// Whether the last poll reported a stall
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Configured tuning
    pub fn config(&self) -> StallConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(tolerance_ticks: i32, window_ms: i64) -> StallMonitor {
        StallMonitor::new(StallConfig::new(tolerance_ticks, window_ms).unwrap()).unwrap()
    }

    #[test]
    fn test_first_poll_seeds() {
        let mut m = monitor(5, 100);
        assert!(!m.poll(1000, 0));
        assert_eq!(m.state(), StallState::Moving);
    }

    #[test]
    fn test_trips_only_after_window_exceeded() {
        let mut m = monitor(5, 100);
        m.poll(0, 0);
        assert!(!m.poll(2, 50));
        assert_eq!(m.state(), StallState::StallPending);
        // Exactly at the window is not yet a stall
        assert!(!m.poll(3, 100));
        assert!(m.poll(4, 101));
        assert!(m.is_stalled());
        assert!(m.poll(4, 150));
    }

    #[test]
    fn test_movement_resets_instantly() {
        let mut m = monitor(5, 100);
        m.poll(0, 0);
        assert!(m.poll(1, 200));
        assert!(!m.poll(7, 210));
        assert_eq!(m.state(), StallState::Moving);
        assert!(!m.is_stalled());
        // Window restarts from the new reading
        assert!(!m.poll(8, 300));
        assert!(m.poll(8, 311));
    }

    #[test]
    fn test_slow_creep_accumulates() {
        let mut m = monitor(5, 100);
        m.poll(0, 0);
        // 3 ticks per poll is below tolerance, but every second poll has
        // moved far enough from the last reset point
        for (i, t) in [3, 6, 9, 12, 15, 18].iter().enumerate() {
            assert!(!m.poll(*t, (i as u64 + 1) * 60));
        }
    }

    #[test]
    fn test_reverse_motion_counts_as_movement() {
        let mut m = monitor(5, 100);
        m.poll(-100, 0);
        assert!(!m.poll(-110, 150));
        assert_eq!(m.state(), StallState::Moving);
    }

    #[test]
    fn test_negative_config_rejected() {
        let config = StallConfig {
            tolerance_ticks: -3,
            window_ms: 100,
        };
        assert!(StallMonitor::new(config).is_err());
    }
}
