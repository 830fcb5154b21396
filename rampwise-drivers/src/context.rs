//! Paced control context
//!
//! Runs control loops at a fixed cycle period on an async delay. The
//! op-mode clears a shared flag to cancel; waits are sliced so that a
//! cancelled loop wakes within [`CANCEL_SLICE_MS`].

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal_async::delay::DelayNs;
use rampwise_core::traits::{Clock, ControlContext};

/// Longest uninterrupted sleep while waiting for the next cycle
pub const CANCEL_SLICE_MS: u64 = 10;

/// Control context driven by a delay provider and a monotonic clock
pub struct PacedContext<'a, D, K> {
    delay: D,
    clock: K,
    active: &'a AtomicBool,
    origin_ms: u64,
    /// When the current cycle began
    cycle_start_ms: Option<u64>,
    overruns: u32,
}

impl<'a, D: DelayNs, K: Clock> PacedContext<'a, D, K> {
    /// Create a context; elapsed time counts from now
    pub fn new(delay: D, clock: K, active: &'a AtomicBool) -> Self {
        let origin_ms = clock.now_ms();
        Self {
            delay,
            clock,
            active,
            origin_ms,
            cycle_start_ms: None,
            overruns: 0,
        }
    }

    /// Cycles whose work took longer than the period
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Release the delay provider and clock
    pub fn into_parts(self) -> (D, K) {
        (self.delay, self.clock)
    }
}

impl<D: DelayNs, K: Clock> ControlContext for PacedContext<'_, D, K> {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    fn elapsed_ms(&self) -> u64 {
        self.clock.now_ms().saturating_sub(self.origin_ms)
    }

    async fn wait_for_next_cycle(&mut self, period_ms: u32) {
        let now = self.clock.now_ms();
        let period = u64::from(period_ms);
        let mut deadline = self.cycle_start_ms.unwrap_or(now) + period;

        if now > deadline + period {
            // Idle since the last cycle; a new loop gets a full period
            deadline = now + period;
        } else if now >= deadline {
            // Overran; start the next cycle immediately
            self.overruns = self.overruns.saturating_add(1);
            self.cycle_start_ms = Some(now);
            return;
        }

        loop {
            let now = self.clock.now_ms();
            if now >= deadline || !self.is_active() {
                break;
            }
            let slice = (deadline - now).min(CANCEL_SLICE_MS);
            // slice is at most CANCEL_SLICE_MS
            self.delay.delay_ms(slice as u32).await;
        }
        self.cycle_start_ms = Some(deadline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimClock;
    use embassy_futures::block_on;

    /// Delay that advances a simulated clock and records each sleep
    struct SimDelay<'a> {
        clock: &'a SimClock,
        sleeps: Vec<u32>,
        /// Clear this flag once the clock reaches the given time
        cancel_at: Option<(u64, &'a AtomicBool)>,
    }

    impl DelayNs for SimDelay<'_> {
        async fn delay_ns(&mut self, ns: u32) {
            let ms = ns / 1_000_000;
            self.sleeps.push(ms);
            self.clock.advance(u64::from(ms));
            if let Some((at, flag)) = self.cancel_at {
                if self.clock.now_ms() >= at {
                    flag.store(false, Ordering::Relaxed);
                }
            }
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.delay_ns(ms * 1_000_000).await
        }
    }

    fn delay(clock: &SimClock) -> SimDelay<'_> {
        SimDelay {
            clock,
            sleeps: Vec::new(),
            cancel_at: None,
        }
    }

    #[test]
    fn test_waits_in_slices() {
        let clock = SimClock::new();
        let active = AtomicBool::new(true);
        let mut ctx = PacedContext::new(delay(&clock), &clock, &active);

        block_on(ctx.wait_for_next_cycle(50));
        assert_eq!(ctx.elapsed_ms(), 50);
        let (sim_delay, _) = ctx.into_parts();
        assert_eq!(sim_delay.sleeps, vec![10, 10, 10, 10, 10]);
    }

    #[test]
    fn test_period_measured_from_cycle_start() {
        let clock = SimClock::new();
        let active = AtomicBool::new(true);
        let mut ctx = PacedContext::new(delay(&clock), &clock, &active);

        block_on(ctx.wait_for_next_cycle(50));
        // 20 ms of work inside the cycle
        clock.advance(20);
        block_on(ctx.wait_for_next_cycle(50));
        assert_eq!(ctx.elapsed_ms(), 100);
        assert_eq!(ctx.overruns(), 0);
    }

    #[test]
    fn test_overrun_returns_immediately() {
        let clock = SimClock::new();
        let active = AtomicBool::new(true);
        let mut ctx = PacedContext::new(delay(&clock), &clock, &active);

        block_on(ctx.wait_for_next_cycle(50));
        clock.advance(70);
        block_on(ctx.wait_for_next_cycle(50));
        assert_eq!(ctx.elapsed_ms(), 120);
        assert_eq!(ctx.overruns(), 1);
    }

    #[test]
    fn test_first_cycle_after_idle_waits_full_period() {
        let clock = SimClock::new();
        let active = AtomicBool::new(true);
        let mut ctx = PacedContext::new(delay(&clock), &clock, &active);

        block_on(ctx.wait_for_next_cycle(50));
        // Next loop starts a second later
        clock.advance(1000);
        block_on(ctx.wait_for_next_cycle(50));
        assert_eq!(ctx.elapsed_ms(), 1100);
        assert_eq!(ctx.overruns(), 0);

        block_on(ctx.wait_for_next_cycle(50));
        assert_eq!(ctx.elapsed_ms(), 1150);
        let (sim_delay, _) = ctx.into_parts();
        assert_eq!(sim_delay.sleeps.iter().sum::<u32>(), 150);
    }

    #[test]
    fn test_cancel_wakes_within_slice() {
        let clock = SimClock::new();
        let active = AtomicBool::new(true);
        let mut sim_delay = delay(&clock);
        sim_delay.cancel_at = Some((15, &active));
        let mut ctx = PacedContext::new(sim_delay, &clock, &active);

        block_on(ctx.wait_for_next_cycle(1000));
        assert!(!ctx.is_active());
        assert!(ctx.elapsed_ms() <= 15 + CANCEL_SLICE_MS);
    }
}
