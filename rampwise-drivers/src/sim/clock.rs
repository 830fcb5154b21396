//! Simulated time

use core::cell::Cell;

use rampwise_core::traits::{Clock, ControlContext};

/// Millisecond clock that only moves when told to
#[derive(Debug, Default)]
pub struct SimClock {
    now_ms: Cell<u64>,
}

impl SimClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get().saturating_add(ms));
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

/// Control context on simulated time
///
/// Each wait advances the clock by exactly one period, so loops run as
/// fast as the host allows with reproducible timing.
pub struct SimContext<'a> {
    clock: &'a SimClock,
    origin_ms: u64,
    /// Context goes inactive once the clock reaches this time
    active_until: Option<u64>,
    cycles: u32,
}

impl<'a> SimContext<'a> {
    /// Create a context; elapsed time counts from the clock's current time
    pub fn new(clock: &'a SimClock) -> Self {
        Self {
            clock,
            origin_ms: clock.now_ms(),
            active_until: None,
            cycles: 0,
        }
    }

    /// Cancel the context at an absolute simulated time
    pub fn cancel_at(mut self, ms: u64) -> Self {
        self.active_until = Some(ms);
        self
    }

    /// Number of cycles waited so far
    pub fn cycles(&self) -> u32 {
        self.cycles
    }
}

impl ControlContext for SimContext<'_> {
    fn is_active(&self) -> bool {
        self.active_until
            .map_or(true, |until| self.clock.now_ms() < until)
    }

    fn elapsed_ms(&self) -> u64 {
        self.clock.now_ms().saturating_sub(self.origin_ms)
    }

    async fn wait_for_next_cycle(&mut self, period_ms: u32) {
        self.clock.advance(u64::from(period_ms));
        self.cycles = self.cycles.saturating_add(1);
    }
}
