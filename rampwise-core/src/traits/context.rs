//! Control loop pacing and cancellation

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;
}

impl<K: Clock + ?Sized> Clock for &K {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Explicit context threaded through every control loop
///
/// Replaces ambient "is the op-mode still running" state. Loops check
/// [`is_active`](ControlContext::is_active) at the top of every cycle and
/// exit promptly once it turns false, leaving power as last set.
#[allow(async_fn_in_trait)]
pub trait ControlContext {
    /// False once the robot should stop
    fn is_active(&self) -> bool;

    /// Milliseconds elapsed since the context was created
    fn elapsed_ms(&self) -> u64;

    /// Suspend until `period_ms` has passed since the previous cycle began
    ///
    /// Implementations may return early when the context is cancelled.
    async fn wait_for_next_cycle(&mut self, period_ms: u32);
}
