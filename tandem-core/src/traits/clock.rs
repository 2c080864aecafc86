//! Monotonic microsecond clock

/// Monotonic microsecond counter, used only for latency measurement
pub trait MicrosClock {
    /// Microseconds since an arbitrary fixed origin
    fn now_us(&self) -> u64;

    /// Microseconds elapsed since `start`, saturating at zero
    fn elapsed_us(&self, start: u64) -> u64 {
        self.now_us().saturating_sub(start)
    }
}

impl<T: MicrosClock> MicrosClock for &T {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}
