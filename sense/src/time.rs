//! Monotonic tick source shared by the wait primitives.
//!
//! A [`Clock`] yields a free-running 32-bit count, nominally in milliseconds.
//! All elapsed-time arithmetic is done with wrapping subtraction, so a wait
//! spanning a counter wrap is still measured correctly as long as the span
//! itself is shorter than 2^32 ticks.

use embedded_hal::delay::DelayNs;

/// Timeout value that disables the deadline check entirely
pub const WAIT_FOREVER: u32 = u32::MAX;

pub trait Clock {
    /// Current tick count
    fn now(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> u32 {
        (**self).now()
    }
}

/// Ticks elapsed from `start` to `end`
pub fn elapsed(start: u32, end: u32) -> u32 {
    end.wrapping_sub(start)
}

/// Busy-wait delay driven by a [`Clock`] with millisecond ticks.
///
/// Sub-millisecond requests are rounded up to a full tick.
pub struct ClockDelay<C> {
    clock: C,
}

impl<C: Clock> ClockDelay<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn wait_ticks(&self, ticks: u32) {
        let start = self.clock.now();
        while elapsed(start, self.clock.now()) < ticks {
            core::hint::spin_loop();
        }
    }
}

impl<C: Clock> DelayNs for ClockDelay<C> {
    fn delay_ns(&mut self, ns: u32) {
        self.wait_ticks(ns.div_ceil(1_000_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.wait_ticks(us.div_ceil(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wait_ticks(ms);
    }
}
