//! Cooperative synchronization primitives for a single-core target without an RTOS.
//!
//! Nothing here suspends the caller. A wait that cannot be satisfied yet returns
//! [`nb::Error::WouldBlock`] and the caller is expected to poll again, letting
//! interrupts run in between. Every state change happens inside a
//! `critical_section::with` block, which on Cortex-M is a global interrupt mask.
//!
//! Timeouts are expressed in [`Clock`](crate::time::Clock) ticks. A timeout of
//! `0` never waits, and [`WAIT_FOREVER`](crate::time::WAIT_FOREVER) never
//! expires.

mod mutex;
mod queue;
mod semaphore;

pub use mutex::CoopMutex;
pub use queue::MsgQueue;
pub use semaphore::Semaphore;

use crate::time::{elapsed, WAIT_FOREVER};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncError {
    /// The wait deadline passed before the object became available
    Timeout,
    /// Semaphore count is already at its maximum
    Overflow,
    /// No room left in the queue
    Full,
    /// Nothing to dequeue
    Empty,
}

/// Bookkeeping for a caller that is polling an unavailable object
#[derive(Clone, Copy, Debug, Default)]
struct Waiter {
    is_waiting: bool,
    time_start: u32,
    timeout: u32,
}

impl Waiter {
    const fn new() -> Self {
        Self {
            is_waiting: false,
            time_start: 0,
            timeout: 0,
        }
    }

    /// Advance the wait for an object that is currently unavailable
    fn pending(&mut self, timeout: u32, now: impl FnOnce() -> u32) -> nb::Result<(), SyncError> {
        if timeout == 0 {
            return Err(nb::Error::Other(SyncError::Timeout));
        }

        if self.is_waiting {
            if self.timeout != WAIT_FOREVER && elapsed(self.time_start, now()) >= self.timeout {
                self.is_waiting = false;
                return Err(nb::Error::Other(SyncError::Timeout));
            }
        } else if timeout != WAIT_FOREVER {
            self.is_waiting = true;
            self.time_start = now();
            self.timeout = timeout;
        }

        Err(nb::Error::WouldBlock)
    }
}
