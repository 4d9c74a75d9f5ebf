use core::cell::Cell;

use critical_section::Mutex;

use super::{SyncError, Waiter};
use crate::time::Clock;

#[derive(Clone, Copy, Debug)]
struct SemState {
    count: u8,
    wait: Waiter,
}

/// Counting semaphore, max count 255.
///
/// Typically posted from interrupt context and polled from the main loop.
pub struct Semaphore {
    state: Mutex<Cell<SemState>>,
}

impl Semaphore {
    pub const fn new(initial: u8) -> Self {
        Self {
            state: Mutex::new(Cell::new(SemState {
                count: initial,
                wait: Waiter::new(),
            })),
        }
    }

    /// Take one count, or report how the wait is progressing.
    pub fn wait<C: Clock>(&self, timeout: u32, clock: &C) -> nb::Result<(), SyncError> {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();

            let result = if state.count > 0 {
                state.count -= 1;
                state.wait.is_waiting = false;
                Ok(())
            } else {
                state.wait.pending(timeout, || clock.now())
            };

            cell.set(state);
            result
        })
    }

    /// Add one count. Overflow past 255 is rejected rather than saturated.
    pub fn post(&self) -> Result<(), SyncError> {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            if state.count == u8::MAX {
                return Err(SyncError::Overflow);
            }
            state.count += 1;
            cell.set(state);
            Ok(())
        })
    }

    /// Drop any pending counts and forget an in-progress wait
    pub fn reset(&self) {
        critical_section::with(|cs| {
            self.state.borrow(cs).set(SemState {
                count: 0,
                wait: Waiter::new(),
            })
        });
    }

    pub fn count(&self) -> u8 {
        critical_section::with(|cs| self.state.borrow(cs).get().count)
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::testing::StepClock;

    #[test]
    fn post_then_wait() {
        let clock = StepClock::new(0, 1);
        let sem = Semaphore::new(0);
        sem.post().unwrap();
        sem.post().unwrap();
        assert_eq!(sem.count(), 2);
        assert_eq!(sem.wait(0, &clock), Ok(()));
        assert_eq!(sem.wait(0, &clock), Ok(()));
        assert_eq!(sem.wait(0, &clock), Err(nb::Error::Other(SyncError::Timeout)));
    }

    #[test]
    fn overflow_rejected() {
        let sem = Semaphore::new(254);
        assert_eq!(sem.post(), Ok(()));
        assert_eq!(sem.post(), Err(SyncError::Overflow));
        assert_eq!(sem.count(), 255);
    }

    #[test]
    fn wait_times_out() {
        let clock = StepClock::new(0, 0);
        let sem = Semaphore::new(0);
        assert_eq!(sem.wait(1000, &clock), Err(nb::Error::WouldBlock));
        clock.set(999);
        assert_eq!(sem.wait(1000, &clock), Err(nb::Error::WouldBlock));
        clock.set(1000);
        assert_eq!(sem.wait(1000, &clock), Err(nb::Error::Other(SyncError::Timeout)));

        // A fresh wait registers a new start time
        assert_eq!(sem.wait(1000, &clock), Err(nb::Error::WouldBlock));
        sem.post().unwrap();
        assert_eq!(sem.wait(1000, &clock), Ok(()));
    }

    #[test]
    fn reset_drops_counts() {
        let clock = StepClock::new(0, 0);
        let sem = Semaphore::new(3);
        sem.reset();
        assert_eq!(sem.count(), 0);
        assert_eq!(sem.wait(0, &clock), Err(nb::Error::Other(SyncError::Timeout)));
    }
}
