use core::cell::Cell;

use critical_section::Mutex;

use super::{SyncError, Waiter};
use crate::time::Clock;

#[derive(Clone, Copy, Debug)]
struct MutexState {
    is_locked: bool,
    wait: Waiter,
}

/// Non-blocking mutual exclusion flag.
///
/// `lock` either takes the lock, reports a terminal timeout, or asks the caller
/// to come back later. There is no ownership tracking and no priority
/// handling: whoever calls `unlock` releases it.
pub struct CoopMutex {
    state: Mutex<Cell<MutexState>>,
}

impl CoopMutex {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(MutexState {
                is_locked: false,
                wait: Waiter::new(),
            })),
        }
    }

    /// Try to take the lock.
    ///
    /// Returns `WouldBlock` while the lock is held and the timeout has not yet
    /// elapsed. With `timeout == 0` a held lock is reported as a timeout
    /// straight away and nothing is recorded.
    pub fn lock<C: Clock>(&self, timeout: u32, clock: &C) -> nb::Result<(), SyncError> {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();

            let result = if !state.is_locked {
                state.is_locked = true;
                state.wait.is_waiting = false;
                Ok(())
            } else {
                state.wait.pending(timeout, || clock.now())
            };

            cell.set(state);
            result
        })
    }

    pub fn unlock(&self) {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            state.is_locked = false;
            cell.set(state);
        });
    }

    pub fn is_locked(&self) -> bool {
        critical_section::with(|cs| self.state.borrow(cs).get().is_locked)
    }

    pub fn is_waiting(&self) -> bool {
        critical_section::with(|cs| self.state.borrow(cs).get().wait.is_waiting)
    }
}

impl Default for CoopMutex {
    fn default() -> Self {
        Self::new()
    }
}
