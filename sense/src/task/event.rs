use core::cell::Cell;

use bitflags::bitflags;
use critical_section::Mutex;

bitflags! {
    /// Work requested of the main loop by the tick interrupt
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Events: u32 {
        const SENSE_TOUCH = 1 << 0;
        const READ_TEMP = 1 << 1;
        const BLINK_LED = 1 << 2;
    }
}

/// Event bitmask shared between interrupt handlers and the main loop.
///
/// Raising a flag that is already set coalesces with it. Each flag is
/// consumed exactly once by [`take`](Self::take).
pub struct EventFlags {
    bits: Mutex<Cell<u32>>,
}

impl EventFlags {
    pub const fn new() -> Self {
        Self {
            bits: Mutex::new(Cell::new(0)),
        }
    }

    pub fn raise(&self, events: Events) {
        critical_section::with(|cs| {
            let bits = self.bits.borrow(cs);
            bits.set(bits.get() | events.bits());
        });
    }

    /// Clear `event` and report whether it was set
    pub fn take(&self, event: Events) -> bool {
        critical_section::with(|cs| {
            let bits = self.bits.borrow(cs);
            let was_set = bits.get() & event.bits() == event.bits();
            bits.set(bits.get() & !event.bits());
            was_set
        })
    }

    pub fn pending(&self) -> Events {
        critical_section::with(|cs| Events::from_bits_truncate(self.bits.borrow(cs).get()))
    }
}

impl Default for EventFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Divides the base tick into the touch, temperature and blink rates.
///
/// Touch sensing runs every tick, the temperature read every `temp_period`
/// ticks and the blink every `blink_period` ticks, at which point the
/// counter restarts.
pub struct Cadence {
    counter: Mutex<Cell<u16>>,
    temp_period: u16,
    blink_period: u16,
}

impl Cadence {
    pub const fn new(temp_period: u16, blink_period: u16) -> Self {
        assert!(temp_period > 0 && blink_period > 0);
        Self {
            counter: Mutex::new(Cell::new(0)),
            temp_period,
            blink_period,
        }
    }

    /// Count one tick and return the events it triggers
    pub fn tick(&self) -> Events {
        critical_section::with(|cs| {
            let counter = self.counter.borrow(cs);
            let count = counter.get() + 1;

            let mut events = Events::SENSE_TOUCH;
            if count % self.temp_period == 0 {
                events |= Events::READ_TEMP;
            }
            if count >= self.blink_period {
                events |= Events::READ_TEMP | Events::BLINK_LED;
                counter.set(0);
            } else {
                counter.set(count);
            }
            events
        })
    }

    /// Tick and publish the result
    pub fn tick_into(&self, flags: &EventFlags) {
        flags.raise(self.tick());
    }

    /// Ticks since the last blink
    pub fn count(&self) -> u16 {
        critical_section::with(|cs| self.counter.borrow(cs).get())
    }
}
