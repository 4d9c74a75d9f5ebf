//! Millisecond time base on LPTMR0.
//!
//! The timer free-runs from the 1 kHz LPO. Its counter is only 16 bits, so
//! every read folds the hardware count into a 32-bit software count. Reads
//! must come at least once per 65 s wrap of the hardware counter.

use core::cell::Cell;

use critical_section::Mutex;
use sense::time::Clock;

use crate::reg::{sim, Reg};

const CSR: Reg = unsafe { Reg::at(0x4004_0000) };
const PSR: Reg = unsafe { Reg::at(0x4004_0004) };
const CMR: Reg = unsafe { Reg::at(0x4004_0008) };
const CNR: Reg = unsafe { Reg::at(0x4004_000C) };

const CSR_TEN: u32 = 1 << 0;
/// Free-running: the counter is not reset on compare
const CSR_TFC: u32 = 1 << 2;
const CSR_TCF: u32 = 1 << 7;
/// Prescaler bypassed, clock source 1 (LPO)
const PSR_PBYP_LPO: u32 = (1 << 2) | 0b01;

#[derive(Clone, Copy)]
struct Extended {
    last: u16,
    ticks: u32,
}

static TIME: Mutex<Cell<Extended>> = Mutex::new(Cell::new(Extended { last: 0, ticks: 0 }));

/// Handle to the LPTMR time base. Copies all read the same counter.
#[derive(Clone, Copy)]
pub struct Lptmr {
    _private: (),
}

impl Lptmr {
    /// Start the timer. Call once at start-up.
    pub fn start() -> Self {
        sim::SCGC5.set_bits(sim::SCGC5_LPTMR);
        CSR.write(0);
        PSR.write(PSR_PBYP_LPO);
        CMR.write(0xFFFF);
        CSR.write(CSR_TCF | CSR_TFC | CSR_TEN);
        Self { _private: () }
    }

    fn hardware_count() -> u16 {
        // CNR latches on write
        CNR.write(0);
        CNR.read() as u16
    }
}

impl Clock for Lptmr {
    fn now(&self) -> u32 {
        critical_section::with(|cs| {
            let cell = TIME.borrow(cs);
            let mut time = cell.get();
            let count = Self::hardware_count();
            time.ticks = time.ticks.wrapping_add(count.wrapping_sub(time.last) as u32);
            time.last = count;
            cell.set(time);
            time.ticks
        })
    }
}
