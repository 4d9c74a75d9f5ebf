use core::cell::Cell;

use critical_section::Mutex;

use crate::reg::{sim, Irq, Reg};

const MCR: Reg = unsafe { Reg::at(0x4003_7000) };
const LDVAL0: Reg = unsafe { Reg::at(0x4003_7100) };
const TCTRL0: Reg = unsafe { Reg::at(0x4003_7108) };
const TFLG0: Reg = unsafe { Reg::at(0x4003_710C) };

/// Freeze while the core is halted by a debugger
const MCR_FRZ: u32 = 1 << 0;
const TCTRL_TEN: u32 = 1 << 0;
const TCTRL_TIE: u32 = 1 << 1;
const TFLG_TIF: u32 = 1 << 0;

pub type TickCallback = fn();

static CALLBACK: Mutex<Cell<Option<TickCallback>>> = Mutex::new(Cell::new(None));

/// Periodic tick on PIT channel 0
pub struct TickTimer {
    clk_freq: u32,
}

impl TickTimer {
    /// `clk_freq` is the bus clock feeding the PIT
    pub fn new(clk_freq: u32, period_us: u32) -> Self {
        sim::SCGC6.set_bits(sim::SCGC6_PIT);
        MCR.write(MCR_FRZ);

        let mut obj = Self { clk_freq };
        obj.set_period_us(period_us);
        obj
    }

    pub fn set_period_us(&mut self, period_us: u32) {
        let ldval = (self.clk_freq as u64 * period_us as u64 / 1_000_000) as u32;
        let ldval = ldval.saturating_sub(1);
        LDVAL0.write(ldval);
    }

    /// Run `callback` from the interrupt on every tick
    pub fn set_callback(&mut self, callback: Option<TickCallback>) {
        critical_section::with(|cs| CALLBACK.borrow(cs).set(callback));
    }

    pub fn start(&mut self) {
        TFLG0.write(TFLG_TIF);
        TCTRL0.write(TCTRL_TIE | TCTRL_TEN);
        Irq::Pit.unmask();
    }
}

pub fn on_interrupt() {
    TFLG0.write(TFLG_TIF);
    if let Some(callback) = critical_section::with(|cs| CALLBACK.borrow(cs).get()) {
        callback();
    }
}
