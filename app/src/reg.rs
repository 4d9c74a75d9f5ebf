//! Memory mapped registers of the MKL25Z4 used by the firmware.

use core::ptr::{read_volatile, write_volatile};

/// A 32-bit peripheral register
#[derive(Clone, Copy)]
pub struct Reg(usize);

impl Reg {
    /// # Safety
    /// `addr` must be the address of a 32-bit register of this device.
    pub const unsafe fn at(addr: usize) -> Self {
        Self(addr)
    }

    /// Register `offset` bytes further on
    pub const fn offset(self, offset: usize) -> Self {
        Self(self.0 + offset)
    }

    pub fn read(self) -> u32 {
        unsafe { read_volatile(self.0 as *const u32) }
    }

    pub fn write(self, value: u32) {
        unsafe { write_volatile(self.0 as *mut u32, value) }
    }

    pub fn modify(self, f: impl FnOnce(u32) -> u32) {
        self.write(f(self.read()));
    }

    pub fn set_bits(self, mask: u32) {
        self.modify(|v| v | mask);
    }

    pub fn clear_bits(self, mask: u32) {
        self.modify(|v| v & !mask);
    }

    /// Replace the field `mask << shift` with `value`
    pub fn write_field(self, shift: u32, mask: u32, value: u32) {
        self.modify(|v| (v & !(mask << shift)) | ((value & mask) << shift));
    }
}

pub mod sim {
    use super::Reg;

    pub const SCGC5: Reg = unsafe { Reg::at(0x4004_8038) };
    pub const SCGC6: Reg = unsafe { Reg::at(0x4004_803C) };
    pub const COPC: Reg = unsafe { Reg::at(0x4004_8100) };

    pub const SCGC5_LPTMR: u32 = 1 << 0;
    pub const SCGC5_TSI: u32 = 1 << 5;
    pub const SCGC5_PORTB: u32 = 1 << 10;
    pub const SCGC5_PORTD: u32 = 1 << 12;

    pub const SCGC6_PIT: u32 = 1 << 23;
    pub const SCGC6_ADC0: u32 = 1 << 27;

    /// Turn the COP watchdog off. COPC is write-once after reset.
    pub fn disable_watchdog() {
        COPC.write(0);
    }
}

pub mod pmc {
    use core::ptr::write_volatile;

    const REGSC: usize = 0x4007_D002;
    const REGSC_BGBE: u8 = 1 << 0;

    /// Buffer the 1 V bandgap onto its ADC channel
    pub fn bandgap_buffer(enable: bool) {
        let value = if enable { REGSC_BGBE } else { 0 };
        unsafe { write_volatile(REGSC as *mut u8, value) };
    }
}

/// Interrupt lines used by the firmware
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum Irq {
    Adc0 = 15,
    Pit = 22,
    Tsi0 = 26,
    Lptmr0 = 28,
    PortD = 31,
}

unsafe impl cortex_m::interrupt::InterruptNumber for Irq {
    fn number(self) -> u16 {
        self as u16
    }
}

impl Irq {
    pub fn from_number(irqn: i16) -> Option<Self> {
        match irqn {
            15 => Some(Irq::Adc0),
            22 => Some(Irq::Pit),
            26 => Some(Irq::Tsi0),
            28 => Some(Irq::Lptmr0),
            31 => Some(Irq::PortD),
            _ => None,
        }
    }

    pub fn unmask(self) {
        unsafe { cortex_m::peripheral::NVIC::unmask(self) };
    }

    pub fn mask(self) {
        cortex_m::peripheral::NVIC::mask(self);
    }
}
