//! GPIO pins on ports B and D.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};

use crate::reg::{sim, Reg};

const PCR_MUX_GPIO: u32 = 1 << 8;
const PCR_PE: u32 = 1 << 1;
const PCR_PS: u32 = 1 << 0;
const PCR_IRQC_FALLING: u32 = 0b1010 << 16;

// GPIO register offsets
const PDOR: usize = 0x00;
const PSOR: usize = 0x04;
const PCOR: usize = 0x08;
const PTOR: usize = 0x0C;
const PDDR: usize = 0x14;

const ISFR: usize = 0xA0;

pub struct Port {
    pcr: Reg,
    gpio: Reg,
    clock_gate: u32,
}

pub const PORTB: Port = Port {
    pcr: unsafe { Reg::at(0x4004_A000) },
    gpio: unsafe { Reg::at(0x400F_F040) },
    clock_gate: sim::SCGC5_PORTB,
};

pub const PORTD: Port = Port {
    pcr: unsafe { Reg::at(0x4004_C000) },
    gpio: unsafe { Reg::at(0x400F_F0C0) },
    clock_gate: sim::SCGC5_PORTD,
};

impl Port {
    pub fn enable_clock(&self) {
        sim::SCGC5.set_bits(self.clock_gate);
    }

    fn pcr(&self, pin: u8) -> Reg {
        self.pcr.offset(pin as usize * 4)
    }

    /// Mux `pin` to GPIO as an output driving `high`
    pub fn output(&self, pin: u8, high: bool) -> Pin {
        self.pcr(pin).write(PCR_MUX_GPIO);
        let out = Pin {
            gpio: self.gpio,
            mask: 1 << pin,
        };
        if high {
            out.gpio.offset(PSOR).write(out.mask);
        } else {
            out.gpio.offset(PCOR).write(out.mask);
        }
        self.gpio.offset(PDDR).set_bits(out.mask);
        out
    }

    /// Mux `pin` to GPIO as a pulled-up input interrupting on falling edges
    pub fn button(&self, pin: u8) {
        self.gpio.offset(PDDR).clear_bits(1 << pin);
        self.pcr(pin)
            .write(PCR_MUX_GPIO | PCR_PE | PCR_PS | PCR_IRQC_FALLING);
    }

    /// Route `pin` to its analog function
    pub fn analog(&self, pin: u8) {
        self.pcr(pin).write(0);
    }

    /// Clear and return the pending pin interrupt flags
    pub fn take_interrupt_flags(&self) -> u32 {
        let isfr = self.pcr.offset(ISFR);
        let flags = isfr.read();
        isfr.write(flags);
        flags
    }
}

/// Push-pull output pin
pub struct Pin {
    gpio: Reg,
    mask: u32,
}

impl ErrorType for Pin {
    type Error = Infallible;
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.gpio.offset(PCOR).write(self.mask);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.gpio.offset(PSOR).write(self.mask);
        Ok(())
    }
}

impl StatefulOutputPin for Pin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.gpio.offset(PDOR).read() & self.mask != 0)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.gpio.offset(PDOR).read() & self.mask == 0)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.gpio.offset(PTOR).write(self.mask);
        Ok(())
    }
}
