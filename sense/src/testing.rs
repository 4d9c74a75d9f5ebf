//! Host-side stand-ins for the hardware seams, used by the unit tests.

use std::cell::{Cell, Ref, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};

use crate::board::Board;
use crate::time::Clock;
use crate::tsi::{Settings, Tsi, TsiHal, MAX_CHANNELS};

/// Clock that advances by `step` every time it is read
pub struct StepClock {
    now: Cell<u32>,
    step: u32,
}

impl StepClock {
    pub fn new(start: u32, step: u32) -> Self {
        Self {
            now: Cell::new(start),
            step,
        }
    }

    /// Current value, without advancing
    pub fn peek(&self) -> u32 {
        self.now.get()
    }

    pub fn set(&self, now: u32) {
        self.now.set(now);
    }
}

impl Clock for StepClock {
    fn now(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step));
        now
    }
}

#[derive(Debug, Default)]
pub struct SimState {
    pub clock_enabled: bool,
    pub interrupt_enabled: bool,
    pub end_of_scan_interrupt: bool,
    pub software_trigger: bool,
    pub module_enabled: bool,
    pub stop_enabled: bool,
    pub irq_unmasked: bool,
    /// Every settings block written, oldest first
    pub configured: Vec<Settings>,
    pub channel: u8,
    pub measured: u8,
    pub counts: [u16; MAX_CHANNELS],
    /// An end-of-scan event is waiting to be serviced
    pub pending: bool,
    /// Channel of every trigger issued, oldest first
    pub triggers: Vec<u8>,
    pub flags_cleared: u32,
}

/// Simulated TSI peripheral. Each software trigger completes instantly and
/// leaves an end-of-scan event pending until the flags are cleared.
#[derive(Clone, Default)]
pub struct SimTsi(Rc<RefCell<SimState>>);

impl SimTsi {
    pub fn state(&self) -> Ref<'_, SimState> {
        self.0.borrow()
    }

    pub fn set_count(&self, channel: u8, count: u16) {
        self.0.borrow_mut().counts[channel as usize] = count;
    }

    pub fn pending(&self) -> bool {
        self.0.borrow().pending
    }
}

impl TsiHal for SimTsi {
    fn enable_clock(&mut self) {
        self.0.borrow_mut().clock_enabled = true;
    }

    fn disable_clock(&mut self) {
        self.0.borrow_mut().clock_enabled = false;
    }

    fn reset(&mut self) {
        let mut s = self.0.borrow_mut();
        s.interrupt_enabled = false;
        s.end_of_scan_interrupt = false;
        s.software_trigger = false;
        s.module_enabled = false;
        s.stop_enabled = false;
        s.channel = 0;
        s.pending = false;
    }

    fn configure(&mut self, settings: &Settings) {
        self.0.borrow_mut().configured.push(*settings);
    }

    fn enable_interrupt(&mut self) {
        self.0.borrow_mut().interrupt_enabled = true;
    }

    fn disable_interrupt(&mut self) {
        self.0.borrow_mut().interrupt_enabled = false;
    }

    fn enable_end_of_scan_interrupt(&mut self) {
        self.0.borrow_mut().end_of_scan_interrupt = true;
    }

    fn enable_software_trigger(&mut self) {
        self.0.borrow_mut().software_trigger = true;
    }

    fn enable_module(&mut self) {
        self.0.borrow_mut().module_enabled = true;
    }

    fn disable_module(&mut self) {
        self.0.borrow_mut().module_enabled = false;
    }

    fn enable_stop(&mut self) {
        self.0.borrow_mut().stop_enabled = true;
    }

    fn disable_stop(&mut self) {
        self.0.borrow_mut().stop_enabled = false;
    }

    fn set_channel(&mut self, channel: u8) {
        self.0.borrow_mut().channel = channel;
    }

    fn measured_channel(&self) -> u8 {
        self.0.borrow().measured
    }

    fn start_software_trigger(&mut self) {
        let mut s = self.0.borrow_mut();
        if s.module_enabled && s.software_trigger {
            s.measured = s.channel;
            s.pending = true;
            let channel = s.channel;
            s.triggers.push(channel);
        }
    }

    fn counter(&self) -> u16 {
        let s = self.0.borrow();
        s.counts[s.measured as usize]
    }

    fn clear_flags(&mut self) {
        let mut s = self.0.borrow_mut();
        s.pending = false;
        s.flags_cleared += 1;
    }

    fn unmask_irq(&mut self) {
        self.0.borrow_mut().irq_unmasked = true;
    }

    fn mask_irq(&mut self) {
        self.0.borrow_mut().irq_unmasked = false;
    }
}

/// Service end-of-scan events until the simulated sweep has finished
pub fn pump<C: Clock>(tsi: &Tsi<SimTsi, C>, sim: &SimTsi) {
    while sim.pending() {
        tsi.on_interrupt();
    }
}

/// Output pin whose level can be observed through a shared handle
#[derive(Clone, Default)]
pub struct SimPin(Rc<Cell<bool>>);

impl SimPin {
    pub fn is_high(&self) -> bool {
        self.0.get()
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set(true);
        Ok(())
    }
}

impl StatefulOutputPin for SimPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

/// Board with a scripted thermometer. Waiting for an interrupt services the
/// simulated TSI.
pub struct SimBoard<'a> {
    pub tsi: &'a Tsi<SimTsi, StepClock>,
    pub sim: SimTsi,
    /// Readings returned in order; the last one repeats
    pub temperatures: VecDeque<i32>,
    pub last_temperature: i32,
    pub delayed_ns: u64,
}

impl<'a> SimBoard<'a> {
    pub fn new(tsi: &'a Tsi<SimTsi, StepClock>, sim: SimTsi) -> Self {
        Self {
            tsi,
            sim,
            temperatures: VecDeque::new(),
            last_temperature: 25,
            delayed_ns: 0,
        }
    }
}

impl DelayNs for SimBoard<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.delayed_ns += ns as u64;
    }
}

impl Board for SimBoard<'_> {
    fn read_temperature(&mut self) -> i32 {
        if let Some(t) = self.temperatures.pop_front() {
            self.last_temperature = t;
        }
        self.last_temperature
    }

    fn wait_for_interrupt(&mut self) {
        pump(self.tsi, &self.sim);
    }
}
