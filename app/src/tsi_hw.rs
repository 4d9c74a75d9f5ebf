//! `TsiHal` for the TSI0 peripheral.

use sense::tsi::{Settings, TsiHal};

use crate::reg::{sim, Irq, Reg};

const GENCS: Reg = unsafe { Reg::at(0x4004_5000) };
const DATA: Reg = unsafe { Reg::at(0x4004_5004) };
const TSHD: Reg = unsafe { Reg::at(0x4004_5008) };

// GENCS
const OUTRGF: u32 = 1 << 31;
const ESOR: u32 = 1 << 28;
const MODE_SHIFT: u32 = 24;
const REFCHRG_SHIFT: u32 = 21;
const DVOLT_SHIFT: u32 = 19;
const EXTCHRG_SHIFT: u32 = 16;
const PS_SHIFT: u32 = 13;
const NSCN_SHIFT: u32 = 8;
const TSIEN: u32 = 1 << 7;
const TSIIEN: u32 = 1 << 6;
const STPE: u32 = 1 << 5;
const STM: u32 = 1 << 4;
const EOSF: u32 = 1 << 2;
/// Write-one-to-clear flags; kept out of read-modify-write cycles
const W1C: u32 = OUTRGF | EOSF;

// DATA
const TSICH_SHIFT: u32 = 28;
const SWTS: u32 = 1 << 22;
const TSICNT_MASK: u32 = 0xFFFF;

/// Handle to TSI0. Only one should exist.
pub struct KlTsi {
    _private: (),
}

impl KlTsi {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn gencs_set(&mut self, bits: u32) {
        GENCS.modify(|v| (v & !W1C) | bits);
    }

    fn gencs_clear(&mut self, bits: u32) {
        GENCS.modify(|v| v & !W1C & !bits);
    }
}

impl TsiHal for KlTsi {
    fn enable_clock(&mut self) {
        sim::SCGC5.set_bits(sim::SCGC5_TSI);
    }

    fn disable_clock(&mut self) {
        sim::SCGC5.clear_bits(sim::SCGC5_TSI);
    }

    fn reset(&mut self) {
        GENCS.write(W1C);
        DATA.write(0);
        TSHD.write(0);
    }

    fn configure(&mut self, settings: &Settings) {
        let keep = GENCS.read() & (TSIEN | TSIIEN | STPE | STM | ESOR);
        GENCS.write(
            keep | (settings.mode as u32) << MODE_SHIFT
                | (settings.reference_charge as u32) << REFCHRG_SHIFT
                | (settings.rails as u32) << DVOLT_SHIFT
                | (settings.external_charge as u32) << EXTCHRG_SHIFT
                | (settings.prescale as u32) << PS_SHIFT
                | (settings.scan_count as u32) << NSCN_SHIFT,
        );
        TSHD.write((settings.threshold_high as u32) << 16 | settings.threshold_low as u32);
    }

    fn enable_interrupt(&mut self) {
        self.gencs_set(TSIIEN);
    }

    fn disable_interrupt(&mut self) {
        self.gencs_clear(TSIIEN);
    }

    fn enable_end_of_scan_interrupt(&mut self) {
        self.gencs_set(ESOR);
    }

    fn enable_software_trigger(&mut self) {
        self.gencs_clear(STM);
    }

    fn enable_module(&mut self) {
        self.gencs_set(TSIEN);
    }

    fn disable_module(&mut self) {
        self.gencs_clear(TSIEN);
    }

    fn enable_stop(&mut self) {
        self.gencs_set(STPE);
    }

    fn disable_stop(&mut self) {
        self.gencs_clear(STPE);
    }

    fn set_channel(&mut self, channel: u8) {
        DATA.write_field(TSICH_SHIFT, 0xF, channel as u32);
    }

    fn measured_channel(&self) -> u8 {
        (DATA.read() >> TSICH_SHIFT) as u8 & 0xF
    }

    fn start_software_trigger(&mut self) {
        DATA.set_bits(SWTS);
    }

    fn counter(&self) -> u16 {
        (DATA.read() & TSICNT_MASK) as u16
    }

    fn clear_flags(&mut self) {
        GENCS.modify(|v| v | W1C);
    }

    fn unmask_irq(&mut self) {
        Irq::Tsi0.unmask();
    }

    fn mask_irq(&mut self) {
        Irq::Tsi0.mask();
    }
}
