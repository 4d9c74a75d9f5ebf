//! On-chip temperature through ADC0.
//!
//! VDD is derived once from a conversion of the 1 V bandgap; every reading
//! then converts the sensor voltage with the typical datasheet slope. The
//! converter is used uncalibrated.

use embedded_hal::delay::DelayNs;
use log::debug;
use sense::board::Board;
use sense::time::{Clock, ClockDelay};

use crate::reg::{pmc, sim, Reg};

const SC1A: Reg = unsafe { Reg::at(0x4003_B000) };
const CFG1: Reg = unsafe { Reg::at(0x4003_B008) };
const CFG2: Reg = unsafe { Reg::at(0x4003_B00C) };
const RA: Reg = unsafe { Reg::at(0x4003_B010) };
const SC2: Reg = unsafe { Reg::at(0x4003_B020) };
const SC3: Reg = unsafe { Reg::at(0x4003_B024) };

const SC1_COCO: u32 = 1 << 7;
const SC1_ADCH_DISABLED: u32 = 0x1F;
/// Bus clock / 4, long sample time, 16-bit single ended
const CFG1_16BIT: u32 = (0b10 << 5) | (1 << 4) | (0b11 << 2);
/// Hardware average of 32 conversions
const SC3_AVG32: u32 = (1 << 2) | 0b11;

const CH_TEMP_SENSOR: u32 = 26;
const CH_BANDGAP: u32 = 27;

/// Full scale 16-bit result
const ADCR_VDD: i32 = 65535;
/// Bandgap voltage, mV
const V_BG: i32 = 1000;
/// Sensor voltage at 25 °C, mV
const V_TEMP25: i32 = 716;
/// Sensor slope, µV/°C
const M: i32 = 1620;
const STANDARD_TEMP: i32 = 25;

pub struct Thermometer {
    adcr_temp25: i32,
    adcr_100m: i32,
}

impl Thermometer {
    pub fn new() -> Self {
        sim::SCGC6.set_bits(sim::SCGC6_ADC0);
        CFG1.write(CFG1_16BIT);
        CFG2.write(0);
        SC2.write(0);
        SC3.write(SC3_AVG32);

        pmc::bandgap_buffer(true);
        let bandgap = convert(CH_BANDGAP).max(1);
        pmc::bandgap_buffer(false);

        let vdd = ADCR_VDD * V_BG / bandgap;
        let therm = Self {
            adcr_temp25: ADCR_VDD * V_TEMP25 / vdd,
            adcr_100m: ADCR_VDD * 100 / vdd,
        };
        debug!("adc: vdd {} mV", vdd);
        therm
    }

    /// Temperature in whole °C
    pub fn read(&mut self) -> i32 {
        let raw = convert(CH_TEMP_SENSOR);
        STANDARD_TEMP - (raw - self.adcr_temp25) * 100_000 / (self.adcr_100m * M)
    }
}

fn convert(channel: u32) -> i32 {
    SC1A.write(channel);
    while SC1A.read() & SC1_COCO == 0 {}
    let value = RA.read() as i32;
    SC1A.write(SC1_ADCH_DISABLED);
    value
}

/// Board services for the main loop: temperature and a delay on the time base
pub struct KlBoard<C> {
    thermometer: Thermometer,
    delay: ClockDelay<C>,
}

impl<C: Clock> KlBoard<C> {
    pub fn new(thermometer: Thermometer, clock: C) -> Self {
        Self {
            thermometer,
            delay: ClockDelay::new(clock),
        }
    }
}

impl<C: Clock> DelayNs for KlBoard<C> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }
}

impl<C: Clock> Board for KlBoard<C> {
    fn read_temperature(&mut self) -> i32 {
        self.thermometer.read()
    }
}
