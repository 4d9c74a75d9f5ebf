//! Analog front-end settings for the Kinetis TSI peripheral.
//!
//! Every enum discriminant is the raw value of the matching register field,
//! so an adapter can program it with a plain `as u32` and a shift.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Divider applied to the electrode oscillator before counting
pub enum ElectrodePrescaler {
    Div1 = 0b000,
    Div2 = 0b001,
    Div4 = 0b010,
    Div8 = 0b011,
    Div16 = 0b100,
    Div32 = 0b101,
    Div64 = 0b110,
    Div128 = 0b111,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Oscillator charge/discharge current, used for both the reference and the
/// electrode oscillators
pub enum ChargeCurrent {
    NanoAmp500 = 0b000,
    MicroAmp1 = 0b001,
    MicroAmp2 = 0b010,
    MicroAmp4 = 0b011,
    MicroAmp8 = 0b100,
    MicroAmp16 = 0b101,
    MicroAmp32 = 0b110,
    MicroAmp64 = 0b111,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Number of electrode oscillator scans accumulated into one count
pub enum ScanCount {
    S1 = 0,
    S2 = 1,
    S3 = 2,
    S4 = 3,
    S5 = 4,
    S6 = 5,
    S7 = 6,
    S8 = 7,
    S9 = 8,
    S10 = 9,
    S11 = 10,
    S12 = 11,
    S13 = 12,
    S14 = 13,
    S15 = 14,
    S16 = 15,
    S17 = 16,
    S18 = 17,
    S19 = 18,
    S20 = 19,
    S21 = 20,
    S22 = 21,
    S23 = 22,
    S24 = 23,
    S25 = 24,
    S26 = 25,
    S27 = 26,
    S28 = 27,
    S29 = 28,
    S30 = 29,
    S31 = 30,
    S32 = 31,
}

impl ScanCount {
    pub fn scans(&self) -> u8 {
        *self as u8 + 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnalogMode {
    Capacitive = 0,
    /// Single threshold noise detection, frequency limitation disabled
    NoiseNoFreqLimit = 4,
    /// Single threshold noise detection, frequency limitation enabled
    NoiseFreqLimit = 8,
    AutoNoise = 12,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Oscillator voltage rails, named by the delta voltage
pub enum VoltageRails {
    /// DV = 1.03 V, VP = 1.33 V, Vm = 0.30 V
    Dv103 = 0,
    /// DV = 0.73 V, VP = 1.18 V, Vm = 0.45 V
    Dv073 = 1,
    /// DV = 0.43 V, VP = 1.03 V, Vm = 0.60 V
    Dv043 = 2,
    /// DV = 0.29 V, VP = 0.95 V, Vm = 0.67 V
    Dv029 = 3,
}

/// Default value for the electrode prescaler if not provided
const DEFAULT_PRESCALE: ElectrodePrescaler = ElectrodePrescaler::Div2;
/// Default electrode oscillator charge current if not provided
const DEFAULT_EXT_CHARGE: ChargeCurrent = ChargeCurrent::MicroAmp8;
/// Default reference oscillator charge current if not provided
const DEFAULT_REF_CHARGE: ChargeCurrent = ChargeCurrent::MicroAmp8;
/// Default scans per electrode if not provided
const DEFAULT_SCAN_COUNT: ScanCount = ScanCount::S8;
const DEFAULT_MODE: AnalogMode = AnalogMode::Capacitive;
const DEFAULT_RAILS: VoltageRails = VoltageRails::Dv103;
/// Wake-up window used in low-power mode
const DEFAULT_THRESHOLD_HIGH: u16 = 200;
const DEFAULT_THRESHOLD_LOW: u16 = 100;

/// User facing configuration. Unset fields take the driver defaults.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    pub prescale: Option<ElectrodePrescaler>,
    pub external_charge: Option<ChargeCurrent>,
    pub reference_charge: Option<ChargeCurrent>,
    pub scan_count: Option<ScanCount>,
    pub mode: Option<AnalogMode>,
    pub rails: Option<VoltageRails>,
    pub threshold_high: Option<u16>,
    pub threshold_low: Option<u16>,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            prescale: None,
            external_charge: None,
            reference_charge: None,
            scan_count: None,
            mode: None,
            rails: None,
            threshold_high: None,
            threshold_low: None,
        }
    }

    /// Resolve every field to the value that will be written to hardware
    pub fn settings(&self) -> Settings {
        Settings {
            prescale: self.prescale.unwrap_or(DEFAULT_PRESCALE),
            external_charge: self.external_charge.unwrap_or(DEFAULT_EXT_CHARGE),
            reference_charge: self.reference_charge.unwrap_or(DEFAULT_REF_CHARGE),
            scan_count: self.scan_count.unwrap_or(DEFAULT_SCAN_COUNT),
            mode: self.mode.unwrap_or(DEFAULT_MODE),
            rails: self.rails.unwrap_or(DEFAULT_RAILS),
            threshold_high: self.threshold_high.unwrap_or(DEFAULT_THRESHOLD_HIGH),
            threshold_low: self.threshold_low.unwrap_or(DEFAULT_THRESHOLD_LOW),
        }
    }
}

/// Fully resolved hardware configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub prescale: ElectrodePrescaler,
    pub external_charge: ChargeCurrent,
    pub reference_charge: ChargeCurrent,
    pub scan_count: ScanCount,
    pub mode: AnalogMode,
    pub rails: VoltageRails,
    pub threshold_high: u16,
    pub threshold_low: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Config::new().settings()
    }
}
