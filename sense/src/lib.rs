#![cfg_attr(not(test), no_std)]

//! Capacitive touch sensing and an event driven main loop for Kinetis KL2x
//! parts.
//!
//! Everything here is hardware independent. The TSI peripheral is reached
//! through [`tsi::TsiHal`], time through [`time::Clock`] and the rest of the
//! board through [`board::Board`] and `embedded-hal` pins, so the whole crate
//! runs on the host under test.

pub mod board;
mod error;
pub mod sync;
pub mod task;
pub mod time;
pub mod tsi;

#[cfg(test)]
mod testing;

pub use error::Error;

/// Tuning for the main loop
#[derive(Clone, Copy, Debug)]
pub struct TaskConfig {
    /// Counts above the untouched baseline the sweep average must exceed to
    /// register a touch
    pub touch_margin: u16,
    /// Lowest temperature, in °C, that does not raise the alarm
    pub temp_low: i32,
    /// Highest temperature, in °C, that does not raise the alarm
    pub temp_high: i32,
    /// Blocking sweeps averaged into the untouched baseline
    pub baseline_samples: u16,
    /// How long all LEDs light up on a key press
    pub flash_ms: u32,
    /// Ticks between temperature reads
    pub temp_period: u16,
    /// Ticks between LED blinks
    pub blink_period: u16,
}

impl TaskConfig {
    const fn default() -> Self {
        Self {
            touch_margin: 10,
            temp_low: 20,
            temp_high: 27,
            baseline_samples: tsi::BASELINE_SAMPLES,
            flash_ms: 100,
            temp_period: 500,
            blink_period: 1000,
        }
    }
}

pub const DEFAULT_TASK_CONFIG: TaskConfig = TaskConfig::default();
