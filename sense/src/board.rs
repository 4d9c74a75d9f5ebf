//! Collaborators the scheduler drives but does not own the details of.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::StatefulOutputPin;

/// Board services used by the main loop
pub trait Board: DelayNs {
    /// On-chip temperature in whole degrees Celsius
    fn read_temperature(&mut self) -> i32;

    /// Called while spinning on a blocking measurement
    fn wait_for_interrupt(&mut self) {}
}

/// An LED on a GPIO, with its polarity.
///
/// Pin errors are ignored; LED updates are best effort.
pub struct Led<P> {
    pin: P,
    active_low: bool,
}

impl<P: StatefulOutputPin> Led<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        let mut led = Self { pin, active_low };
        led.off();
        led
    }

    pub fn set(&mut self, on: bool) {
        let _ = if on != self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
    }

    pub fn on(&mut self) {
        self.set(true);
    }

    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn toggle(&mut self) {
        let _ = self.pin.toggle();
    }

    pub fn is_on(&mut self) -> bool {
        self.pin
            .is_set_high()
            .map(|high| high != self.active_low)
            .unwrap_or(false)
    }
}

/// The three status LEDs
pub struct Leds<P> {
    /// Blinks while the temperature is in range
    pub heartbeat: Led<P>,
    /// Lit while the temperature is out of range
    pub alarm: Led<P>,
    /// Lit while an electrode is touched
    pub touch: Led<P>,
}

impl<P: StatefulOutputPin> Leds<P> {
    pub fn set_all(&mut self, on: bool) {
        self.heartbeat.set(on);
        self.alarm.set(on);
        self.touch.set(on);
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::testing::SimPin;

    #[test]
    fn polarity() {
        let pin = SimPin::default();
        let mut led = Led::new(pin.clone(), true);
        assert!(pin.is_high());
        assert!(!led.is_on());

        led.on();
        assert!(!pin.is_high());
        assert!(led.is_on());

        led.toggle();
        assert!(!led.is_on());

        let pin = SimPin::default();
        let mut led = Led::new(pin.clone(), false);
        led.on();
        assert!(pin.is_high());
    }
}
