//! The main loop.
//!
//! One [`Task`] owns the LEDs and the board collaborators and reacts to two
//! inputs filled from interrupt context: the [`EventFlags`] raised by the tick
//! [`Cadence`] and a [`MsgQueue`] of [`Message`] codes. Each iteration drains
//! the queue, then services the touch, temperature and blink events in that
//! order. Failures are never fatal: a bad sample leaves the outputs as they
//! were until the next tick.

mod event;
mod message;

use embedded_hal::digital::StatefulOutputPin;
use heapless::Vec;
use log::{debug, info, trace, warn};

pub use event::{Cadence, EventFlags, Events};
pub use message::Message;

use crate::board::{Board, Leds};
use crate::sync::MsgQueue;
use crate::time::Clock;
use crate::tsi::{Tsi, TsiHal, MAX_CHANNELS};
use crate::{Error, TaskConfig, DEFAULT_TASK_CONFIG};

/// Touch decision: the sweep average must exceed the baseline by more than
/// `margin` counts
pub fn is_touched(average: u16, baseline: u16, margin: u16) -> bool {
    average as u32 > baseline as u32 + margin as u32
}

pub struct Task<'a, H, C, P, B, const N: usize> {
    tsi: &'a Tsi<H, C>,
    events: &'a EventFlags,
    queue: &'a MsgQueue<N>,
    leds: Leds<P>,
    board: B,
    config: &'a TaskConfig,
    channels: Vec<u8, MAX_CHANNELS>,
    baseline: u16,
    alarm: bool,
    touched: bool,
}

impl<'a, H, C, P, B, const N: usize> Task<'a, H, C, P, B, N>
where
    H: TsiHal,
    C: Clock,
    P: StatefulOutputPin,
    B: Board,
{
    pub fn new(
        tsi: &'a Tsi<H, C>,
        events: &'a EventFlags,
        queue: &'a MsgQueue<N>,
        leds: Leds<P>,
        board: B,
        config: Option<&'a TaskConfig>,
    ) -> Self {
        Self {
            tsi,
            events,
            queue,
            leds,
            board,
            config: config.unwrap_or(&DEFAULT_TASK_CONFIG),
            channels: Vec::new(),
            baseline: 0,
            alarm: false,
            touched: false,
        }
    }

    /// Enable `channels` and capture their untouched baseline. The
    /// electrodes must not be touched while this runs.
    pub fn init(&mut self, channels: &[u8]) -> Result<u16, Error> {
        for &channel in channels {
            if self.channels.contains(&channel) {
                continue;
            }
            self.channels
                .push(channel)
                .map_err(|_| Error::InvalidArgument)?;
            self.tsi.enable_electrode(channel, true)?;
        }

        let samples = self.config.baseline_samples;
        self.baseline = self
            .tsi
            .untouched_baseline_with(&self.channels, samples, || self.board.wait_for_interrupt())?;
        info!("task: baseline {} over {} electrodes", self.baseline, self.channels.len());
        Ok(self.baseline)
    }

    pub fn baseline(&self) -> u16 {
        self.baseline
    }

    pub fn is_alarm(&self) -> bool {
        self.alarm
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn board(&mut self) -> &mut B {
        &mut self.board
    }

    /// One pass of the main loop
    pub fn run_once(&mut self) {
        while let Ok(code) = self.queue.dequeue() {
            match Message::decode(code) {
                Some(message) => self.handle_message(message),
                None => warn!("task: unknown message code {}", code),
            }
        }

        if self.events.take(Events::SENSE_TOUCH) {
            self.sense_touch();
        }
        if self.events.take(Events::READ_TEMP) {
            self.read_temperature();
        }
        if self.events.take(Events::BLINK_LED) {
            self.blink();
        }
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.run_once();
        }
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::KeyPressed => {
                debug!("task: key pressed");
                self.leds.set_all(true);
                self.board.delay_ms(self.config.flash_ms);
                self.leds.set_all(false);
                self.leds.touch.set(self.touched);
                self.leds.alarm.set(self.alarm);
            }
        }
    }

    fn sense_touch(&mut self) {
        if let Err(e) = self
            .tsi
            .measure_blocking_with(|| self.board.wait_for_interrupt())
        {
            trace!("task: touch sample dropped: {:?}", e);
            return;
        }

        let Some(average) = self.average() else {
            return;
        };

        let touched = is_touched(average, self.baseline, self.config.touch_margin);
        if touched != self.touched {
            debug!("task: touched={} average={}", touched, average);
        }
        self.touched = touched;
        self.leds.touch.set(touched);
    }

    /// Mean count of the enabled channels from the last sweep
    fn average(&self) -> Option<u16> {
        if self.channels.is_empty() {
            return None;
        }
        let mut sum = 0u32;
        for &channel in &self.channels {
            sum += self.tsi.get_counter(channel).ok()? as u32;
        }
        Some((sum / self.channels.len() as u32) as u16)
    }

    fn read_temperature(&mut self) {
        let temperature = self.board.read_temperature();
        let alarm = !(self.config.temp_low..=self.config.temp_high).contains(&temperature);

        if alarm != self.alarm {
            if alarm {
                warn!("task: temperature {} C out of range", temperature);
            } else {
                info!("task: temperature {} C back in range", temperature);
            }
        }
        self.alarm = alarm;
    }

    fn blink(&mut self) {
        if self.alarm {
            self.leds.alarm.on();
            self.leds.heartbeat.off();
        } else {
            self.leds.alarm.off();
            self.leds.heartbeat.toggle();
        }
    }
}
