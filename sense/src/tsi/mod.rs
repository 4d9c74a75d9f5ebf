//! Interrupt driven driver for the Kinetis Touch Sensing Input (TSI).
//!
//! The peripheral measures one electrode per trigger. A measurement request
//! is therefore a *sweep*: the driver programs the lowest enabled channel and
//! triggers it, and every end-of-scan interrupt stores the finished count,
//! programs the next enabled channel and triggers again. Channels are always
//! visited in ascending order and each is stamped once per sweep. The sweep
//! runs entirely in interrupt context; the main loop is only involved at the
//! start and, for blocking requests, when polling for completion.
//!
//! [`Tsi`] is meant to live in a `static` so that both the main loop and the
//! `TSI0` interrupt handler can reach it:
//!
//! ```ignore
//! static TSI: Tsi<KlTsi, Lptmr> = Tsi::new();
//!
//! TSI.init(KlTsi::new(), Lptmr, &UserConfig::default())?;
//! TSI.enable_electrode(9, true)?;
//! TSI.measure_blocking()?;
//! let count = TSI.get_counter(9)?;
//!
//! fn tsi0_handler() {
//!     TSI.on_interrupt();
//! }
//! ```
//!
//! All driver state sits behind a `critical_section::Mutex`, so every call is
//! a short critical section and a second instance can not be initialized
//! while the first is alive.

mod config;
mod electrode;
mod hal;

use core::cell::RefCell;

use critical_section::Mutex;
use log::{debug, trace, warn};

pub use config::*;
pub use electrode::{Counters, ElectrodeMask, Sweep, MAX_CHANNELS};
pub use hal::TsiHal;

use crate::sync::{CoopMutex, Semaphore};
use crate::time::{Clock, WAIT_FOREVER};
use crate::Error;

/// Deadline for a blocking sweep, in clock ticks
pub const BLOCKING_TIMEOUT: u32 = 1000;

/// Number of sweeps averaged into the untouched baseline
pub const BASELINE_SAMPLES: u16 = 100;

/// Completion hook for non-blocking sweeps. Runs in interrupt context after
/// the driver state has been released.
pub type ScanCallback = fn(&Counters);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    Uninitialized,
    /// Idle and ready to start a sweep
    Initialized,
    /// A sweep is in flight
    Busy,
    Lowpower,
    Recalibration,
    Error,
}

/// Configuration profile slots
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Normal = 0,
    Proximity = 1,
    LowPower = 2,
    /// Only available on the TSIL variant of the peripheral
    Noise = 3,
}

const MODE_COUNT: usize = 4;

/// Electrode selection and hardware settings for one [`Mode`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OperationMode {
    pub enabled: ElectrodeMask,
    pub settings: Settings,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UserConfig {
    pub config: Config,
    pub callback: Option<ScanCallback>,
}

struct TsiState<H, C> {
    hal: H,
    clock: C,
    status: Status,
    mode: Mode,
    op_modes: [OperationMode; MODE_COUNT],
    counters: [u16; MAX_CHANNELS],
    sweep: Option<Sweep>,
    is_blocking_measure: bool,
    aborted: bool,
    lock: CoopMutex,
    lock_change_mode: CoopMutex,
    irq_sync: Semaphore,
    callback: Option<ScanCallback>,
}

impl<H: TsiHal, C: Clock> TsiState<H, C> {
    fn new(hal: H, clock: C, user: &UserConfig) -> Self {
        let mut op_modes = [OperationMode::default(); MODE_COUNT];
        op_modes[Mode::Normal as usize].settings = user.config.settings();

        Self {
            hal,
            clock,
            status: Status::Uninitialized,
            mode: Mode::Normal,
            op_modes,
            counters: [0; MAX_CHANNELS],
            sweep: None,
            is_blocking_measure: false,
            aborted: false,
            lock: CoopMutex::new(),
            lock_change_mode: CoopMutex::new(),
            irq_sync: Semaphore::new(0),
            callback: user.callback,
        }
    }

    /// Run `f` holding the state lock
    fn locked<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R, Error>) -> Result<R, Error> {
        self.lock
            .lock(WAIT_FOREVER, &self.clock)
            .map_err(|_| Error::Busy)?;
        let result = f(self);
        self.lock.unlock();
        result
    }

    fn require_initialized(&self) -> Result<(), Error> {
        match self.status {
            Status::Initialized => Ok(()),
            status => Err(status.into()),
        }
    }

    fn active(&self) -> &OperationMode {
        &self.op_modes[self.mode as usize]
    }

    fn active_mut(&mut self) -> &mut OperationMode {
        &mut self.op_modes[self.mode as usize]
    }

    fn start_sweep(&mut self, blocking: bool) -> Result<(), Error> {
        let first = self.locked(|s| {
            s.require_initialized()?;
            let sweep = Sweep::start(s.active().enabled).ok_or(Error::InvalidChannel)?;
            s.status = Status::Busy;
            s.sweep = Some(sweep);
            s.is_blocking_measure = blocking;
            s.aborted = false;
            if blocking {
                s.irq_sync.reset();
            }
            Ok(sweep.current())
        })?;

        self.hal.disable_module();
        self.hal.set_channel(first);
        self.hal.enable_software_trigger();
        self.hal.enable_module();
        self.hal.start_software_trigger();
        trace!("tsi: sweep started at channel {}", first);
        Ok(())
    }

    fn abort(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Recalibration => Err(Error::Recalibration),
            Status::Initialized => Ok(()),
            _ => {
                self.hal.clear_flags();
                self.hal.disable_module();
                if self.is_blocking_measure {
                    self.aborted = true;
                    self.is_blocking_measure = false;
                    if self.irq_sync.post().is_err() {
                        warn!("tsi: completion semaphore overflow on abort");
                    }
                }
                self.sweep = None;
                self.status = Status::Initialized;
                debug!("tsi: sweep aborted");
                Ok(())
            }
        }
    }

    /// Handle one end-of-scan event. Returns the callback to run, with its
    /// data, when a non-blocking sweep has just finished.
    fn end_of_scan(&mut self) -> Option<(ScanCallback, Counters)> {
        let channel = self.hal.measured_channel();
        self.hal.clear_flags();

        // Nothing outstanding: an aborted sweep or a low-power wake-up
        let mut sweep = self.sweep?;

        if sweep.mask().contains(channel) {
            self.counters[channel as usize] = self.hal.counter();
        }

        if let Some(next) = sweep.advance(channel) {
            self.sweep = Some(sweep);
            self.hal.set_channel(next);
            self.hal.start_software_trigger();
            return None;
        }

        self.sweep = None;
        let mut completion = None;
        if self.is_blocking_measure {
            self.is_blocking_measure = false;
            if self.irq_sync.post().is_err() {
                warn!("tsi: completion semaphore overflow");
            }
        } else if let Some(callback) = self.callback {
            completion = Some((
                callback,
                Counters {
                    enabled: sweep.mask(),
                    values: self.counters,
                },
            ));
        }

        if !matches!(self.status, Status::Lowpower | Status::Recalibration) {
            self.status = Status::Initialized;
        }
        completion
    }

    fn apply_mode(&mut self, mode: Mode) {
        self.mode = mode;
        let settings = self.active().settings;
        self.hal.configure(&settings);
    }
}

/// Touch-sense driver handle. See the [module documentation](self).
pub struct Tsi<H, C> {
    state: Mutex<RefCell<Option<TsiState<H, C>>>>,
}

impl<H: TsiHal, C: Clock> Tsi<H, C> {
    /// An uninitialized driver, suitable for a `static`
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(None)),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut TsiState<H, C>) -> Result<R, Error>) -> Result<R, Error> {
        critical_section::with(|cs| {
            let mut slot = self.state.borrow_ref_mut(cs);
            let state = slot.as_mut().ok_or(Error::Uninitialized)?;
            f(state)
        })
    }

    /// Bring up the peripheral with `user.config` as the `Normal` profile.
    ///
    /// No electrodes are enabled afterwards. Fails with
    /// [`Error::Initialized`] if the driver is already running.
    pub fn init(&self, hal: H, clock: C, user: &UserConfig) -> Result<(), Error> {
        critical_section::with(|cs| {
            let mut slot = self.state.borrow_ref_mut(cs);
            if slot.is_some() {
                return Err(Error::Initialized);
            }

            let mut state = TsiState::new(hal, clock, user);
            state.locked(|s| {
                s.hal.enable_clock();
                s.hal.reset();
                let settings = s.active().settings;
                s.hal.configure(&settings);
                s.hal.enable_interrupt();
                s.hal.enable_end_of_scan_interrupt();
                s.hal.enable_software_trigger();
                s.active_mut().enabled = ElectrodeMask::empty();
                s.hal.unmask_irq();
                s.status = Status::Initialized;
                Ok(())
            })?;

            *slot = Some(state);
            debug!("tsi: initialized");
            Ok(())
        })
    }

    /// Shut the peripheral down and hand the adapters back.
    ///
    /// Any sweep in flight is dropped without notifying its waiter.
    pub fn deinit(&self) -> Result<(H, C), Error> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs).take().ok_or(Error::Uninitialized)?;
            state.hal.disable_interrupt();
            state.active_mut().enabled = ElectrodeMask::empty();
            state.hal.clear_flags();
            state.hal.disable_module();
            state.hal.mask_irq();
            state.hal.disable_clock();
            debug!("tsi: deinitialized");
            Ok((state.hal, state.clock))
        })
    }

    pub fn is_initialized(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).is_some())
    }

    pub fn status(&self) -> Status {
        critical_section::with(|cs| {
            self.state
                .borrow_ref(cs)
                .as_ref()
                .map_or(Status::Uninitialized, |s| s.status)
        })
    }

    /// Replace the completion hook used by [`measure`](Self::measure)
    pub fn set_callback(&self, callback: Option<ScanCallback>) -> Result<(), Error> {
        self.with_state(|s| {
            s.locked(|s| {
                s.require_initialized()?;
                s.callback = callback;
                Ok(())
            })
        })
    }

    /// Add or remove `channel` from the active profile.
    ///
    /// Panics if `channel` is 16 or higher. Rejected with the current status
    /// while a sweep is in flight.
    pub fn enable_electrode(&self, channel: u8, enable: bool) -> Result<(), Error> {
        assert!((channel as usize) < MAX_CHANNELS);
        self.with_state(|s| {
            s.locked(|s| {
                s.require_initialized()?;
                let enabled = &mut s.active_mut().enabled;
                if enable {
                    enabled.insert(channel);
                } else {
                    enabled.remove(channel);
                }
                Ok(())
            })
        })
    }

    pub fn enabled_electrodes(&self) -> ElectrodeMask {
        self.with_state(|s| Ok(s.active().enabled))
            .unwrap_or_default()
    }

    /// Start a sweep over the enabled electrodes and return immediately.
    ///
    /// Completion is reported through the registered callback.
    pub fn measure(&self) -> Result<(), Error> {
        self.with_state(|s| s.start_sweep(false))
    }

    /// Start a sweep and spin until it completes or [`BLOCKING_TIMEOUT`]
    /// ticks pass.
    pub fn measure_blocking(&self) -> Result<(), Error> {
        self.measure_blocking_with(|| {})
    }

    /// Like [`measure_blocking`](Self::measure_blocking), calling `poll`
    /// between polls of the completion semaphore.
    ///
    /// `poll` runs outside the critical section, so interrupts (or a
    /// simulated interrupt) can make progress there. On timeout the sweep is
    /// aborted and [`Error::Timeout`] returned.
    pub fn measure_blocking_with(&self, mut poll: impl FnMut()) -> Result<(), Error> {
        self.with_state(|s| s.start_sweep(true))?;

        loop {
            let done = self.with_state(|s| match s.irq_sync.wait(BLOCKING_TIMEOUT, &s.clock) {
                Ok(()) if s.aborted => {
                    s.aborted = false;
                    Err(Error::Aborted)
                }
                Ok(()) => Ok(true),
                Err(nb::Error::WouldBlock) => Ok(false),
                Err(nb::Error::Other(_)) => {
                    warn!("tsi: blocking sweep timed out");
                    s.is_blocking_measure = false;
                    // Recalibration can not be aborted; still a timeout for the caller
                    let _ = s.locked(|s| s.abort());
                    s.aborted = false;
                    s.irq_sync.reset();
                    Err(Error::Timeout)
                }
            })?;

            if done {
                return Ok(());
            }
            poll();
        }
    }

    /// Cancel the sweep in flight, releasing a blocked waiter.
    ///
    /// Reports [`Error::Recalibration`] without touching hardware while a
    /// recalibration is running.
    pub fn abort_measure(&self) -> Result<(), Error> {
        self.with_state(|s| s.locked(|s| s.abort()))
    }

    /// Count captured for `channel` by the last sweep.
    ///
    /// Panics if `channel` is 16 or higher. A channel that is not enabled
    /// never reports data, even if an older value is still stored.
    pub fn get_counter(&self, channel: u8) -> Result<u16, Error> {
        assert!((channel as usize) < MAX_CHANNELS);
        self.with_state(|s| {
            if s.active().enabled.contains(channel) {
                Ok(s.counters[channel as usize])
            } else {
                Err(Error::InvalidChannel)
            }
        })
    }

    /// End-of-scan interrupt entry point
    pub fn on_interrupt(&self) {
        let completion = critical_section::with(|cs| {
            self.state
                .borrow_ref_mut(cs)
                .as_mut()
                .and_then(|s| s.end_of_scan())
        });

        if let Some((callback, counters)) = completion {
            callback(&counters);
        }
    }

    /// Average untouched count over `channels`, from [`BASELINE_SAMPLES`]
    /// blocking sweeps
    pub fn untouched_baseline(&self, channels: &[u8]) -> Result<u16, Error> {
        self.untouched_baseline_with(channels, BASELINE_SAMPLES, || {})
    }

    /// Average count over `samples` blocking sweeps and all of `channels`.
    ///
    /// Every listed channel must be enabled.
    pub fn untouched_baseline_with(
        &self,
        channels: &[u8],
        samples: u16,
        mut poll: impl FnMut(),
    ) -> Result<u16, Error> {
        if channels.is_empty() || samples == 0 {
            return Err(Error::InvalidArgument);
        }

        let mut sum: u64 = 0;
        for _ in 0..samples {
            self.measure_blocking_with(&mut poll)?;
            for &channel in channels {
                sum += self.get_counter(channel)? as u64;
            }
        }

        let baseline = (sum / (samples as u64 * channels.len() as u64)) as u16;
        debug!("tsi: untouched baseline {}", baseline);
        Ok(baseline)
    }

    pub fn mode(&self) -> Result<Mode, Error> {
        self.with_state(|s| Ok(s.mode))
    }

    /// Switch to another profile and program its hardware settings
    pub fn change_mode(&self, mode: Mode) -> Result<(), Error> {
        if mode == Mode::Noise {
            return Err(Error::InvalidMode);
        }

        self.with_state(|s| {
            s.lock_change_mode
                .lock(WAIT_FOREVER, &s.clock)
                .map_err(|_| Error::Busy)?;
            let result = s.locked(|s| {
                s.require_initialized()?;
                if s.mode != mode {
                    s.apply_mode(mode);
                    debug!("tsi: mode {:?}", mode);
                }
                Ok(())
            });
            s.lock_change_mode.unlock();
            result
        })
    }

    /// Replace the stored profile for `mode`. Reprograms the hardware if
    /// `mode` is the active one.
    pub fn load_configuration(&self, mode: Mode, operation: &OperationMode) -> Result<(), Error> {
        if mode == Mode::Noise {
            return Err(Error::InvalidMode);
        }

        self.with_state(|s| {
            s.locked(|s| {
                s.require_initialized()?;
                s.op_modes[mode as usize] = *operation;
                if s.mode == mode {
                    s.apply_mode(mode);
                }
                Ok(())
            })
        })
    }

    pub fn save_configuration(&self, mode: Mode) -> Result<OperationMode, Error> {
        if mode == Mode::Noise {
            return Err(Error::InvalidMode);
        }
        self.with_state(|s| Ok(s.op_modes[mode as usize]))
    }

    /// Keep the peripheral running through stop modes.
    ///
    /// No sweeps can be started until [`disable_low_power`](Self::disable_low_power).
    pub fn enable_low_power(&self) -> Result<(), Error> {
        self.with_state(|s| {
            s.locked(|s| {
                s.require_initialized()?;
                s.hal.enable_stop();
                s.status = Status::Lowpower;
                Ok(())
            })
        })
    }

    /// Leave low-power operation, optionally switching profile on the way out
    pub fn disable_low_power(&self, mode: Option<Mode>) -> Result<(), Error> {
        if mode == Some(Mode::Noise) {
            return Err(Error::InvalidMode);
        }

        self.with_state(|s| {
            s.locked(|s| {
                if s.status != Status::Lowpower {
                    return Err(Error::InvalidMode);
                }
                s.hal.disable_stop();
                s.status = Status::Initialized;
                if let Some(mode) = mode {
                    s.apply_mode(mode);
                }
                Ok(())
            })
        })
    }
}

impl<H: TsiHal, C: Clock> Default for Tsi<H, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::testing::{pump, SimTsi, StepClock};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn driver(clock_step: u32) -> (Tsi<SimTsi, StepClock>, SimTsi) {
        let sim = SimTsi::default();
        let tsi = Tsi::new();
        tsi.init(sim.clone(), StepClock::new(0, clock_step), &UserConfig::default())
            .unwrap();
        (tsi, sim)
    }

    #[test]
    fn init_programs_hardware() {
        let (tsi, sim) = driver(1);
        let hw = sim.state();
        assert!(hw.clock_enabled);
        assert!(hw.interrupt_enabled);
        assert!(hw.end_of_scan_interrupt);
        assert!(hw.irq_unmasked);
        assert_eq!(hw.configured, vec![Settings::default()]);
        drop(hw);

        assert_eq!(tsi.status(), Status::Initialized);
        assert!(tsi.enabled_electrodes().is_empty());
    }

    #[test]
    fn second_init_rejected() {
        let (tsi, _sim) = driver(1);
        let result = tsi.init(SimTsi::default(), StepClock::new(0, 1), &UserConfig::default());
        assert_eq!(result, Err(Error::Initialized));
    }

    #[test]
    fn uninitialized_calls_fail() {
        let tsi: Tsi<SimTsi, StepClock> = Tsi::new();
        assert_eq!(tsi.status(), Status::Uninitialized);
        assert_eq!(tsi.measure(), Err(Error::Uninitialized));
        assert_eq!(tsi.abort_measure(), Err(Error::Uninitialized));
        assert!(tsi.deinit().is_err());
        // Interrupts for a missing driver are ignored
        tsi.on_interrupt();
    }

    #[test]
    fn deinit_allows_reinit() {
        let (tsi, sim) = driver(1);
        tsi.enable_electrode(3, true).unwrap();
        let (hal, _clock) = tsi.deinit().unwrap();
        assert!(!sim.state().clock_enabled);
        assert!(!sim.state().irq_unmasked);
        assert!(!tsi.is_initialized());

        tsi.init(hal, StepClock::new(0, 1), &UserConfig::default())
            .unwrap();
        assert!(tsi.enabled_electrodes().is_empty());
    }

    #[test]
    fn measure_without_electrodes() {
        let (tsi, sim) = driver(1);
        assert_eq!(tsi.measure(), Err(Error::InvalidChannel));
        assert_eq!(tsi.status(), Status::Initialized);
        assert!(sim.state().triggers.is_empty());
    }

    #[test]
    fn sweep_visits_each_enabled_channel_once() {
        for bits in [0x0001u16, 0x8000, 0x0600, 0xA5A5, 0xFFFF, 0x1234] {
            let (tsi, sim) = driver(1);
            let mask = ElectrodeMask::from_bits(bits);
            for ch in mask.iter() {
                tsi.enable_electrode(ch, true).unwrap();
                sim.set_count(ch, 1000 + ch as u16);
            }

            tsi.measure().unwrap();
            assert_eq!(tsi.status(), Status::Busy);
            pump(&tsi, &sim);
            assert_eq!(tsi.status(), Status::Initialized);

            let expected: Vec<u8> = mask.iter().collect();
            assert_eq!(sim.state().triggers, expected, "mask {:#06x}", bits);
            for ch in mask.iter() {
                assert_eq!(tsi.get_counter(ch), Ok(1000 + ch as u16));
            }
        }
    }

    #[test]
    fn busy_rejects_changes() {
        let (tsi, sim) = driver(1);
        tsi.enable_electrode(4, true).unwrap();
        tsi.enable_electrode(5, true).unwrap();
        tsi.measure().unwrap();

        assert_eq!(tsi.enable_electrode(6, true), Err(Error::Busy));
        assert_eq!(tsi.measure(), Err(Error::Busy));
        assert_eq!(tsi.set_callback(None), Err(Error::Busy));

        pump(&tsi, &sim);
        assert_eq!(tsi.enable_electrode(6, true), Ok(()));
    }

    #[test]
    fn disabled_channel_has_no_counter() {
        let (tsi, sim) = driver(1);
        tsi.enable_electrode(2, true).unwrap();
        sim.set_count(2, 77);
        tsi.measure_blocking_with(|| pump(&tsi, &sim)).unwrap();
        assert_eq!(tsi.get_counter(2), Ok(77));

        tsi.enable_electrode(2, false).unwrap();
        assert_eq!(tsi.get_counter(2), Err(Error::InvalidChannel));
        assert_eq!(tsi.get_counter(3), Err(Error::InvalidChannel));
    }

    #[test]
    #[should_panic]
    fn out_of_range_channel_panics() {
        let (tsi, _sim) = driver(1);
        let _ = tsi.enable_electrode(16, true);
    }

    #[test]
    fn blocking_measure_completes() {
        let (tsi, sim) = driver(1);
        tsi.enable_electrode(9, true).unwrap();
        tsi.enable_electrode(10, true).unwrap();
        sim.set_count(9, 120);
        sim.set_count(10, 130);

        let mut polls = 0;
        tsi.measure_blocking_with(|| {
            polls += 1;
            if sim.pending() {
                tsi.on_interrupt();
            }
        })
        .unwrap();

        assert!(polls >= 2);
        assert_eq!(tsi.status(), Status::Initialized);
        assert_eq!(tsi.get_counter(9), Ok(120));
        assert_eq!(tsi.get_counter(10), Ok(130));
    }

    #[test]
    fn blocking_measure_times_out() {
        let (tsi, sim) = driver(1);
        tsi.enable_electrode(1, true).unwrap();

        let mut polls = 0u32;
        let result = tsi.measure_blocking_with(|| polls += 1);

        assert_eq!(result, Err(Error::Timeout));
        assert_eq!(tsi.status(), Status::Initialized);
        assert!(polls >= BLOCKING_TIMEOUT / 2);
        assert!(!sim.state().module_enabled);

        // A late interrupt from the dropped sweep is harmless
        tsi.on_interrupt();
        assert_eq!(tsi.status(), Status::Initialized);

        // The next blocking request does not see a stale completion
        let result = tsi.measure_blocking_with(|| {});
        assert_eq!(result, Err(Error::Timeout));
    }

    #[test]
    fn abort_releases_blocked_waiter() {
        let (tsi, _sim) = driver(1);
        tsi.enable_electrode(0, true).unwrap();

        let mut aborted = false;
        let result = tsi.measure_blocking_with(|| {
            if !aborted {
                aborted = true;
                tsi.abort_measure().unwrap();
            }
        });

        assert_eq!(result, Err(Error::Aborted));
        assert_eq!(tsi.status(), Status::Initialized);
    }

    #[test]
    fn abort_when_idle_is_noop() {
        let (tsi, sim) = driver(1);
        assert_eq!(tsi.abort_measure(), Ok(()));
        assert_eq!(sim.state().flags_cleared, 0);
    }

    static CALLBACK_SUM: AtomicU32 = AtomicU32::new(0);

    fn sum_counts(counters: &Counters) {
        let sum: u32 = counters
            .enabled
            .iter()
            .filter_map(|ch| counters.get(ch))
            .map(u32::from)
            .sum();
        CALLBACK_SUM.store(sum, Ordering::SeqCst);
    }

    #[test]
    fn async_measure_invokes_callback() {
        let sim = SimTsi::default();
        let tsi = Tsi::new();
        let user = UserConfig {
            callback: Some(sum_counts),
            ..UserConfig::default()
        };
        tsi.init(sim.clone(), StepClock::new(0, 1), &user).unwrap();
        tsi.enable_electrode(7, true).unwrap();
        tsi.enable_electrode(8, true).unwrap();
        sim.set_count(7, 11);
        sim.set_count(8, 31);

        tsi.measure().unwrap();
        pump(&tsi, &sim);
        assert_eq!(CALLBACK_SUM.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn modes() {
        let (tsi, sim) = driver(1);
        assert_eq!(tsi.mode(), Ok(Mode::Normal));
        assert_eq!(tsi.change_mode(Mode::Noise), Err(Error::InvalidMode));

        let proximity = OperationMode {
            enabled: ElectrodeMask::from_bits(1 << 12),
            settings: Config {
                scan_count: Some(ScanCount::S32),
                ..Config::new()
            }
            .settings(),
        };
        tsi.load_configuration(Mode::Proximity, &proximity).unwrap();
        assert_eq!(tsi.save_configuration(Mode::Proximity), Ok(proximity));

        tsi.change_mode(Mode::Proximity).unwrap();
        assert_eq!(tsi.mode(), Ok(Mode::Proximity));
        assert_eq!(tsi.enabled_electrodes().bits(), 1 << 12);
        assert_eq!(sim.state().configured.last(), Some(&proximity.settings));

        tsi.change_mode(Mode::Normal).unwrap();
        assert!(tsi.enabled_electrodes().is_empty());
    }

    #[test]
    fn low_power() {
        let (tsi, sim) = driver(1);
        tsi.enable_electrode(0, true).unwrap();
        tsi.enable_low_power().unwrap();
        assert!(sim.state().stop_enabled);
        assert_eq!(tsi.status(), Status::Lowpower);
        assert_eq!(tsi.measure(), Err(Error::Lowpower));

        tsi.disable_low_power(None).unwrap();
        assert!(!sim.state().stop_enabled);
        assert_eq!(tsi.status(), Status::Initialized);
        assert_eq!(tsi.disable_low_power(None), Err(Error::InvalidMode));
    }

    #[test]
    fn baseline_is_mean_of_samples() {
        let (tsi, sim) = driver(1);
        tsi.enable_electrode(9, true).unwrap();
        tsi.enable_electrode(10, true).unwrap();
        sim.set_count(9, 50);
        sim.set_count(10, 50);

        let baseline = tsi.untouched_baseline_with(&[9, 10], BASELINE_SAMPLES, || pump(&tsi, &sim));
        assert_eq!(baseline, Ok(50));
        assert_eq!(sim.state().triggers.len(), 2 * BASELINE_SAMPLES as usize);
    }

    #[test]
    fn baseline_rejects_bad_arguments() {
        let (tsi, _sim) = driver(1);
        assert_eq!(tsi.untouched_baseline(&[]), Err(Error::InvalidArgument));
        assert_eq!(
            tsi.untouched_baseline_with(&[1], 0, || {}),
            Err(Error::InvalidArgument)
        );
    }
}
