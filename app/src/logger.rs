//! `log` records forwarded to defmt over RTT.

use core::fmt::Write;

use heapless::String;
use log::{Level, LevelFilter, Log, Metadata, Record};

const LINE_LEN: usize = 128;

struct DefmtLogger;

static LOGGER: DefmtLogger = DefmtLogger;

impl Log for DefmtLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut line: String<LINE_LEN> = String::new();
        // Overlong lines are truncated
        let _ = write!(line, "{}", record.args());

        match record.level() {
            Level::Error => defmt::error!("{=str}", line.as_str()),
            Level::Warn => defmt::warn!("{=str}", line.as_str()),
            Level::Info => defmt::info!("{=str}", line.as_str()),
            Level::Debug => defmt::debug!("{=str}", line.as_str()),
            Level::Trace => defmt::trace!("{=str}", line.as_str()),
        }
    }

    fn flush(&self) {}
}

/// Install the logger. Must run before interrupts are enabled.
pub fn init(level: LevelFilter) {
    // thumbv6m has no atomic compare-and-swap, so the racy setters are the
    // only ones available
    unsafe {
        let _ = log::set_logger_racy(&LOGGER);
        log::set_max_level_racy(level);
    }
}
