use super::config::Settings;

/// Register-level operations the driver needs from the TSI peripheral.
///
/// Implementations are expected to be thin: each method maps to one or two
/// register writes. Methods are only called with the driver state held inside
/// a critical section.
pub trait TsiHal {
    /// Un-gate the peripheral clock
    fn enable_clock(&mut self);
    fn disable_clock(&mut self);

    /// Return the control, data and threshold registers to their reset values
    fn reset(&mut self);

    /// Program the analog front end. Must leave the module and interrupt
    /// enables as they were.
    fn configure(&mut self, settings: &Settings);

    fn enable_interrupt(&mut self);
    fn disable_interrupt(&mut self);

    /// Route the interrupt to end-of-scan instead of out-of-range
    fn enable_end_of_scan_interrupt(&mut self);

    fn enable_software_trigger(&mut self);

    fn enable_module(&mut self);
    fn disable_module(&mut self);

    /// Keep the module running in stop modes
    fn enable_stop(&mut self);
    fn disable_stop(&mut self);

    /// Select the channel measured by the next trigger
    fn set_channel(&mut self, channel: u8);

    /// Channel the last scan was performed on
    fn measured_channel(&self) -> u8;

    fn start_software_trigger(&mut self);

    /// Raw count of the last scan
    fn counter(&self) -> u16;

    /// Clear the out-of-range and end-of-scan flags
    fn clear_flags(&mut self);

    /// Unmask the TSI interrupt line in the interrupt controller
    fn unmask_irq(&mut self);
    fn mask_irq(&mut self);
}
