use crate::tsi::Status;

/// Reasons a touch-sense driver operation did not succeed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A sweep is in flight or the driver state is being changed; retry later
    Busy,
    /// The driver is parked in low-power mode
    Lowpower,
    /// A recalibration is in progress
    Recalibration,
    /// The channel is not enabled, or no channel is enabled at all
    InvalidChannel,
    /// The requested operation mode is not supported by this peripheral
    InvalidMode,
    /// An argument was out of range
    InvalidArgument,
    /// The driver instance already exists
    Initialized,
    /// The driver has not been initialized
    Uninitialized,
    /// A blocking sweep did not finish before its deadline
    Timeout,
    /// A blocking sweep was cancelled with `abort_measure`
    Aborted,
    /// The peripheral reported an error state
    Fault,
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        match status {
            Status::Uninitialized => Error::Uninitialized,
            Status::Initialized => Error::Initialized,
            Status::Busy => Error::Busy,
            Status::Lowpower => Error::Lowpower,
            Status::Recalibration => Error::Recalibration,
            Status::Error => Error::Fault,
        }
    }
}
