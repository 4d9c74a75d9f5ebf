use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::sync::{MsgQueue, SyncError};

/// Codes carried by the main loop's message queue
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Message {
    KeyPressed = 1,
}

impl Message {
    /// Push onto `queue`. Safe to call from interrupt context.
    pub fn post<const N: usize>(self, queue: &MsgQueue<N>) -> Result<(), SyncError> {
        queue.enqueue(u8::from(self) as u32)
    }

    /// Decode a queued code. Unknown codes yield `None`.
    pub fn decode(code: u32) -> Option<Self> {
        u8::try_from(code).ok().and_then(|c| Self::try_from(c).ok())
    }
}
