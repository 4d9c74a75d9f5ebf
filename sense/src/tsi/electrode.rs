/// Number of TSI input channels
pub const MAX_CHANNELS: usize = 16;

/// Set of enabled electrodes. Bit `n` selects channel `n`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ElectrodeMask(u16);

impl ElectrodeMask {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn contains(&self, channel: u8) -> bool {
        (channel as usize) < MAX_CHANNELS && self.0 & (1 << channel) != 0
    }

    pub fn insert(&mut self, channel: u8) {
        assert!((channel as usize) < MAX_CHANNELS);
        self.0 |= 1 << channel;
    }

    pub fn remove(&mut self, channel: u8) {
        assert!((channel as usize) < MAX_CHANNELS);
        self.0 &= !(1 << channel);
    }

    /// Lowest enabled channel
    pub fn first(&self) -> Option<u8> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as u8)
        }
    }

    /// Lowest enabled channel strictly above `channel`
    pub fn next_after(&self, channel: u8) -> Option<u8> {
        let above = (self.0 as u32) & !((1u32 << (channel as u32 + 1).min(31)) - 1);
        if above == 0 {
            None
        } else {
            Some(above.trailing_zeros() as u8)
        }
    }

    /// Enabled channels in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u8> {
        let mask = *self;
        (0..MAX_CHANNELS as u8).filter(move |ch| mask.contains(*ch))
    }
}

/// Progress through one pass over the enabled electrodes.
///
/// A sweep visits each channel of its mask once, lowest first. It is
/// advanced by the end-of-scan interrupt with the channel the hardware just
/// finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sweep {
    mask: ElectrodeMask,
    current: u8,
}

impl Sweep {
    /// Begin a sweep at the lowest enabled channel, or `None` for an empty mask
    pub fn start(mask: ElectrodeMask) -> Option<Self> {
        mask.first().map(|current| Self { mask, current })
    }

    pub fn mask(&self) -> ElectrodeMask {
        self.mask
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    /// Move past `finished`. Returns the next channel to measure, or `None`
    /// once the sweep is complete.
    pub fn advance(&mut self, finished: u8) -> Option<u8> {
        let next = self.mask.next_after(finished)?;
        self.current = next;
        Some(next)
    }
}

/// Snapshot of the counts captured by a completed sweep
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Counters {
    pub enabled: ElectrodeMask,
    pub values: [u16; MAX_CHANNELS],
}

impl Counters {
    /// Count for `channel`, if it was part of the sweep
    pub fn get(&self, channel: u8) -> Option<u16> {
        if self.enabled.contains(channel) {
            Some(self.values[channel as usize])
        } else {
            None
        }
    }
}
