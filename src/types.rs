//! Shared types used across the firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

use core::fmt;

/// A 2.4 GHz channel, stored as the transceiver's `RF_CH` register value
///
/// Channel `n` sits at `2400 + n` MHz. The register holds 7 bits, so the
/// valid range is 0..=127 (126 and 127 are above the ISM band but are
/// still swept by the scanner at full resolution).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    /// Highest programmable channel
    pub const MAX: u8 = 127;

    /// Base frequency of channel 0 in MHz
    pub const BASE_MHZ: u16 = 2400;

    /// Create a channel from its register value, returns None if out of range
    #[must_use]
    pub const fn new(raw: u8) -> Option<Self> {
        if raw <= Self::MAX {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Create a channel in a constant context
    ///
    /// # Panics
    ///
    /// Panics (at compile time when used in a `const`) if `raw` exceeds [`Channel::MAX`].
    #[must_use]
    pub const fn of(raw: u8) -> Self {
        match Self::new(raw) {
            Some(channel) => channel,
            None => panic!("channel out of range"),
        }
    }

    /// Get the register value
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Get the centre frequency in MHz
    #[must_use]
    pub const fn frequency_mhz(self) -> u16 {
        Self::BASE_MHZ + self.0 as u16
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Channel({} / {} MHz)", self.0, self.frequency_mhz())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Channel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ch{} ({} MHz)", self.0, self.frequency_mhz());
    }
}

/// Number of channels swept per scanner pass
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScanResolution {
    /// 64 channels, every second register value (2 MHz spacing)
    #[default]
    Coarse,
    /// 128 channels, every register value (1 MHz spacing)
    Fine,
}

impl ScanResolution {
    /// Number of channels in one pass
    #[must_use]
    pub const fn channel_count(self) -> usize {
        match self {
            Self::Coarse => 64,
            Self::Fine => 128,
        }
    }

    /// Map a sweep index onto the physical channel it samples
    ///
    /// Returns None if `index` is not below [`Self::channel_count`].
    #[must_use]
    pub const fn channel_at(self, index: usize) -> Option<Channel> {
        let count = self.channel_count();
        if index >= count {
            return None;
        }
        Channel::new(((index * 128) / count) as u8)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ScanResolution {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Coarse => defmt::write!(f, "64ch"),
            Self::Fine => defmt::write!(f, "128ch"),
        }
    }
}

/// Top-level operating mode selected by the mode button
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OperationMode {
    /// All transceivers parked, nothing transmitted
    #[default]
    Inactive,
    /// Spectrum scan on the first transceiver
    ScanOnly,
    /// Mode A: short-range beacon jam (BLE advertising channels)
    ModeA,
    /// Mode B: wide-band jam (classic Bluetooth hop set)
    ModeB,
}

impl OperationMode {
    /// All modes in button-cycle order
    pub const ALL: [Self; 4] = [Self::Inactive, Self::ScanOnly, Self::ModeA, Self::ModeB];

    /// Position of this mode in the button cycle
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Inactive => 0,
            Self::ScanOnly => 1,
            Self::ModeA => 2,
            Self::ModeB => 3,
        }
    }

    /// Mode at position `index` in the cycle (wraps)
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Check if this mode drives the jam coordinator
    #[must_use]
    pub const fn is_jamming(self) -> bool {
        matches!(self, Self::ModeA | Self::ModeB)
    }

    /// Short label shown on the display
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inactive => "OFF",
            Self::ScanOnly => "Scan",
            Self::ModeA => "BLE",
            Self::ModeB => "Classic",
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for OperationMode {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.label());
    }
}

/// Identifies one of the transceivers sharing the SPI bus
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RadioId(u8);

impl RadioId {
    /// Create from a zero-based slot index
    #[must_use]
    pub const fn new(slot: u8) -> Self {
        Self(slot)
    }

    /// Zero-based slot index
    #[must_use]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }

    /// One-based number printed on the enclosure and display
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0 + 1
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RadioId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "NRF{}", self.number());
    }
}

/// Millisecond timestamp from the uptime clock
///
/// Wraps after ~49 days; differences are computed with wrapping arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Millis(u32);

impl Millis {
    /// Create from a raw millisecond count
    #[must_use]
    pub const fn new(ms: u32) -> Self {
        Self(ms)
    }

    /// Raw millisecond count
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`
    #[must_use]
    pub const fn since(self, earlier: Self) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Millis {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}ms", self.0);
    }
}

/// RGB colour for the status LED (8 bits per channel)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgb {
    /// Red component
    pub r: u8,
    /// Green component
    pub g: u8,
    /// Blue component
    pub b: u8,
}

impl Rgb {
    /// LED off
    pub const OFF: Self = Self::new(0, 0, 0);

    /// Dim white shown while nothing is transmitting or detected
    pub const IDLE: Self = Self::new(8, 8, 8);

    /// Red shown while jamming or while the scanner sees activity
    pub const ACTIVE: Self = Self::new(16, 0, 0);

    /// Create a colour from components
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Rgb {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b);
    }
}
