//! Channel Scanner
//!
//! Sweeps the band on one transceiver, counting how often the received
//! power detector fires on each channel, and keeps a scrolling history of
//! bar heights for the spectrum display.
//!
//! One cycle is `passes` full sweeps. After the sweeps a single channel is
//! picked at random and its count, scaled against the busiest channel,
//! becomes the newest bar. Sampling one channel per frame keeps the cycle
//! short enough for a live display while still visiting the whole band
//! over time.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use heapless::HistoryBuffer;
use rand_core::RngCore;

use crate::config::{CHANNEL_DWELL_US, DISPLAY_WIDTH, GRAPH_HEIGHT, RX_SETTLE_US, SCAN_PASSES, SCAN_RESOLUTION};
use crate::drivers::nrf24::{reg, rf_setup_bits, RadioBus, RadioResult, Transceiver};
use crate::types::{Channel, ScanResolution};

/// Largest channel count any resolution produces
pub const MAX_CHANNELS: usize = 128;

/// Scanner timing and geometry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    /// Channels per pass
    pub resolution: ScanResolution,
    /// Sweeps per cycle
    pub passes: u8,
    /// Receiver settling time after CE rises
    pub rx_settle_us: u32,
    /// Listening time per channel after settling
    pub dwell_us: u32,
    /// Bar height of the busiest channel
    pub graph_height: u8,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            resolution: SCAN_RESOLUTION,
            passes: SCAN_PASSES,
            rx_settle_us: RX_SETTLE_US,
            dwell_us: CHANNEL_DWELL_US,
            graph_height: GRAPH_HEIGHT,
        }
    }
}

/// Detection counts per channel for one cycle
#[derive(Clone, Debug)]
pub struct OccupancyTable {
    counts: [u16; MAX_CHANNELS],
    len: usize,
}

impl OccupancyTable {
    /// Create an all-zero table covering `len` channels
    #[must_use]
    pub const fn new(len: usize) -> Self {
        Self {
            counts: [0; MAX_CHANNELS],
            len: if len > MAX_CHANNELS { MAX_CHANNELS } else { len },
        }
    }

    /// Zero every count
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    /// Count one detection on channel `index`
    pub fn record(&mut self, index: usize) {
        if index < self.len {
            self.counts[index] = self.counts[index].saturating_add(1);
        }
    }

    /// Detections on channel `index` (zero if out of range)
    #[must_use]
    pub fn get(&self, index: usize) -> u16 {
        if index < self.len {
            self.counts[index]
        } else {
            0
        }
    }

    /// Number of channels in the table
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True if the table covers no channels
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Counts in channel order
    #[must_use]
    pub fn counts(&self) -> &[u16] {
        &self.counts[..self.len]
    }

    /// Sum of all detections
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts().iter().map(|&c| u32::from(c)).sum()
    }

    /// Highest count, floored at 1 so it can always be divided by
    #[must_use]
    pub fn peak(&self) -> u16 {
        self.counts().iter().copied().max().unwrap_or(0).max(1)
    }
}

/// Scrolling bar heights, one per display column
///
/// Always holds exactly [`DISPLAY_WIDTH`] entries; pushing a bar evicts the oldest.
pub struct BarHistory {
    bars: HistoryBuffer<u8, DISPLAY_WIDTH>,
}

impl BarHistory {
    /// Create a history of zero-height bars
    #[must_use]
    pub fn new() -> Self {
        Self {
            bars: HistoryBuffer::new_with(0),
        }
    }

    /// Append the newest bar, dropping the oldest
    pub fn push(&mut self, height: u8) {
        self.bars.write(height);
    }

    /// Number of bars (constant)
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; the history is pre-filled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.len() == 0
    }

    /// Most recent bar
    #[must_use]
    pub fn newest(&self) -> Option<u8> {
        self.bars.recent().copied()
    }

    /// Bars from oldest (left edge) to newest (right edge)
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.bars.oldest_ordered().copied()
    }
}

impl Default for BarHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one scan cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanReport {
    /// Sum of detections over all channels and passes
    pub total: u32,
    /// Busiest channel's count (floored at 1)
    pub peak: u16,
    /// Channel index sampled for the new bar
    pub sampled: usize,
    /// Height of the new bar
    pub bar_height: u8,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ScanReport {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Scan(total={}, peak={}, idx={}, bar={})",
            self.total,
            self.peak,
            self.sampled,
            self.bar_height
        );
    }
}

/// Scale a count against the peak onto `0..=height`
#[must_use]
pub fn bar_height(count: u16, peak: u16, height: u8) -> u8 {
    let peak = peak.max(1);
    let count = count.min(peak);
    (u32::from(count) * u32::from(height) / u32::from(peak)) as u8
}

/// Spectrum scanner state: configuration, occupancy table and bar history
pub struct ChannelScanner {
    config: ScanConfig,
    table: OccupancyTable,
    history: BarHistory,
    last: Option<ScanReport>,
}

impl ChannelScanner {
    /// Create a scanner with an empty table and history
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            table: OccupancyTable::new(config.resolution.channel_count()),
            history: BarHistory::new(),
            last: None,
        }
    }

    /// Scanner configuration
    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Counts from the most recent cycle (or the one in progress)
    #[must_use]
    pub const fn table(&self) -> &OccupancyTable {
        &self.table
    }

    /// Bar history for the display
    #[must_use]
    pub const fn history(&self) -> &BarHistory {
        &self.history
    }

    /// Report from the most recent completed cycle
    #[must_use]
    pub const fn last_report(&self) -> Option<ScanReport> {
        self.last
    }

    /// Put `radio` into a listening configuration suitable for sweeping
    ///
    /// Powers up, disables auto-ack, selects max LNA gain and the primary
    /// receiver role, and leaves CE low.
    pub fn prepare<P: OutputPin, SPI: SpiBus, D: DelayNs>(
        &mut self,
        radio: &mut Transceiver<P>,
        bus: &mut RadioBus<SPI, D>,
    ) -> RadioResult<()> {
        radio.set_ce(false)?;
        radio.stop_carrier(bus)?;
        radio.power_up(bus)?;
        radio.write_register(bus, reg::EN_AA, 0x00)?;
        radio.write_register(bus, reg::RF_SETUP, rf_setup_bits::MAX_POWER_2MBPS)?;
        radio.set_primary_rx(bus, true)?;
        debug!("scanner prepared on {}", radio.id());
        Ok(())
    }

    /// Zero the occupancy table for a new cycle
    pub fn begin_cycle(&mut self) {
        self.table.reset();
    }

    /// Sweep every channel once, counting detections
    pub fn run_pass<P: OutputPin, SPI: SpiBus, D: DelayNs>(
        &mut self,
        radio: &mut Transceiver<P>,
        bus: &mut RadioBus<SPI, D>,
    ) -> RadioResult<()> {
        let resolution = self.config.resolution;
        for index in 0..resolution.channel_count() {
            let Some(channel) = resolution.channel_at(index) else {
                continue;
            };
            if self.sample(radio, bus, channel)? {
                self.table.record(index);
            }
        }
        Ok(())
    }

    /// Listen on one channel for the dwell time and report whether RPD fired
    fn sample<P: OutputPin, SPI: SpiBus, D: DelayNs>(
        &self,
        radio: &mut Transceiver<P>,
        bus: &mut RadioBus<SPI, D>,
        channel: Channel,
    ) -> RadioResult<bool> {
        radio.set_channel(bus, channel)?;
        radio.enter_receive_settled(bus, self.config.rx_settle_us)?;
        bus.delay_us(self.config.dwell_us);
        radio.exit_receive()?;
        radio.carrier_detected(bus)
    }

    /// Run a complete cycle: reset, `passes` sweeps, then one new history bar
    ///
    /// The sweep always runs to completion; nothing can interrupt it.
    pub fn cycle<P: OutputPin, SPI: SpiBus, D: DelayNs, R: RngCore>(
        &mut self,
        radio: &mut Transceiver<P>,
        bus: &mut RadioBus<SPI, D>,
        rng: &mut R,
    ) -> RadioResult<ScanReport> {
        self.begin_cycle();
        for _ in 0..self.config.passes {
            self.run_pass(radio, bus)?;
        }
        Ok(self.finish_cycle(rng))
    }

    /// Cycle for when no scanning radio is present: the table stays all zero
    pub fn idle_cycle<R: RngCore>(&mut self, rng: &mut R) -> ScanReport {
        self.begin_cycle();
        self.finish_cycle(rng)
    }

    /// Reduce the table and append one randomly sampled bar to the history
    pub fn finish_cycle<R: RngCore>(&mut self, rng: &mut R) -> ScanReport {
        let total = self.table.total();
        let peak = self.table.peak();
        let sampled = pick_index(rng, self.table.len());
        let bar_height = bar_height(self.table.get(sampled), peak, self.config.graph_height);
        self.history.push(bar_height);

        let report = ScanReport {
            total,
            peak,
            sampled,
            bar_height,
        };
        trace!("{}", report);
        self.last = Some(report);
        report
    }
}

impl Default for ChannelScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

/// Uniform index in `0..len` (0 when `len` is 0)
pub(crate) fn pick_index<R: RngCore>(rng: &mut R, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (rng.next_u32() as usize) % len
    }
}
