//! Jam Coordinator
//!
//! Provisions up to [`RADIO_COUNT`] transceivers for transmission without
//! any link-layer niceties (no auto-ack, no retries, no CRC, full power,
//! fastest data rate) and then drives every provisioned transceiver
//! across a channel set on each tick.
//!
//! Three patterns are supported:
//!
//! - [`JamPattern::NarrowHop`]: each tick retunes all radios to one channel
//!   picked at random from a small set. The carriers started during
//!   provisioning do the work; nothing is transmitted per tick.
//! - [`JamPattern::WideHop`]: every hop interval all radios retune to the
//!   next channel of a larger set, in order, and each sends a filler payload.
//! - [`JamPattern::HeldCarrier`]: provisioning starts the carriers and the
//!   ticks do nothing.
//!
//! A radio that fails its presence probe (or errors while being configured)
//! is left out of the active set. Coordination continues with whatever is left.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use rand_core::RngCore;

use super::scanner::pick_index;
use crate::config::{channels, FILLER_PAYLOAD, HOP_INTERVAL_MS, NEUTRAL_CHANNEL, NEUTRAL_SETTLE_MS, RADIO_COUNT};
use crate::drivers::nrf24::{config_bits, reg, rf_setup_bits, RadioBus, RadioResult, Transceiver, STATUS_IRQ_MASK};
use crate::types::{Channel, Millis, RadioId};

/// How the coordinator uses the provisioned radios
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JamPattern {
    /// Random retune within a small set, carriers held
    NarrowHop,
    /// In-order stepping through a larger set with filler payloads
    WideHop,
    /// Carriers started once, no per-tick work
    HeldCarrier,
}

impl JamPattern {
    /// Check if provisioning starts a continuous carrier
    #[must_use]
    pub const fn holds_carrier(self) -> bool {
        matches!(self, Self::NarrowHop | Self::HeldCarrier)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for JamPattern {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NarrowHop => defmt::write!(f, "narrow-hop"),
            Self::WideHop => defmt::write!(f, "wide-hop"),
            Self::HeldCarrier => defmt::write!(f, "held-carrier"),
        }
    }
}

/// A complete jamming setup: pattern, hop set and per-radio groups
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JamProfile {
    /// Tick behaviour
    pub pattern: JamPattern,
    /// Channels visited by the hop patterns
    pub hop_set: &'static [Channel],
    /// Channels each radio is provisioned on (empty = radio unused)
    pub groups: [&'static [Channel]; RADIO_COUNT],
    /// Wide-hop step interval
    pub hop_interval_ms: u32,
    /// Wide-hop filler payload
    pub payload: &'static [u8],
}

impl JamProfile {
    /// BLE advertising channels, all radios hopping together with carriers
    pub const ADVERTISING: Self = Self {
        pattern: JamPattern::NarrowHop,
        hop_set: channels::BLE_ADVERTISING,
        groups: [channels::BLE_ADVERTISING; RADIO_COUNT],
        hop_interval_ms: 0,
        payload: &[],
    };

    /// Classic Bluetooth hop set, stepped in order with filler payloads
    pub const CLASSIC_SWEEP: Self = Self {
        pattern: JamPattern::WideHop,
        hop_set: channels::CLASSIC_HOP,
        groups: [channels::GROUP_1, channels::GROUP_2, channels::GROUP_3],
        hop_interval_ms: HOP_INTERVAL_MS,
        payload: FILLER_PAYLOAD,
    };

    /// One carrier per radio, each on its own group
    pub const MULTI_GROUP_CARRIER: Self = Self {
        pattern: JamPattern::HeldCarrier,
        hop_set: &[],
        groups: [channels::GROUP_1, channels::GROUP_2, channels::GROUP_3],
        hop_interval_ms: 0,
        payload: &[],
    };
}

/// Which radios took part in the last provisioning
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ActiveSet {
    mask: [bool; RADIO_COUNT],
}

impl ActiveSet {
    /// No radios active
    pub const NONE: Self = Self {
        mask: [false; RADIO_COUNT],
    };

    /// Mark a radio as active
    pub fn insert(&mut self, id: RadioId) {
        if let Some(slot) = self.mask.get_mut(id.slot()) {
            *slot = true;
        }
    }

    /// Check if a radio is active
    #[must_use]
    pub fn contains(&self, id: RadioId) -> bool {
        self.mask.get(id.slot()).copied().unwrap_or(false)
    }

    /// Number of active radios
    #[must_use]
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&active| active).count()
    }

    /// True if no radio is active
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Per-slot flags in slot order
    #[must_use]
    pub const fn as_array(&self) -> [bool; RADIO_COUNT] {
        self.mask
    }
}

/// Drives the provisioned radios according to a [`JamProfile`]
pub struct JamCoordinator {
    profile: Option<JamProfile>,
    active: ActiveSet,
    hop_index: usize,
    last_step: Option<Millis>,
}

impl JamCoordinator {
    /// Create an idle coordinator
    #[must_use]
    pub const fn new() -> Self {
        Self {
            profile: None,
            active: ActiveSet::NONE,
            hop_index: 0,
            last_step: None,
        }
    }

    /// Profile currently driving the radios
    #[must_use]
    pub const fn profile(&self) -> Option<JamProfile> {
        self.profile
    }

    /// Radios that passed provisioning
    #[must_use]
    pub const fn active(&self) -> ActiveSet {
        self.active
    }

    /// Position of the next wide-hop step within the hop set
    #[must_use]
    pub const fn hop_index(&self) -> usize {
        self.hop_index
    }

    /// Configure one radio for jamming on `group`
    ///
    /// Disables auto-ack, retries and CRC, selects full power at 2 Mbps and
    /// the transmitter role. Carrier-holding patterns then start a carrier
    /// on each channel of the group in turn (the radio ends up on the last
    /// one); the wide-hop pattern only tunes to the first channel.
    pub fn configure<P: OutputPin, SPI: SpiBus, D: DelayNs>(
        radio: &mut Transceiver<P>,
        bus: &mut RadioBus<SPI, D>,
        group: &[Channel],
        pattern: JamPattern,
    ) -> RadioResult<()> {
        radio.set_ce(false)?;
        radio.power_up(bus)?;
        radio.write_register(bus, reg::EN_AA, 0x00)?;
        radio.write_register(bus, reg::SETUP_RETR, 0x00)?;
        radio.write_register(bus, reg::RF_SETUP, rf_setup_bits::MAX_POWER_2MBPS)?;
        radio.update_register(
            bus,
            reg::CONFIG,
            config_bits::EN_CRC | config_bits::CRCO | config_bits::PRIM_RX,
            0,
        )?;
        radio.flush_tx(bus)?;
        radio.write_register(bus, reg::STATUS, STATUS_IRQ_MASK)?;

        if pattern.holds_carrier() {
            for &channel in group {
                radio.start_carrier(bus, channel)?;
            }
        } else if let Some(&first) = group.first() {
            radio.set_channel(bus, first)?;
        }
        Ok(())
    }

    /// Probe and configure every radio for `profile`
    ///
    /// Radios with an empty group, a failed probe or a bus error are left
    /// out and silenced, so a carrier from the previous mode does not keep
    /// running. Never fails as a whole.
    pub fn provision<P: OutputPin, SPI: SpiBus, D: DelayNs>(
        &mut self,
        radios: &mut [Transceiver<P>],
        bus: &mut RadioBus<SPI, D>,
        profile: JamProfile,
    ) -> ActiveSet {
        let mut active = ActiveSet::NONE;

        for radio in radios.iter_mut() {
            let id = radio.id();
            let group = profile.groups.get(id.slot()).copied().unwrap_or(&[]);
            if Self::admit(radio, bus, group, profile.pattern) {
                info!("{} provisioned ({})", id, profile.pattern);
                active.insert(id);
            } else {
                Self::silence(radio, bus);
            }
        }

        self.profile = Some(profile);
        self.active = active;
        self.hop_index = 0;
        self.last_step = None;
        active
    }

    /// Probe one radio and configure it for `group`; false if it sits this mode out
    fn admit<P: OutputPin, SPI: SpiBus, D: DelayNs>(
        radio: &mut Transceiver<P>,
        bus: &mut RadioBus<SPI, D>,
        group: &[Channel],
        pattern: JamPattern,
    ) -> bool {
        let id = radio.id();
        if group.is_empty() {
            return false;
        }

        match radio.is_present(bus) {
            Ok(true) => {}
            Ok(false) => {
                info!("{} not connected, skipped", id);
                return false;
            }
            Err(err) => {
                warn!("{} probe failed: {}", id, err);
                return false;
            }
        }

        match Self::configure(radio, bus, group, pattern) {
            Ok(()) => true,
            Err(err) => {
                warn!("{} provisioning failed: {}", id, err);
                false
            }
        }
    }

    /// Drop CE, clear the carrier bits and power down; errors only logged
    fn silence<P: OutputPin, SPI: SpiBus, D>(radio: &mut Transceiver<P>, bus: &mut RadioBus<SPI, D>) {
        let result = radio.stop_carrier(bus).and_then(|()| radio.power_down(bus));
        if let Err(err) = result {
            debug!("{} power down failed: {}", radio.id(), err);
        }
    }

    /// One unit of jamming work
    ///
    /// Returns the channel the active radios were tuned to, or None if this
    /// tick did nothing (held carrier, hop interval not yet elapsed, idle).
    /// A failing radio does not stop the others; the first error is returned
    /// after all radios were driven.
    pub fn tick<P: OutputPin, SPI: SpiBus, D: DelayNs, R: RngCore>(
        &mut self,
        radios: &mut [Transceiver<P>],
        bus: &mut RadioBus<SPI, D>,
        rng: &mut R,
        now: Millis,
    ) -> RadioResult<Option<Channel>> {
        let Some(profile) = self.profile else {
            return Ok(None);
        };
        if profile.hop_set.is_empty() {
            return Ok(None);
        }

        match profile.pattern {
            JamPattern::HeldCarrier => Ok(None),
            JamPattern::NarrowHop => {
                let channel = profile.hop_set[pick_index(rng, profile.hop_set.len())];
                self.retune_all(radios, bus, channel, &[])?;
                Ok(Some(channel))
            }
            JamPattern::WideHop => {
                if let Some(last) = self.last_step {
                    if now.since(last) < profile.hop_interval_ms {
                        return Ok(None);
                    }
                }
                let channel = profile.hop_set[self.hop_index % profile.hop_set.len()];
                self.hop_index = (self.hop_index + 1) % profile.hop_set.len();
                self.last_step = Some(now);
                self.retune_all(radios, bus, channel, profile.payload)?;
                Ok(Some(channel))
            }
        }
    }

    /// Tune every active radio to `channel`, sending `payload` from each if non-empty
    fn retune_all<P: OutputPin, SPI: SpiBus, D: DelayNs>(
        &self,
        radios: &mut [Transceiver<P>],
        bus: &mut RadioBus<SPI, D>,
        channel: Channel,
        payload: &[u8],
    ) -> RadioResult<()> {
        let mut first_error = None;

        for radio in radios.iter_mut().filter(|r| self.active.contains(r.id())) {
            if let Err(err) = Self::retune_one(radio, bus, channel, payload) {
                warn!("{} retune to {} failed: {}", radio.id(), channel, err);
                first_error.get_or_insert(err);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    fn retune_one<P: OutputPin, SPI: SpiBus, D: DelayNs>(
        radio: &mut Transceiver<P>,
        bus: &mut RadioBus<SPI, D>,
        channel: Channel,
        payload: &[u8],
    ) -> RadioResult<()> {
        radio.set_channel(bus, channel)?;
        if !payload.is_empty() {
            radio.transmit(bus, payload)?;
        }
        Ok(())
    }

    /// Stop every radio and park it on the neutral channel
    ///
    /// Applied to all radios, present or not; writes to an absent module
    /// are harmless. Clears the active set.
    pub fn release<P: OutputPin, SPI: SpiBus, D: DelayNs>(
        &mut self,
        radios: &mut [Transceiver<P>],
        bus: &mut RadioBus<SPI, D>,
    ) {
        for radio in radios.iter_mut() {
            let result = radio
                .stop_carrier(bus)
                .and_then(|()| radio.set_channel(bus, NEUTRAL_CHANNEL));
            if let Err(err) = result {
                warn!("{} release failed: {}", radio.id(), err);
            }
        }
        bus.delay_ms(NEUTRAL_SETTLE_MS);

        self.profile = None;
        self.active = ActiveSet::NONE;
        self.hop_index = 0;
        self.last_step = None;
    }
}

impl Default for JamCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
