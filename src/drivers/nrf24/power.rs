//! Power state control
//!
//! Power up/down, receive enable and carrier control built on the register
//! link. Every operation that makes a later read meaningful (power-up,
//! entering receive) waits out the settling time itself, so a caller can
//! never sample a stale register.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use super::{config_bits, reg, rf_setup_bits, RadioBus, RadioResult, Transceiver, STATUS_IRQ_MASK};
use crate::config::{POWER_UP_SETTLE_US, RX_SETTLE_US, TX_PULSE_US};
use crate::types::Channel;

impl<P: OutputPin> Transceiver<P> {
    /// Check that a module answers on this select line
    ///
    /// `SETUP_AW` resets to 3 and only accepts 1..=3; a floating bus reads
    /// back 0x00 or 0xFF.
    pub fn is_present<SPI: SpiBus, D>(&mut self, bus: &mut RadioBus<SPI, D>) -> RadioResult<bool> {
        let aw = self.read_register(bus, reg::SETUP_AW)?;
        Ok((1..=3).contains(&aw))
    }

    /// Set `PWR_UP` and wait for standby-I
    pub fn power_up<SPI: SpiBus, D: DelayNs>(&mut self, bus: &mut RadioBus<SPI, D>) -> RadioResult<()> {
        self.update_register(bus, reg::CONFIG, 0, config_bits::PWR_UP)?;
        bus.delay_us(POWER_UP_SETTLE_US);
        Ok(())
    }

    /// Clear `PWR_UP`
    pub fn power_down<SPI: SpiBus, D>(&mut self, bus: &mut RadioBus<SPI, D>) -> RadioResult<()> {
        self.set_ce(false)?;
        self.update_register(bus, reg::CONFIG, config_bits::PWR_UP, 0)?;
        Ok(())
    }

    /// Select primary receiver (`true`) or transmitter (`false`) role
    pub fn set_primary_rx<SPI: SpiBus, D>(&mut self, bus: &mut RadioBus<SPI, D>, rx: bool) -> RadioResult<()> {
        if rx {
            self.update_register(bus, reg::CONFIG, 0, config_bits::PRIM_RX)?;
        } else {
            self.update_register(bus, reg::CONFIG, config_bits::PRIM_RX, 0)?;
        }
        Ok(())
    }

    /// Raise CE and wait until the receiver is listening
    pub fn enter_receive<SPI: SpiBus, D: DelayNs>(&mut self, bus: &mut RadioBus<SPI, D>) -> RadioResult<()> {
        self.enter_receive_settled(bus, RX_SETTLE_US)
    }

    /// Raise CE and wait `settle_us` before returning
    pub fn enter_receive_settled<SPI: SpiBus, D: DelayNs>(
        &mut self,
        bus: &mut RadioBus<SPI, D>,
        settle_us: u32,
    ) -> RadioResult<()> {
        self.set_ce(true)?;
        bus.delay_us(settle_us);
        Ok(())
    }

    /// Drop CE, back to standby-I
    pub fn exit_receive(&mut self) -> RadioResult<()> {
        self.set_ce(false)
    }

    /// Read the received power detector
    ///
    /// Only meaningful after [`Self::enter_receive`] has returned; RPD
    /// latches the last listening period, so it stays valid after CE drops.
    pub fn carrier_detected<SPI: SpiBus, D>(&mut self, bus: &mut RadioBus<SPI, D>) -> RadioResult<bool> {
        Ok(self.read_register(bus, reg::RPD)? & 0x01 != 0)
    }

    /// Tune to a channel
    pub fn set_channel<SPI: SpiBus, D>(&mut self, bus: &mut RadioBus<SPI, D>, channel: Channel) -> RadioResult<()> {
        self.write_register(bus, reg::RF_CH, channel.raw())
    }

    /// Read back the tuned channel register
    pub fn channel<SPI: SpiBus, D>(&mut self, bus: &mut RadioBus<SPI, D>) -> RadioResult<u8> {
        self.read_register(bus, reg::RF_CH)
    }

    /// Start an unmodulated carrier at full power on `channel`
    pub fn start_carrier<SPI: SpiBus, D>(&mut self, bus: &mut RadioBus<SPI, D>, channel: Channel) -> RadioResult<()> {
        self.set_ce(false)?;
        self.update_register(
            bus,
            reg::RF_SETUP,
            0,
            rf_setup_bits::CONT_WAVE | rf_setup_bits::PLL_LOCK | rf_setup_bits::RF_PWR,
        )?;
        self.set_channel(bus, channel)?;
        self.set_ce(true)
    }

    /// Stop the carrier and return to standby-I
    pub fn stop_carrier<SPI: SpiBus, D>(&mut self, bus: &mut RadioBus<SPI, D>) -> RadioResult<()> {
        self.set_ce(false)?;
        self.update_register(bus, reg::RF_SETUP, rf_setup_bits::CONT_WAVE | rf_setup_bits::PLL_LOCK, 0)?;
        Ok(())
    }

    /// Transmit one payload without waiting for completion
    ///
    /// The TX FIFO is flushed first so a payload that never left (no
    /// acknowledgement is ever expected) cannot fill it up.
    pub fn transmit<SPI: SpiBus, D: DelayNs>(&mut self, bus: &mut RadioBus<SPI, D>, payload: &[u8]) -> RadioResult<()> {
        self.flush_tx(bus)?;
        self.write_register(bus, reg::STATUS, STATUS_IRQ_MASK)?;
        self.write_payload(bus, payload)?;
        self.set_ce(true)?;
        bus.delay_us(TX_PULSE_US);
        self.set_ce(false)
    }
}
