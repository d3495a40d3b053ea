//! nRF24L01(+) Register Link
//!
//! Byte-level access to the transceiver's register file over the SPI bus
//! shared by every module on the board.
//!
//! Each transaction asserts the module's own CSN line, clocks a command
//! byte (`R_REGISTER`/`W_REGISTER` plus a 5-bit address, or one of the
//! FIFO commands) and its data bytes, then deasserts CSN. The bus is owned
//! by a single [`RadioBus`] and borrowed mutably for the length of one
//! transaction, so two transactions can never interleave.
//!
//! A missing module is not detected here: reads simply return whatever the
//! floating MISO line produces. Use [`Transceiver::is_present`] before
//! relying on a module.

mod power;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, SpiBus};

use crate::types::RadioId;

/// nRF24 register addresses
pub mod reg {
    /// Configuration (power, primary RX/TX, CRC)
    pub const CONFIG: u8 = 0x00;
    /// Auto-acknowledgment enable per pipe
    pub const EN_AA: u8 = 0x01;
    /// Address width
    pub const SETUP_AW: u8 = 0x03;
    /// Automatic retransmission
    pub const SETUP_RETR: u8 = 0x04;
    /// RF channel
    pub const RF_CH: u8 = 0x05;
    /// RF setup (power level, data rate, carrier test)
    pub const RF_SETUP: u8 = 0x06;
    /// Status flags
    pub const STATUS: u8 = 0x07;
    /// Received power detector
    pub const RPD: u8 = 0x09;
}

/// SPI command bytes
pub mod cmd {
    /// Read register (OR with address)
    pub const R_REGISTER: u8 = 0x00;
    /// Write register (OR with address)
    pub const W_REGISTER: u8 = 0x20;
    /// Register address bits of a register command
    pub const REGISTER_MASK: u8 = 0x1F;
    /// Write TX payload
    pub const W_TX_PAYLOAD: u8 = 0xA0;
    /// Flush TX FIFO
    pub const FLUSH_TX: u8 = 0xE1;
    /// Flush RX FIFO
    pub const FLUSH_RX: u8 = 0xE2;
    /// No operation, used as the don't-care byte of a read
    pub const NOP: u8 = 0xFF;
}

/// `CONFIG` register bits
pub mod config_bits {
    /// Primary receiver (clear for transmitter)
    pub const PRIM_RX: u8 = 0x01;
    /// Power up
    pub const PWR_UP: u8 = 0x02;
    /// 2-byte CRC
    pub const CRCO: u8 = 0x04;
    /// Enable CRC
    pub const EN_CRC: u8 = 0x08;
}

/// `RF_SETUP` register bits
pub mod rf_setup_bits {
    /// LNA gain (non-plus modules), ignored by the plus variant
    pub const LNA_HCURR: u8 = 0x01;
    /// Output power field (0b11 = 0 dBm)
    pub const RF_PWR: u8 = 0x06;
    /// 2 Mbps when set and `RF_DR_LOW` is clear
    pub const RF_DR_HIGH: u8 = 0x08;
    /// Force PLL lock (carrier test)
    pub const PLL_LOCK: u8 = 0x10;
    /// 250 kbps
    pub const RF_DR_LOW: u8 = 0x20;
    /// Continuous carrier transmit
    pub const CONT_WAVE: u8 = 0x80;
    /// Maximum power, 2 Mbps, LNA on
    pub const MAX_POWER_2MBPS: u8 = RF_PWR | RF_DR_HIGH | LNA_HCURR;
}

/// `STATUS` interrupt flags (write 1 to clear)
pub const STATUS_IRQ_MASK: u8 = 0x70;

/// Largest payload the TX FIFO accepts
pub const MAX_PAYLOAD_LEN: usize = 32;

/// Build the command byte that reads register `addr`
#[must_use]
pub const fn read_command(addr: u8) -> u8 {
    cmd::R_REGISTER | (addr & cmd::REGISTER_MASK)
}

/// Build the command byte that writes register `addr`
#[must_use]
pub const fn write_command(addr: u8) -> u8 {
    cmd::W_REGISTER | (addr & cmd::REGISTER_MASK)
}

/// Radio driver error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadioError {
    /// SPI transfer failed
    Bus(spi::ErrorKind),
    /// CE or CSN could not be driven
    Pin(digital::ErrorKind),
    /// Payload longer than the TX FIFO
    PayloadTooLong(usize),
}

impl RadioError {
    fn bus<E: spi::Error>(err: E) -> Self {
        Self::Bus(err.kind())
    }

    fn pin<E: digital::Error>(err: E) -> Self {
        Self::Pin(err.kind())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RadioError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Bus(kind) => defmt::write!(f, "bus error ({})", defmt::Debug2Format(kind)),
            Self::Pin(kind) => defmt::write!(f, "pin error ({})", defmt::Debug2Format(kind)),
            Self::PayloadTooLong(len) => defmt::write!(f, "payload too long ({}B)", len),
        }
    }
}

/// Radio operation result
pub type RadioResult<T> = Result<T, RadioError>;

/// The SPI bus shared by all transceivers, plus the delay source used for settling times
pub struct RadioBus<SPI, D> {
    spi: SPI,
    delay: D,
}

impl<SPI: SpiBus, D: DelayNs> RadioBus<SPI, D> {
    /// Wrap a bus and a delay provider
    #[must_use]
    pub const fn new(spi: SPI, delay: D) -> Self {
        Self { spi, delay }
    }

    /// Busy-wait for `us` microseconds
    pub fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    /// Busy-wait for `ms` milliseconds
    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Release the bus and delay provider
    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }
}

/// Handle to one transceiver: its CE and CSN lines
///
/// The handle owns its select line exclusively. Every operation borrows the
/// shared [`RadioBus`] mutably, so at most one transaction is in flight.
pub struct Transceiver<P> {
    id: RadioId,
    ce: P,
    csn: P,
}

impl<P: OutputPin> Transceiver<P> {
    /// Create a handle and drive the lines to their idle levels (CE low, CSN high)
    pub fn new(id: RadioId, mut ce: P, mut csn: P) -> RadioResult<Self> {
        ce.set_low().map_err(RadioError::pin)?;
        csn.set_high().map_err(RadioError::pin)?;
        Ok(Self { id, ce, csn })
    }

    /// Which slot this handle drives
    #[must_use]
    pub const fn id(&self) -> RadioId {
        self.id
    }

    /// Release the CE and CSN pins
    pub fn release(self) -> (P, P) {
        (self.ce, self.csn)
    }

    /// Run one select-framed transfer; `buf` is sent and overwritten with the reply
    fn transfer<SPI: SpiBus, D>(&mut self, bus: &mut RadioBus<SPI, D>, buf: &mut [u8]) -> RadioResult<()> {
        self.csn.set_low().map_err(RadioError::pin)?;
        let result = bus
            .spi
            .transfer_in_place(buf)
            .and_then(|()| bus.spi.flush());
        // CSN goes high even if the transfer failed so the next device can talk
        let released = self.csn.set_high();
        result.map_err(RadioError::bus)?;
        released.map_err(RadioError::pin)
    }

    /// Read one register
    pub fn read_register<SPI: SpiBus, D>(&mut self, bus: &mut RadioBus<SPI, D>, addr: u8) -> RadioResult<u8> {
        let mut buf = [read_command(addr), cmd::NOP];
        self.transfer(bus, &mut buf)?;
        Ok(buf[1])
    }

    /// Write one register
    pub fn write_register<SPI: SpiBus, D>(
        &mut self,
        bus: &mut RadioBus<SPI, D>,
        addr: u8,
        value: u8,
    ) -> RadioResult<()> {
        let mut buf = [write_command(addr), value];
        self.transfer(bus, &mut buf)
    }

    /// Read-modify-write a register: clear `clear` bits then set `set` bits
    pub fn update_register<SPI: SpiBus, D>(
        &mut self,
        bus: &mut RadioBus<SPI, D>,
        addr: u8,
        clear: u8,
        set: u8,
    ) -> RadioResult<u8> {
        let value = (self.read_register(bus, addr)? & !clear) | set;
        self.write_register(bus, addr, value)?;
        Ok(value)
    }

    /// Load a payload into the TX FIFO
    pub fn write_payload<SPI: SpiBus, D>(&mut self, bus: &mut RadioBus<SPI, D>, payload: &[u8]) -> RadioResult<()> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(RadioError::PayloadTooLong(payload.len()));
        }
        let mut buf = [0u8; MAX_PAYLOAD_LEN + 1];
        buf[0] = cmd::W_TX_PAYLOAD;
        buf[1..=payload.len()].copy_from_slice(payload);
        self.transfer(bus, &mut buf[..=payload.len()])
    }

    /// Discard everything in the TX FIFO
    pub fn flush_tx<SPI: SpiBus, D>(&mut self, bus: &mut RadioBus<SPI, D>) -> RadioResult<()> {
        self.transfer(bus, &mut [cmd::FLUSH_TX])
    }

    /// Drive the chip-enable line
    pub fn set_ce(&mut self, high: bool) -> RadioResult<()> {
        if high {
            self.ce.set_high().map_err(RadioError::pin)
        } else {
            self.ce.set_low().map_err(RadioError::pin)
        }
    }
}
