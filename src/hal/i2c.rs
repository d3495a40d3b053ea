//! I2C Bus Abstractions
//!
//! Async I2C access for the OLED display, using the embassy-stm32 DMA driver.
//! SSD1306 transfers start with a control byte that says whether the rest
//! is a command stream or display RAM data; [`I2cBus::command`] and
//! [`I2cBus::data`] add it.

use embassy_stm32::i2c::{Error as I2cError, I2c};
use embassy_stm32::mode::Async;

use crate::config::DISPLAY_I2C_ADDR;

/// I2C operation result
pub type I2cResult<T> = Result<T, I2cError>;

/// Largest payload sent in one data transfer
pub const DATA_CHUNK: usize = 32;

/// Control byte: the following bytes are commands
const CONTROL_COMMAND: u8 = 0x00;

/// Control byte: the following bytes go to display RAM
const CONTROL_DATA: u8 = 0x40;

/// 7-bit I2C device address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct I2cAddress(u8);

impl I2cAddress {
    /// SSD1306 OLED display address
    pub const SSD1306: Self = Self::new(DISPLAY_I2C_ADDR);

    /// Create from a 7-bit address (upper bit dropped)
    #[must_use]
    pub const fn new(addr: u8) -> Self {
        Self(addr & 0x7F)
    }

    /// Get the 7-bit address
    #[must_use]
    pub const fn addr(self) -> u8 {
        self.0
    }
}

impl defmt::Format for I2cAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:02X}", self.0);
    }
}

/// The display's I2C peripheral
pub struct I2cBus<'d> {
    i2c: I2c<'d, Async>,
}

impl<'d> I2cBus<'d> {
    /// Wrap an async I2C peripheral
    #[must_use]
    pub fn new(i2c: I2c<'d, Async>) -> Self {
        Self { i2c }
    }

    /// Send a command stream, split into [`DATA_CHUNK`]-byte transfers
    pub async fn command(&mut self, addr: I2cAddress, commands: &[u8]) -> I2cResult<()> {
        for chunk in commands.chunks(DATA_CHUNK) {
            self.prefixed(addr, CONTROL_COMMAND, chunk).await?;
        }
        Ok(())
    }

    /// Send display RAM data, split into [`DATA_CHUNK`]-byte transfers
    pub async fn data(&mut self, addr: I2cAddress, bytes: &[u8]) -> I2cResult<()> {
        for chunk in bytes.chunks(DATA_CHUNK) {
            self.prefixed(addr, CONTROL_DATA, chunk).await?;
        }
        Ok(())
    }

    async fn prefixed(&mut self, addr: I2cAddress, control: u8, chunk: &[u8]) -> I2cResult<()> {
        let mut frame = [0u8; DATA_CHUNK + 1];
        frame[0] = control;
        frame[1..=chunk.len()].copy_from_slice(chunk);
        self.i2c.write(addr.addr(), &frame[..=chunk.len()]).await
    }

    /// Check whether a device acknowledges a one-byte read
    pub async fn probe(&mut self, addr: I2cAddress) -> bool {
        let mut byte = [0u8; 1];
        self.i2c.read(addr.addr(), &mut byte).await.is_ok()
    }
}
