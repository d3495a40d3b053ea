//! OLED Display Driver
//!
//! Frame buffer and screen rendering for the 128x64 SSD1306 OLED.
//!
//! [`DisplayBuffer`] is a plain 1-bit frame buffer that implements the
//! embedded-graphics `DrawTarget` and the [`DisplaySink`] contract, so
//! screens can be rendered and inspected on the host. [`Display`] pushes the
//! buffer to the panel over I2C and is only built for the target.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};
use embedded_graphics::text::{Baseline, Text};

use crate::config::{DISPLAY_HEIGHT, DISPLAY_WIDTH, GRAPH_TOP};
use crate::radio::scanner::BarHistory;
use crate::types::{OperationMode, RadioId};
use crate::ui::{mode_line, radio_line, DisplaySink, Screen};

#[cfg(feature = "embedded")]
use crate::hal::i2c::{I2cAddress, I2cBus, I2cResult};
#[cfg(feature = "embedded")]
use embassy_stm32::i2c::I2c;
#[cfg(feature = "embedded")]
use embassy_stm32::mode::Async;

const WIDTH: u32 = DISPLAY_WIDTH as u32;
const BUFFER_LEN: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT as usize / 8;

/// First row of each radio line on the jammer screen
const RADIO_ROWS: [i32; 3] = [16, 28, 40];

/// SSD1306 power-on configuration for a 128x64 panel, sent as one command stream
#[cfg(feature = "embedded")]
const INIT_SEQUENCE: &[u8] = &[
    0xAE, // off while configuring
    0xD5, 0x80, // clock divide / oscillator
    0xA8, 0x3F, // multiplex: 64 rows
    0xD3, 0x00, // no vertical offset
    0x40, // start line 0
    0x8D, 0x14, // charge pump on
    0x20, 0x00, // horizontal addressing
    0xA1, // column 127 mapped to SEG0
    0xC8, // COM scan from the bottom
    0xDA, 0x12, // alternative COM pin layout
    0x81, 0xCF, // contrast
    0xD9, 0xF1, // pre-charge
    0xDB, 0x40, // VCOMH level
    0xA4, // follow RAM
    0xA6, // not inverted
    0xAF, // on
];

/// Column range 0..=127, page range 0..=7
#[cfg(feature = "embedded")]
const FULL_WINDOW: [u8; 6] = [0x21, 0, (WIDTH - 1) as u8, 0x22, 0, (DISPLAY_HEIGHT / 8 - 1) as u8];

/// Display buffer (1 bit per pixel, SSD1306 page layout)
pub struct DisplayBuffer {
    buffer: [u8; BUFFER_LEN],
}

impl DisplayBuffer {
    /// Create a new empty display buffer
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: [0; BUFFER_LEN] }
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    /// Byte index and bit mask of a pixel, None outside the panel
    ///
    /// Each byte holds a vertical strip of 8 pixels; byte `n` of page `p`
    /// covers column `n`, rows `8p..8p+8`, LSB on top.
    fn locate(x: u32, y: u32) -> Option<(usize, u8)> {
        (x < WIDTH && y < DISPLAY_HEIGHT).then(|| ((y / 8 * WIDTH + x) as usize, 1 << (y % 8)))
    }

    /// Set a pixel (ignored outside the panel)
    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        if let Some((index, mask)) = Self::locate(x, y) {
            if on {
                self.buffer[index] |= mask;
            } else {
                self.buffer[index] &= !mask;
            }
        }
    }

    /// Read a pixel (off outside the panel)
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        Self::locate(x, y).is_some_and(|(index, mask)| self.buffer[index] & mask != 0)
    }

    /// Number of lit pixels in column `x` between `top` and the bottom edge
    #[must_use]
    pub fn column_fill(&self, x: u32, top: u32) -> u32 {
        (top..DISPLAY_HEIGHT).filter(|&y| self.pixel(x, y)).count() as u32
    }

    /// Get the raw buffer
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Implement `DrawTarget` for embedded-graphics
impl DrawTarget for DisplayBuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(coord.x), u32::try_from(coord.y)) {
                self.set_pixel(x, y, color.is_on());
            }
        }
        Ok(())
    }
}

impl OriginDimensions for DisplayBuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH, DISPLAY_HEIGHT)
    }
}

impl DisplaySink for DisplayBuffer {
    fn render(&mut self, screen: &Screen<'_>) {
        self.clear();
        match screen {
            Screen::Spectrum { status, bars } => ScreenRenderer::render_spectrum(self, status, bars),
            Screen::Jammer { mode, radios } => ScreenRenderer::render_jammer(self, *mode, radios),
        }
    }
}

/// Draws the screens onto a display buffer
pub struct ScreenRenderer;

impl ScreenRenderer {
    /// Status line on top, one bar per column growing up from the bottom edge
    pub fn render_spectrum(buffer: &mut DisplayBuffer, status: &str, bars: &BarHistory) {
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let _ = Text::with_baseline(status, Point::zero(), style, Baseline::Top).draw(buffer);

        let bottom = DISPLAY_HEIGHT as i32 - 1;
        let max_height = (DISPLAY_HEIGHT - GRAPH_TOP) as i32;
        let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);

        for (x, height) in bars.iter().enumerate() {
            let height = i32::from(height).min(max_height);
            if height == 0 {
                continue;
            }
            let x = x as i32;
            let _ = Line::new(Point::new(x, bottom), Point::new(x, bottom + 1 - height))
                .into_styled(stroke)
                .draw(buffer);
        }
    }

    /// Mode name followed by one connection line per radio
    pub fn render_jammer(buffer: &mut DisplayBuffer, mode: OperationMode, radios: &[bool]) {
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let _ = Text::with_baseline(&mode_line(mode), Point::zero(), style, Baseline::Top).draw(buffer);

        for ((slot, &present), &y) in radios.iter().enumerate().zip(RADIO_ROWS.iter()) {
            let line = radio_line(RadioId::new(slot as u8), present);
            let _ = Text::with_baseline(&line, Point::new(0, y), style, Baseline::Top).draw(buffer);
        }
    }
}

/// OLED display driver
#[cfg(feature = "embedded")]
pub struct Display<'d> {
    bus: I2cBus<'d>,
    buffer: DisplayBuffer,
    dirty: bool,
}

#[cfg(feature = "embedded")]
impl<'d> Display<'d> {
    /// Create a new display driver
    #[must_use]
    pub fn new(i2c: I2c<'d, Async>) -> Self {
        Self {
            bus: I2cBus::new(i2c),
            buffer: DisplayBuffer::new(),
            dirty: false,
        }
    }

    /// Probe the panel, configure it and blank it
    pub async fn init(&mut self) -> I2cResult<()> {
        if !self.bus.probe(I2cAddress::SSD1306).await {
            warn!("no display at {}", I2cAddress::SSD1306);
        }
        self.bus.command(I2cAddress::SSD1306, INIT_SEQUENCE).await?;

        self.buffer.clear();
        self.dirty = true;
        self.flush().await
    }

    /// True if the buffer changed since the last flush
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Push the whole buffer to the panel
    pub async fn flush(&mut self) -> I2cResult<()> {
        self.bus.command(I2cAddress::SSD1306, &FULL_WINDOW).await?;
        self.bus.data(I2cAddress::SSD1306, self.buffer.as_bytes()).await?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(feature = "embedded")]
impl DisplaySink for Display<'_> {
    fn render(&mut self, screen: &Screen<'_>) {
        self.buffer.render(screen);
        self.dirty = true;
    }
}
