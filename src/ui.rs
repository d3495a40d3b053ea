//! User Interface
//!
//! Screen model and output sinks for the display and the status LED.
//!
//! The controller never draws pixels itself: it builds a [`Screen`] and hands
//! it to a [`DisplaySink`], and picks a colour for a [`LedSink`]. On target
//! those are the SSD1306 renderer and the PWM RGB LED; tests use recorders.

use core::fmt::Write;

use heapless::String;

use crate::config::{LED_BRIGHTNESS, RADIO_COUNT};
use crate::radio::scanner::BarHistory;
use crate::types::{OperationMode, RadioId, Rgb};

/// What the display should show
pub enum Screen<'a> {
    /// Scrolling occupancy graph with a status line
    Spectrum {
        /// Status text drawn above the graph
        status: &'a str,
        /// Bar heights, oldest first
        bars: &'a BarHistory,
    },
    /// Mode name and per-radio connection state
    Jammer {
        /// Mode being shown
        mode: OperationMode,
        /// Whether each radio took part in provisioning
        radios: [bool; RADIO_COUNT],
    },
}

/// Consumer of rendered screens
pub trait DisplaySink {
    /// Redraw the whole display from `screen`
    fn render(&mut self, screen: &Screen<'_>);
}

/// Consumer of status LED updates
pub trait LedSink {
    /// Show `color` scaled by `brightness` (255 = full)
    fn show(&mut self, color: Rgb, brightness: u8);
}

/// Short status text (`"Packets: 42"`)
pub type StatusLine = String<24>;

/// Status line shown above the spectrum graph
#[must_use]
pub fn status_line(total: u32) -> StatusLine {
    let mut s = StatusLine::new();
    // 24 bytes always fit "Packets: " plus a u32
    write!(s, "Packets: {total}").ok();
    s
}

/// Mode line shown on the jammer screen
#[must_use]
pub fn mode_line(mode: OperationMode) -> StatusLine {
    let mut s = StatusLine::new();
    write!(s, "Mode : {}", mode.label()).ok();
    s
}

/// Connection line for one radio (`"NRF 2: No"`)
#[must_use]
pub fn radio_line(id: RadioId, present: bool) -> StatusLine {
    let mut s = StatusLine::new();
    write!(s, "NRF {}: {}", id.number(), if present { "Yes" } else { "No" }).ok();
    s
}

/// LED colour for a mode; the scanner lights up only when it saw activity
#[must_use]
pub const fn led_color(mode: OperationMode, last_total: u32) -> Rgb {
    match mode {
        OperationMode::Inactive => Rgb::IDLE,
        OperationMode::ScanOnly if last_total == 0 => Rgb::IDLE,
        OperationMode::ScanOnly | OperationMode::ModeA | OperationMode::ModeB => Rgb::ACTIVE,
    }
}

/// Tracks whether the display must be redrawn
#[derive(Clone, Copy, Debug)]
pub struct UiState {
    needs_update: bool,
    brightness: u8,
}

impl UiState {
    /// Create UI state with a pending initial redraw
    #[must_use]
    pub const fn new() -> Self {
        Self {
            needs_update: true,
            brightness: LED_BRIGHTNESS,
        }
    }

    /// Check if display needs update
    #[must_use]
    pub const fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Mark as updated
    pub fn mark_updated(&mut self) {
        self.needs_update = false;
    }

    /// Force update
    pub fn invalidate(&mut self) {
        self.needs_update = true;
    }

    /// LED brightness
    #[must_use]
    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Set LED brightness
    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
