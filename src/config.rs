//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the scanner/jammer hardware.
//! All pin mappings, bus speeds, timing and channel tables are centralized here.

use crate::types::{Channel, ScanResolution};

/// System clock frequency (STM32G474 @ 170MHz)
pub const SYSTEM_CLOCK_HZ: u32 = 170_000_000;

/// SPI bus frequency shared by all nRF24 modules
pub const SPI_FREQUENCY_HZ: u32 = 8_000_000;

/// I2C bus frequency for the display
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

/// SSD1306 OLED I2C address
pub const DISPLAY_I2C_ADDR: u8 = 0x3C;

/// Display width in pixels
pub const DISPLAY_WIDTH: usize = 128;

/// Display height in pixels
pub const DISPLAY_HEIGHT: u32 = 64;

/// First pixel row of the spectrum graph (status line sits above it)
pub const GRAPH_TOP: u32 = 12;

/// Height of the spectrum graph in pixels
pub const GRAPH_HEIGHT: u8 = (DISPLAY_HEIGHT - GRAPH_TOP) as u8;

/// Number of nRF24 modules on the board
pub const RADIO_COUNT: usize = 3;

/// Status LED PWM frequency
pub const LED_PWM_HZ: u32 = 1_000;

/// Status LED brightness (full scale)
pub const LED_BRIGHTNESS: u8 = 255;

/// Settling time after setting `PWR_UP` (Tpd2stby, external crystal)
pub const POWER_UP_SETTLE_US: u32 = 1_500;

/// Settling time after raising CE in receive mode
pub const RX_SETTLE_US: u32 = 100;

/// Time spent listening on each channel before sampling RPD
pub const CHANNEL_DWELL_US: u32 = 40;

/// CE high time that starts a single payload transmission (min 10us)
pub const TX_PULSE_US: u32 = 15;

/// Delay after parking all radios on the neutral channel
pub const NEUTRAL_SETTLE_MS: u32 = 100;

/// Scanner passes per cycle
pub const SCAN_PASSES: u8 = 25;

/// Default sweep resolution
pub const SCAN_RESOLUTION: ScanResolution = ScanResolution::Coarse;

/// Pause after a spectrum frame before the next cycle
pub const SCAN_FRAME_DELAY_MS: u64 = 30;

/// Pause between jam and idle ticks
pub const IDLE_TICK_DELAY_MS: u64 = 1;

/// Wide-hop step interval
pub const HOP_INTERVAL_MS: u32 = 10;

/// Mode button debounce window
pub const BUTTON_DEBOUNCE_MS: u32 = 500;

/// Filler payload sent on every wide-hop step
pub const FILLER_PAYLOAD: &[u8] = b"xxxxxxxxxxxxxxxx";

/// Channel every radio is parked on while inactive
pub const NEUTRAL_CHANNEL: Channel = Channel::of(0);

/// Channel tables for the jam profiles
pub mod channels {
    //! Fixed channel sets, as `RF_CH` register values

    use crate::types::Channel;

    /// BLE advertising channels 37, 38 and 39 (2402, 2426, 2480 MHz)
    pub const BLE_ADVERTISING: &[Channel] = &[Channel::of(2), Channel::of(26), Channel::of(80)];

    /// Classic Bluetooth hop set, stepped in this order by the wide-hop pattern
    pub const CLASSIC_HOP: &[Channel] = &[
        Channel::of(32),
        Channel::of(34),
        Channel::of(46),
        Channel::of(48),
        Channel::of(50),
        Channel::of(52),
        Channel::of(0),
        Channel::of(1),
        Channel::of(2),
        Channel::of(4),
        Channel::of(6),
        Channel::of(8),
        Channel::of(22),
        Channel::of(24),
        Channel::of(26),
        Channel::of(28),
        Channel::of(30),
        Channel::of(74),
        Channel::of(76),
        Channel::of(78),
        Channel::of(80),
    ];

    /// Group assigned to radio 1 in multi-radio profiles
    pub const GROUP_1: &[Channel] = &[Channel::of(2), Channel::of(5), Channel::of(8), Channel::of(11)];

    /// Group assigned to radio 2 in multi-radio profiles
    pub const GROUP_2: &[Channel] = &[Channel::of(26), Channel::of(29), Channel::of(32), Channel::of(35)];

    /// Group assigned to radio 3 in multi-radio profiles
    pub const GROUP_3: &[Channel] = &[Channel::of(80), Channel::of(83), Channel::of(86), Channel::of(89)];
}

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// SPI1 clock (shared by all nRF24 modules)
    pub const SPI_SCK: &str = "PA5";

    /// SPI1 MISO
    pub const SPI_MISO: &str = "PA6";

    /// SPI1 MOSI
    pub const SPI_MOSI: &str = "PA7";

    /// Radio 1 chip enable
    pub const RADIO1_CE: &str = "PB0";

    /// Radio 1 chip select (active low)
    pub const RADIO1_CSN: &str = "PB1";

    /// Radio 2 chip enable
    pub const RADIO2_CE: &str = "PB10";

    /// Radio 2 chip select (active low)
    pub const RADIO2_CSN: &str = "PB11";

    /// Radio 3 chip enable
    pub const RADIO3_CE: &str = "PB12";

    /// Radio 3 chip select (active low)
    pub const RADIO3_CSN: &str = "PB13";

    /// Mode button (active low, EXTI falling edge)
    pub const MODE_BUTTON: &str = "PC13";

    /// I2C1 SCL (display)
    pub const I2C1_SCL: &str = "PB8";

    /// I2C1 SDA (display)
    pub const I2C1_SDA: &str = "PB9";

    /// Status LED red (TIM3 CH1)
    pub const LED_RED: &str = "PC6";

    /// Status LED green (TIM3 CH2)
    pub const LED_GREEN: &str = "PC7";

    /// Status LED blue (TIM3 CH3)
    pub const LED_BLUE: &str = "PC8";
}
