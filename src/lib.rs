//! 2.4 GHz Scanner / Jammer Firmware Library
//!
//! This library provides the core functionality for an STM32G474-based
//! handheld that drives up to three nRF24L01(+) transceivers on one SPI bus.
//! It sweeps the 2.4 GHz band to estimate channel occupancy and drives the
//! transceivers in coordinated jamming patterns against fixed channel sets
//! (BLE advertising channels, the classic Bluetooth hop set).
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Controller (tick)  │  Mode State Machine  │  UI model       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     RADIO LOGIC                              │
//! │  Channel Scanner  │  Jam Coordinator  │  Jam Profiles        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  nRF24 link + power  │  SSD1306  │  RGB LED  │  Button       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Owned state**: the scanner owns its table and history, the jam
//!   coordinator owns its active set; nothing is global except the trigger slot
//! - **Type-driven design**: Custom types enforce invariants at compile time
//! - **No unsafe in application code**: All unsafe isolated in HAL layers
//! - **Functional core, imperative shell**: the radio logic is generic over
//!   embedded-hal traits and tested on the host
//! - **Explicit error handling**: All fallible operations return `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Must come first so the logging macros are visible in every module
#[macro_use]
mod fmt;

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// Safe wrappers over STM32G474 peripherals and the PWM LED driver.
pub mod hal;

/// Peripheral Drivers
///
/// nRF24L01(+) register link and the OLED display.
pub mod drivers;

/// Radio Control Logic
///
/// Channel scanner, jam coordinator and mode state machine.
pub mod radio;

/// Application controller (main-loop tick)
pub mod app;

/// User Interface
///
/// Screen model and display/LED sink traits.
pub mod ui;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::app::{Controller, TickOutcome};
    pub use crate::config::*;
    pub use crate::drivers::nrf24::{RadioBus, RadioError, RadioResult, Transceiver};
    pub use crate::radio::jammer::{JamCoordinator, JamProfile};
    pub use crate::radio::mode::{ModeStateMachine, TriggerSlot};
    pub use crate::radio::scanner::{ChannelScanner, ScanConfig};
    pub use crate::types::*;
    pub use crate::ui::{DisplaySink, LedSink, Screen};

    // Common traits
    pub use embedded_hal::digital::OutputPin;

    // Embassy
    #[cfg(feature = "embedded")]
    pub use embassy_time::{Duration, Instant, Timer};

    // Error handling
    pub use core::result::Result;
}
