//! GPIO Abstractions
//!
//! Type-safe GPIO pin wrappers for the scanner/jammer board.
//! Provides semantic meaning to pins through the type system.

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Pin, Speed};
use embassy_stm32::Peripheral;
use embassy_time::Instant;

use crate::radio::mode::TriggerSlot;
use crate::types::Millis;

/// Create a transceiver chip-enable line (idles low)
#[must_use]
pub fn chip_enable<'d>(pin: impl Peripheral<P = impl Pin> + 'd) -> Output<'d> {
    Output::new(pin, Level::Low, Speed::VeryHigh)
}

/// Create a transceiver chip-select line (idles high)
#[must_use]
pub fn chip_select<'d>(pin: impl Peripheral<P = impl Pin> + 'd) -> Output<'d> {
    Output::new(pin, Level::High, Speed::VeryHigh)
}

/// Current uptime as a [`Millis`] timestamp
#[must_use]
pub fn now() -> Millis {
    // Truncation is fine: Millis differences use wrapping arithmetic
    Millis::new(Instant::now().as_millis() as u32)
}

/// Mode button (active low with pull-up, falling-edge interrupt)
pub struct ModeButton<'d> {
    pin: ExtiInput<'d>,
}

impl<'d> ModeButton<'d> {
    /// Wrap an EXTI input
    #[must_use]
    pub fn new(pin: ExtiInput<'d>) -> Self {
        Self { pin }
    }

    /// Check if the button is held down
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.pin.is_low()
    }

    /// Wait for the next press and return its timestamp
    ///
    /// The stamp is taken when this task is polled after the edge, so it
    /// must run on an executor that preempts the main loop.
    pub async fn wait_press(&mut self) -> Millis {
        self.pin.wait_for_falling_edge().await;
        now()
    }

    /// Forward every press to `slot`, forever
    ///
    /// Only records the edge; debouncing and the mode change happen on the
    /// main loop when it drains the slot.
    pub async fn run(&mut self, slot: &TriggerSlot) -> ! {
        loop {
            let at = self.wait_press().await;
            slot.notify(at);
        }
    }
}
