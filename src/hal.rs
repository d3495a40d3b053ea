//! Hardware Abstraction Layer
//!
//! Provides safe abstractions over STM32G474 peripherals.
//! The PWM LED driver is generic over embedded-hal and builds on the host;
//! the GPIO and I2C wrappers use embassy-stm32 directly.

#[cfg(feature = "embedded")]
pub mod gpio;
#[cfg(feature = "embedded")]
pub mod i2c;
pub mod pwm;
