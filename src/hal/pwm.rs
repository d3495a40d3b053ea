//! PWM Driver
//!
//! Drives the RGB status LED from three PWM channels.
//! Generic over the embedded-hal `SetDutyCycle` trait so it runs on the
//! embassy timer channels and against test doubles alike.

use embedded_hal::pwm::SetDutyCycle;

use crate::types::Rgb;
use crate::ui::LedSink;

/// PWM duty cycle (0-65535)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DutyCycle(u16);

impl DutyCycle {
    /// 0% duty cycle
    pub const ZERO: Self = Self(0);

    /// 100% duty cycle
    pub const FULL: Self = Self(65535);

    /// Create from 16-bit value
    #[must_use]
    pub const fn from_raw(value: u16) -> Self {
        Self(value)
    }

    /// Create from an 8-bit level (0-255)
    #[must_use]
    pub const fn from_level(level: u8) -> Self {
        // 255 * 257 == 65535
        Self(level as u16 * 257)
    }

    /// Get raw 16-bit value
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Get as percentage
    #[must_use]
    pub fn as_percent(self) -> u8 {
        ((u32::from(self.0) * 100) / 65535) as u8
    }

    /// Scale by another duty cycle
    #[must_use]
    pub fn scale(self, other: Self) -> Self {
        let product = (u32::from(self.0) * u32::from(other.0)) / 65535;
        Self(product as u16)
    }

    /// Express as a fraction of a channel's `max` duty
    #[must_use]
    pub fn of_max(self, max: u16) -> u16 {
        ((u32::from(self.0) * u32::from(max)) / 65535) as u16
    }
}

impl Default for DutyCycle {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DutyCycle {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}%", self.as_percent());
    }
}

/// RGB LED on three PWM channels (common cathode, high = on)
pub struct RgbLed<C> {
    red: C,
    green: C,
    blue: C,
    color: Rgb,
    brightness: u8,
}

impl<C: SetDutyCycle> RgbLed<C> {
    /// Create an RGB LED driver and switch it off
    pub fn new(red: C, green: C, blue: C) -> Self {
        let mut led = Self {
            red,
            green,
            blue,
            color: Rgb::OFF,
            brightness: 0,
        };
        Self::drive(&mut led.red, DutyCycle::ZERO);
        Self::drive(&mut led.green, DutyCycle::ZERO);
        Self::drive(&mut led.blue, DutyCycle::ZERO);
        led
    }

    /// Duty cycle for one colour component at a brightness
    #[must_use]
    pub fn duty_for(component: u8, brightness: u8) -> DutyCycle {
        DutyCycle::from_level(component).scale(DutyCycle::from_level(brightness))
    }

    /// Last colour shown
    #[must_use]
    pub const fn color(&self) -> Rgb {
        self.color
    }

    /// Last brightness shown
    #[must_use]
    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Switch the LED off
    pub fn off(&mut self) {
        self.show(Rgb::OFF, 0);
    }

    fn drive(channel: &mut C, duty: DutyCycle) {
        let max = channel.max_duty_cycle();
        if channel.set_duty_cycle(duty.of_max(max)).is_err() {
            warn!("led duty update failed");
        }
    }
}

impl<C: SetDutyCycle> LedSink for RgbLed<C> {
    fn show(&mut self, color: Rgb, brightness: u8) {
        if color == self.color && brightness == self.brightness {
            return;
        }
        Self::drive(&mut self.red, Self::duty_for(color.r, brightness));
        Self::drive(&mut self.green, Self::duty_for(color.g, brightness));
        Self::drive(&mut self.blue, Self::duty_for(color.b, brightness));
        self.color = color;
        self.brightness = brightness;
    }
}
