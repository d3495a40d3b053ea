//! Scanner / Jammer Main Application
//!
//! Entry point for the STM32G474-based nRF24 scanner/jammer firmware.
//! Initializes hardware, spawns the mode button task on a high priority
//! executor and runs the controller tick loop.

#![no_std]
#![no_main]

use defmt::{info, warn};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{OutputType, Pull};
use embassy_stm32::i2c::I2c;
use embassy_stm32::rng::Rng;
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::{bind_interrupts, interrupt, peripherals, rcc, rng};
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use rf_recon::drivers::display::Display;
use rf_recon::hal::gpio::{self, ModeButton};
use rf_recon::hal::pwm::RgbLed;
use rf_recon::prelude::*;

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    I2C1_EV => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
    RNG => rng::InterruptHandler<peripherals::RNG>;
});

/// Button edges, written by the button task and drained by the main loop
static TRIGGERS: TriggerSlot = TriggerSlot::new();

/// Runs the button task above thread mode so edges are stamped while a
/// blocking scan cycle is in progress
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

/// UART4 is unused on this board; its vector drives the high priority executor
#[interrupt]
unsafe fn UART4() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("RF Recon Firmware v{}", env!("CARGO_PKG_VERSION"));

    // The RNG needs the 48 MHz clock
    let mut config = embassy_stm32::Config::default();
    config.rcc.hsi48 = Some(rcc::Hsi48Config { sync_from_usb: false });
    config.rcc.mux.clk48sel = rcc::mux::Clk48sel::HSI48;
    let p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    // SPI1 shared by the three nRF24 modules (mode 0, MSB first)
    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(SPI_FREQUENCY_HZ);
    let spi = Spi::new_blocking(p.SPI1, p.PA5, p.PA7, p.PA6, spi_config);
    let bus = RadioBus::new(spi, Delay);

    let radios = [
        Transceiver::new(RadioId::new(0), gpio::chip_enable(p.PB0), gpio::chip_select(p.PB1)).unwrap(),
        Transceiver::new(RadioId::new(1), gpio::chip_enable(p.PB10), gpio::chip_select(p.PB11)).unwrap(),
        Transceiver::new(RadioId::new(2), gpio::chip_enable(p.PB12), gpio::chip_select(p.PB13)).unwrap(),
    ];

    info!("SPI1 initialized at {} Hz", SPI_FREQUENCY_HZ);

    // I2C1 for the OLED (PB8 = SCL, PB9 = SDA)
    let i2c = I2c::new(
        p.I2C1,
        p.PB8,
        p.PB9,
        Irqs,
        p.DMA1_CH1,
        p.DMA1_CH2,
        Hertz(I2C_FREQUENCY_HZ),
        Default::default(),
    );
    let mut display = Display::new(i2c);
    if let Err(err) = display.init().await {
        warn!("display init failed: {}", defmt::Debug2Format(&err));
    }

    // RGB status LED on TIM3 CH1..CH3
    let pwm = SimplePwm::new(
        p.TIM3,
        Some(PwmPin::new_ch1(p.PC6, OutputType::PushPull)),
        Some(PwmPin::new_ch2(p.PC7, OutputType::PushPull)),
        Some(PwmPin::new_ch3(p.PC8, OutputType::PushPull)),
        None,
        Hertz(LED_PWM_HZ),
        CountingMode::EdgeAlignedUp,
    );
    let mut channels = pwm.split();
    channels.ch1.enable();
    channels.ch2.enable();
    channels.ch3.enable();
    let mut led = RgbLed::new(channels.ch1, channels.ch2, channels.ch3);

    let rng = Rng::new(p.RNG, Irqs);

    // Mode button on PC13, active low
    let button = ModeButton::new(ExtiInput::new(p.PC13, p.EXTI13, Pull::Up));
    interrupt::UART4.set_priority(Priority::P6);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::UART4);
    high_spawner.spawn(button_task(button)).unwrap();

    let mut controller = Controller::new(bus, radios, &TRIGGERS, rng);

    info!("Tasks spawned, entering main loop");

    loop {
        let outcome = controller.tick(gpio::now(), &mut display, &mut led);
        if display.is_dirty() {
            if let Err(err) = display.flush().await {
                warn!("display flush failed: {}", defmt::Debug2Format(&err));
            }
        }
        Timer::after(Duration::from_millis(outcome.pause_ms())).await;
    }
}

/// Mode button task - records presses for the main loop
#[embassy_executor::task]
async fn button_task(mut button: ModeButton<'static>) {
    button.run(&TRIGGERS).await
}
