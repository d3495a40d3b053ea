//! Application Controller
//!
//! Owns every radio resource and runs the main-loop tick:
//!
//! 1. drain the trigger slot and, if a press was accepted, re-provision the
//!    radios for the new mode;
//! 2. do one unit of work for the current mode (a full scan cycle, one jam
//!    tick, or nothing);
//! 3. publish to the display and LED sinks.
//!
//! A scan cycle is never interrupted: a press that arrives mid-sweep waits
//! in the slot until the next tick. Radio errors are logged and the tick
//! carries on with what it has.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use rand_core::RngCore;

use crate::config::{IDLE_TICK_DELAY_MS, RADIO_COUNT, SCAN_FRAME_DELAY_MS};
use crate::drivers::nrf24::{RadioBus, Transceiver};
use crate::radio::jammer::JamCoordinator;
use crate::radio::mode::{entry_provision, ModeStateMachine, Provision, TriggerSlot};
use crate::radio::scanner::{ChannelScanner, ScanConfig, ScanReport};
use crate::types::{Channel, Millis, OperationMode};
use crate::ui::{led_color, status_line, DisplaySink, LedSink, Screen, UiState};

/// What a tick did, and how long the main loop should pause afterwards
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to do (inactive)
    Idle,
    /// A scan cycle completed and a frame was drawn
    ScanFrame(ScanReport),
    /// A jam tick ran; carries the channel the radios were retuned to, if any
    Jammed(Option<Channel>),
}

impl TickOutcome {
    /// Pause before the next tick
    #[must_use]
    pub const fn pause_ms(self) -> u64 {
        match self {
            Self::ScanFrame(_) => SCAN_FRAME_DELAY_MS,
            Self::Idle | Self::Jammed(_) => IDLE_TICK_DELAY_MS,
        }
    }
}

/// The scanner/jammer application
pub struct Controller<'t, SPI, D, P, R> {
    bus: RadioBus<SPI, D>,
    radios: [Transceiver<P>; RADIO_COUNT],
    scanner: ChannelScanner,
    jammer: JamCoordinator,
    modes: ModeStateMachine,
    triggers: &'t TriggerSlot,
    rng: R,
    ui: UiState,
    connected: [bool; RADIO_COUNT],
    scan_radio_ready: bool,
    last_total: u32,
}

impl<'t, SPI, D, P, R> Controller<'t, SPI, D, P, R>
where
    SPI: SpiBus,
    D: DelayNs,
    P: OutputPin,
    R: RngCore,
{
    /// Build the controller with the default scanner and mode profiles
    ///
    /// Starts in [`OperationMode::Inactive`] with every radio parked.
    pub fn new(
        bus: RadioBus<SPI, D>,
        radios: [Transceiver<P>; RADIO_COUNT],
        triggers: &'t TriggerSlot,
        rng: R,
    ) -> Self {
        Self::with_parts(
            bus,
            radios,
            triggers,
            rng,
            ChannelScanner::new(ScanConfig::default()),
            ModeStateMachine::new(),
        )
    }

    /// Build the controller from explicit scanner and mode machine
    pub fn with_parts(
        bus: RadioBus<SPI, D>,
        radios: [Transceiver<P>; RADIO_COUNT],
        triggers: &'t TriggerSlot,
        rng: R,
        scanner: ChannelScanner,
        modes: ModeStateMachine,
    ) -> Self {
        let mut controller = Self {
            bus,
            radios,
            scanner,
            jammer: JamCoordinator::new(),
            modes,
            triggers,
            rng,
            ui: UiState::new(),
            connected: [false; RADIO_COUNT],
            scan_radio_ready: false,
            last_total: 0,
        };
        let entry = entry_provision(controller.modes.mode());
        controller.provision(entry);
        controller
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> OperationMode {
        self.modes.mode()
    }

    /// Scanner state (table, history, last report)
    #[must_use]
    pub const fn scanner(&self) -> &ChannelScanner {
        &self.scanner
    }

    /// Jam coordinator state
    #[must_use]
    pub const fn jammer(&self) -> &JamCoordinator {
        &self.jammer
    }

    /// Connection state shown on the display, per radio
    #[must_use]
    pub const fn connected(&self) -> [bool; RADIO_COUNT] {
        self.connected
    }

    /// Total detections of the last scan cycle
    #[must_use]
    pub const fn last_total(&self) -> u32 {
        self.last_total
    }

    /// UI state (redraw flag, LED brightness)
    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    /// Run one main-loop iteration
    pub fn tick<DS, LS>(&mut self, now: Millis, display: &mut DS, led: &mut LS) -> TickOutcome
    where
        DS: DisplaySink + ?Sized,
        LS: LedSink + ?Sized,
    {
        if let Some(at) = self.triggers.take() {
            if let Some(step) = self.modes.on_trigger(at) {
                self.provision(step.provision);
            }
        }

        let mode = self.modes.mode();
        let outcome = match mode {
            OperationMode::Inactive => TickOutcome::Idle,
            OperationMode::ScanOnly => TickOutcome::ScanFrame(self.scan_cycle()),
            OperationMode::ModeA | OperationMode::ModeB => {
                match self.jammer.tick(&mut self.radios, &mut self.bus, &mut self.rng, now) {
                    Ok(channel) => TickOutcome::Jammed(channel),
                    Err(err) => {
                        warn!("jam tick failed: {}", err);
                        TickOutcome::Jammed(None)
                    }
                }
            }
        };

        self.publish(mode, display, led);
        outcome
    }

    /// Put the radios into the state a mode needs
    fn provision(&mut self, provision: Provision) {
        match provision {
            Provision::Neutral => {
                self.jammer.release(&mut self.radios, &mut self.bus);
                self.scan_radio_ready = false;
                self.probe_all();
            }
            Provision::Scanner => {
                self.last_total = 0;
                self.scan_radio_ready = self.prepare_scanner();
                self.connected = [false; RADIO_COUNT];
                self.connected[0] = self.scan_radio_ready;
            }
            Provision::Jammer(slot) => {
                self.scan_radio_ready = false;
                let profile = self.modes.profile(slot);
                let active = self.jammer.provision(&mut self.radios, &mut self.bus, profile);
                self.connected = active.as_array();
            }
        }
        self.ui.invalidate();
    }

    fn prepare_scanner(&mut self) -> bool {
        let radio = &mut self.radios[0];
        match radio.is_present(&mut self.bus) {
            Ok(true) => {}
            Ok(false) => {
                info!("{} not connected, scanning disabled", radio.id());
                return false;
            }
            Err(err) => {
                warn!("{} probe failed: {}", radio.id(), err);
                return false;
            }
        }
        match self.scanner.prepare(radio, &mut self.bus) {
            Ok(()) => true,
            Err(err) => {
                warn!("{} scanner setup failed: {}", radio.id(), err);
                false
            }
        }
    }

    fn probe_all(&mut self) {
        for (radio, connected) in self.radios.iter_mut().zip(self.connected.iter_mut()) {
            *connected = match radio.is_present(&mut self.bus) {
                Ok(present) => present,
                Err(err) => {
                    warn!("{} probe failed: {}", radio.id(), err);
                    false
                }
            };
            info!("{} connected: {}", radio.id(), *connected);
        }
    }

    /// One full scan cycle; an absent or failing radio yields an all-zero frame
    fn scan_cycle(&mut self) -> ScanReport {
        let report = if self.scan_radio_ready {
            match self.scanner.cycle(&mut self.radios[0], &mut self.bus, &mut self.rng) {
                Ok(report) => report,
                Err(err) => {
                    warn!("scan cycle failed: {}", err);
                    self.scanner.idle_cycle(&mut self.rng)
                }
            }
        } else {
            self.scanner.idle_cycle(&mut self.rng)
        };
        self.last_total = report.total;
        report
    }

    fn publish<DS, LS>(&mut self, mode: OperationMode, display: &mut DS, led: &mut LS)
    where
        DS: DisplaySink + ?Sized,
        LS: LedSink + ?Sized,
    {
        if mode == OperationMode::ScanOnly {
            let status = status_line(self.last_total);
            display.render(&Screen::Spectrum {
                status: &status,
                bars: self.scanner.history(),
            });
            self.ui.mark_updated();
        } else if self.ui.needs_update() {
            display.render(&Screen::Jammer {
                mode,
                radios: self.connected,
            });
            self.ui.mark_updated();
        }

        led.show(led_color(mode, self.last_total), self.ui.brightness());
    }
}
