//! Simulated nRF24 board shared by the behavioural tests
//!
//! Three register files behind one SPI bus. Each chip decodes the command
//! byte, tracks its CE line, and latches RPD when CE falls after listening
//! on a channel the test marked as busy. A delay provider advances a shared
//! clock so tests can check settling times.

#![allow(dead_code)]

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::spi::{ErrorKind, ErrorType as SpiErrorType, SpiBus};

use rf_recon::drivers::nrf24::{reg, RadioBus, Transceiver};
use rf_recon::types::{Millis, OperationMode, RadioId, Rgb};
use rf_recon::ui::{DisplaySink, LedSink, Screen};

pub const CHIPS: usize = 3;

/// One simulated transceiver
#[derive(Clone, Debug)]
pub struct Chip {
    pub present: bool,
    pub fail_spi: bool,
    pub regs: [u8; 32],
    pub ce: bool,
    pub ce_rose_at_ns: u64,
    pub last_listen_ns: u64,
    pub rpd: bool,
    pub busy: Vec<u8>,
    pub tuned: Vec<u8>,
    pub payloads: Vec<Vec<u8>>,
    pub tx_flushes: usize,
    pub transfers: usize,
}

impl Chip {
    fn new(present: bool) -> Self {
        let mut regs = [0u8; 32];
        regs[reg::CONFIG as usize] = 0x08;
        regs[reg::EN_AA as usize] = 0x3F;
        regs[reg::SETUP_AW as usize] = 0x03;
        regs[reg::SETUP_RETR as usize] = 0x03;
        regs[reg::RF_CH as usize] = 0x02;
        regs[reg::RF_SETUP as usize] = 0x0E;
        regs[reg::STATUS as usize] = 0x0E;
        Self {
            present,
            fail_spi: false,
            regs,
            ce: false,
            ce_rose_at_ns: 0,
            last_listen_ns: 0,
            rpd: false,
            busy: Vec::new(),
            tuned: Vec::new(),
            payloads: Vec::new(),
            tx_flushes: 0,
            transfers: 0,
        }
    }

    pub fn reg(&self, addr: u8) -> u8 {
        self.regs[addr as usize]
    }

    pub fn channel(&self) -> u8 {
        self.reg(reg::RF_CH)
    }

    fn set_ce(&mut self, high: bool, now_ns: u64) {
        if high && !self.ce {
            self.ce_rose_at_ns = now_ns;
        }
        if !high && self.ce {
            self.last_listen_ns = now_ns - self.ce_rose_at_ns;
            let receiving = self.reg(reg::CONFIG) & 0x03 == 0x03;
            self.rpd = receiving && self.busy.contains(&self.channel());
        }
        self.ce = high;
    }

    fn exchange(&mut self, buf: &mut [u8]) {
        self.transfers += 1;
        let status = self.reg(reg::STATUS);
        let Some((first, data)) = buf.split_first_mut() else {
            return;
        };
        let command = *first;
        *first = status;
        match command {
            0xA0 => self.payloads.push(data.to_vec()),
            0xE1 => self.tx_flushes += 1,
            0xE2 | 0xFF => {}
            c if c & 0xE0 == 0x00 => {
                let addr = c & 0x1F;
                let value = if addr == reg::RPD { u8::from(self.rpd) } else { self.reg(addr) };
                data.iter_mut().for_each(|b| *b = value);
            }
            c if c & 0xE0 == 0x20 => {
                let addr = c & 0x1F;
                if let Some(&value) = data.first() {
                    if addr == reg::STATUS {
                        self.regs[addr as usize] &= !(value & 0x70);
                    } else {
                        self.regs[addr as usize] = value;
                    }
                    if addr == reg::RF_CH {
                        self.tuned.push(value);
                    }
                }
                data.iter_mut().for_each(|b| *b = 0);
            }
            _ => {}
        }
    }
}

/// Shared board state
#[derive(Debug)]
pub struct BoardState {
    pub chips: Vec<Chip>,
    pub selected: Option<usize>,
    pub select_violations: usize,
    pub unselected_transfers: usize,
    pub now_ns: u64,
}

/// Handle to the simulated board; clones share state
#[derive(Clone)]
pub struct Board(pub Rc<RefCell<BoardState>>);

impl Board {
    pub fn new(present: [bool; CHIPS]) -> Self {
        Self(Rc::new(RefCell::new(BoardState {
            chips: present.iter().map(|&p| Chip::new(p)).collect(),
            selected: None,
            select_violations: 0,
            unselected_transfers: 0,
            now_ns: 0,
        })))
    }

    pub fn all_present() -> Self {
        Self::new([true; CHIPS])
    }

    pub fn bus(&self) -> RadioBus<SimSpi, SimDelay> {
        RadioBus::new(SimSpi(self.clone()), SimDelay(self.clone()))
    }

    pub fn radios(&self) -> [Transceiver<SimPin>; CHIPS] {
        [0, 1, 2].map(|slot| {
            Transceiver::new(
                RadioId::new(slot as u8),
                SimPin::new(self, slot, PinRole::Ce),
                SimPin::new(self, slot, PinRole::Csn),
            )
            .unwrap()
        })
    }

    pub fn chip(&self, slot: usize) -> Chip {
        self.0.borrow().chips[slot].clone()
    }

    pub fn with_chip<T>(&self, slot: usize, f: impl FnOnce(&mut Chip) -> T) -> T {
        f(&mut self.0.borrow_mut().chips[slot])
    }

    pub fn set_busy(&self, slot: usize, channels: &[u8]) {
        self.with_chip(slot, |chip| chip.busy = channels.to_vec());
    }

    pub fn set_fail(&self, slot: usize, fail: bool) {
        self.with_chip(slot, |chip| chip.fail_spi = fail);
    }

    pub fn clear_history(&self) {
        for chip in &mut self.0.borrow_mut().chips {
            chip.tuned.clear();
            chip.payloads.clear();
        }
    }

    pub fn now_us(&self) -> u64 {
        self.0.borrow().now_ns / 1_000
    }

    pub fn select_violations(&self) -> usize {
        self.0.borrow().select_violations
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinRole {
    Ce,
    Csn,
}

/// CE or CSN line of one chip
pub struct SimPin {
    board: Board,
    slot: usize,
    role: PinRole,
}

impl SimPin {
    fn new(board: &Board, slot: usize, role: PinRole) -> Self {
        Self {
            board: board.clone(),
            slot,
            role,
        }
    }

    fn drive(&mut self, high: bool) {
        let mut state = self.board.0.borrow_mut();
        match self.role {
            PinRole::Ce => {
                let now = state.now_ns;
                state.chips[self.slot].set_ce(high, now);
            }
            PinRole::Csn if high => {
                if state.selected == Some(self.slot) {
                    state.selected = None;
                }
            }
            PinRole::Csn => {
                if state.selected.is_some_and(|s| s != self.slot) {
                    state.select_violations += 1;
                }
                state.selected = Some(self.slot);
            }
        }
    }
}

impl PinErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

/// The shared SPI bus
pub struct SimSpi(Board);

impl SpiErrorType for SimSpi {
    type Error = ErrorKind;
}

impl SpiBus<u8> for SimSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0xFF);
        self.transfer_in_place(words)
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut buf = words.to_vec();
        self.transfer_in_place(&mut buf)
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let mut buf = write.to_vec();
        buf.resize(read.len().max(write.len()), 0xFF);
        self.transfer_in_place(&mut buf)?;
        let n = read.len();
        read.copy_from_slice(&buf[..n]);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut state = self.0 .0.borrow_mut();
        let Some(slot) = state.selected else {
            state.unselected_transfers += 1;
            words.fill(0xFF);
            return Ok(());
        };
        let chip = &mut state.chips[slot];
        if chip.fail_spi {
            return Err(ErrorKind::Other);
        }
        if chip.present {
            chip.exchange(words);
        } else {
            // Nobody drives MISO; the pull-down reads back zero
            words.fill(0x00);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Delay that only advances the board clock
pub struct SimDelay(Board);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0 .0.borrow_mut().now_ns += u64::from(ns);
    }
}

/// Owned copy of a rendered screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    Spectrum { status: String, bars: Vec<u8> },
    Jammer { mode: OperationMode, radios: Vec<bool> },
}

/// Display sink that records every frame
#[derive(Default)]
pub struct RecordingDisplay {
    pub frames: Vec<Frame>,
}

impl RecordingDisplay {
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

impl DisplaySink for RecordingDisplay {
    fn render(&mut self, screen: &Screen<'_>) {
        let frame = match screen {
            Screen::Spectrum { status, bars } => Frame::Spectrum {
                status: (*status).to_string(),
                bars: bars.iter().collect(),
            },
            Screen::Jammer { mode, radios } => Frame::Jammer {
                mode: *mode,
                radios: radios.to_vec(),
            },
        };
        self.frames.push(frame);
    }
}

/// LED sink that records every update
#[derive(Default)]
pub struct RecordingLed {
    pub shown: Vec<(Rgb, u8)>,
}

impl RecordingLed {
    pub fn last(&self) -> Option<(Rgb, u8)> {
        self.shown.last().copied()
    }
}

impl LedSink for RecordingLed {
    fn show(&mut self, color: Rgb, brightness: u8) {
        self.shown.push((color, brightness));
    }
}

pub fn ms(value: u32) -> Millis {
    Millis::new(value)
}
