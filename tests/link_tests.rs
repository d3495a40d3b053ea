//! nRF24 Register Link Tests
//!
//! Byte-level checks of the SPI framing against embedded-hal-mock.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test link_tests

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, SpiBus};
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction};
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

use rf_recon::drivers::nrf24::{
    cmd, read_command, reg, write_command, RadioBus, RadioError, Transceiver, MAX_PAYLOAD_LEN,
};
use rf_recon::types::{Channel, RadioId};

const STATUS_RESET: u8 = 0x0E;

/// One select-framed transfer: the bytes sent and the bytes clocked back
fn frame(sent: Vec<u8>, reply: Vec<u8>) -> [SpiTransaction<u8>; 2] {
    [SpiTransaction::transfer_in_place(sent, reply), SpiTransaction::flush()]
}

/// CSN goes high once at construction, then low/high around each transfer
fn csn_expectations(transfers: usize) -> Vec<PinTransaction> {
    let mut expected = vec![PinTransaction::set(PinState::High)];
    for _ in 0..transfers {
        expected.push(PinTransaction::set(PinState::Low));
        expected.push(PinTransaction::set(PinState::High));
    }
    expected
}

struct Harness {
    radio: Transceiver<PinMock>,
    bus: RadioBus<SpiMock<u8>, NoopDelay>,
    spi: SpiMock<u8>,
    ce: PinMock,
    csn: PinMock,
}

impl Harness {
    fn new(spi: &[SpiTransaction<u8>], ce: &[PinTransaction], transfers: usize) -> Self {
        let spi = SpiMock::new(spi);
        let ce = PinMock::new(ce);
        let csn = PinMock::new(&csn_expectations(transfers));
        let radio = Transceiver::new(RadioId::new(0), ce.clone(), csn.clone()).unwrap();
        let bus = RadioBus::new(spi.clone(), NoopDelay::new());
        Self { radio, bus, spi, ce, csn }
    }

    fn done(mut self) {
        self.spi.done();
        self.ce.done();
        self.csn.done();
    }
}

fn ce_idle() -> Vec<PinTransaction> {
    vec![PinTransaction::set(PinState::Low)]
}

// =============================================================================
// Command Encoding Tests
// =============================================================================

#[test]
fn test_read_command_keeps_write_bit_clear() {
    assert_eq!(read_command(reg::RF_CH), 0x05);
    assert_eq!(read_command(reg::RPD), 0x09);
    assert_eq!(read_command(reg::CONFIG) & cmd::W_REGISTER, 0);
}

#[test]
fn test_write_command_sets_bit_5() {
    assert_eq!(write_command(reg::CONFIG), 0x20);
    assert_eq!(write_command(reg::RF_CH), 0x25);
    assert_eq!(write_command(reg::RF_SETUP), 0x26);
}

#[test]
fn test_commands_mask_address_to_5_bits() {
    assert_eq!(read_command(0x25), 0x05);
    assert_eq!(write_command(0xFF), 0x3F);
}

// =============================================================================
// Transaction Framing Tests
// =============================================================================

#[test]
fn test_new_drives_idle_levels() {
    let h = Harness::new(&[], &ce_idle(), 0);
    h.done();
}

#[test]
fn test_read_register() {
    let spi = frame(vec![0x05, cmd::NOP], vec![STATUS_RESET, 0x4C]);
    let mut h = Harness::new(&spi, &ce_idle(), 1);

    let value = h.radio.read_register(&mut h.bus, reg::RF_CH).unwrap();
    assert_eq!(value, 0x4C);
    h.done();
}

#[test]
fn test_write_register() {
    let spi = frame(vec![0x25, 40], vec![STATUS_RESET, 0x00]);
    let mut h = Harness::new(&spi, &ce_idle(), 1);

    h.radio.write_register(&mut h.bus, reg::RF_CH, 40).unwrap();
    h.done();
}

#[test]
fn test_update_register_is_read_then_write() {
    let spi: Vec<_> = frame(vec![0x00, cmd::NOP], vec![STATUS_RESET, 0x08])
        .into_iter()
        .chain(frame(vec![0x20, 0x0A], vec![STATUS_RESET, 0x00]))
        .collect();
    let mut h = Harness::new(&spi, &ce_idle(), 2);

    let value = h.radio.update_register(&mut h.bus, reg::CONFIG, 0, 0x02).unwrap();
    assert_eq!(value, 0x0A);
    h.done();
}

#[test]
fn test_write_payload() {
    let spi = frame(vec![0xA0, b'x', b'x', b'x', b'x'], vec![STATUS_RESET, 0, 0, 0, 0]);
    let mut h = Harness::new(&spi, &ce_idle(), 1);

    h.radio.write_payload(&mut h.bus, b"xxxx").unwrap();
    h.done();
}

#[test]
fn test_write_payload_too_long_sends_nothing() {
    let mut h = Harness::new(&[], &ce_idle(), 0);

    let payload = [0u8; MAX_PAYLOAD_LEN + 1];
    let result = h.radio.write_payload(&mut h.bus, &payload);
    assert_eq!(result, Err(RadioError::PayloadTooLong(33)));
    h.done();
}

#[test]
fn test_flush_tx() {
    let spi = frame(vec![cmd::FLUSH_TX], vec![STATUS_RESET]);
    let mut h = Harness::new(&spi, &ce_idle(), 1);

    h.radio.flush_tx(&mut h.bus).unwrap();
    h.done();
}

// =============================================================================
// Power State Tests
// =============================================================================

#[test]
fn test_presence_probe_accepts_valid_address_width() {
    let spi: Vec<_> = [0x03, 0xFF, 0x00]
        .into_iter()
        .flat_map(|aw| frame(vec![0x03, cmd::NOP], vec![STATUS_RESET, aw]))
        .collect();
    let mut h = Harness::new(&spi, &ce_idle(), 3);

    assert!(h.radio.is_present(&mut h.bus).unwrap());
    // Floating MISO reads as all ones or all zeros
    assert!(!h.radio.is_present(&mut h.bus).unwrap());
    assert!(!h.radio.is_present(&mut h.bus).unwrap());
    h.done();
}

#[test]
fn test_carrier_detected_reads_rpd_bit_0() {
    let spi: Vec<_> = frame(vec![0x09, cmd::NOP], vec![STATUS_RESET, 0x01])
        .into_iter()
        .chain(frame(vec![0x09, cmd::NOP], vec![STATUS_RESET, 0x00]))
        .collect();
    let mut h = Harness::new(&spi, &ce_idle(), 2);

    assert!(h.radio.carrier_detected(&mut h.bus).unwrap());
    assert!(!h.radio.carrier_detected(&mut h.bus).unwrap());
    h.done();
}

#[test]
fn test_enter_and_exit_receive_toggle_ce() {
    let ce = vec![
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::High),
        PinTransaction::set(PinState::Low),
    ];
    let mut h = Harness::new(&[], &ce, 0);

    h.radio.enter_receive(&mut h.bus).unwrap();
    h.radio.exit_receive().unwrap();
    h.done();
}

#[test]
fn test_start_carrier_sequence() {
    let spi: Vec<_> = frame(vec![0x06, cmd::NOP], vec![STATUS_RESET, 0x0F])
        .into_iter()
        .chain(frame(vec![0x26, 0x9F], vec![STATUS_RESET, 0x00]))
        .chain(frame(vec![0x25, 2], vec![STATUS_RESET, 0x00]))
        .collect();
    let ce = vec![
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::High),
    ];
    let mut h = Harness::new(&spi, &ce, 3);

    h.radio.start_carrier(&mut h.bus, Channel::of(2)).unwrap();
    h.done();
}

#[test]
fn test_stop_carrier_clears_cont_wave_and_pll_lock() {
    let spi: Vec<_> = frame(vec![0x06, cmd::NOP], vec![STATUS_RESET, 0x9F])
        .into_iter()
        .chain(frame(vec![0x26, 0x0F], vec![STATUS_RESET, 0x00]))
        .collect();
    let ce = vec![PinTransaction::set(PinState::Low), PinTransaction::set(PinState::Low)];
    let mut h = Harness::new(&spi, &ce, 2);

    h.radio.stop_carrier(&mut h.bus).unwrap();
    h.done();
}

#[test]
fn test_power_down_clears_pwr_up_and_drops_ce() {
    let spi: Vec<_> = frame(vec![0x00, cmd::NOP], vec![STATUS_RESET, 0x0E])
        .into_iter()
        .chain(frame(vec![0x20, 0x0C], vec![STATUS_RESET, 0x00]))
        .collect();
    let ce = vec![PinTransaction::set(PinState::Low), PinTransaction::set(PinState::Low)];
    let mut h = Harness::new(&spi, &ce, 2);

    h.radio.power_down(&mut h.bus).unwrap();
    h.done();
}

// =============================================================================
// Error Reporting Tests
// =============================================================================

/// SPI bus that fails every transfer when `fail` is set
struct FlakySpi {
    fail: bool,
}

impl spi::ErrorType for FlakySpi {
    type Error = spi::ErrorKind;
}

impl FlakySpi {
    fn outcome(&self) -> Result<(), spi::ErrorKind> {
        if self.fail {
            Err(spi::ErrorKind::Overrun)
        } else {
            Ok(())
        }
    }
}

impl SpiBus<u8> for FlakySpi {
    fn read(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
        self.outcome()
    }

    fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> {
        self.outcome()
    }

    fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> {
        self.outcome()
    }

    fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
        self.outcome()
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Output line that refuses to go high once `stuck` is set
#[derive(Clone, Default)]
struct StuckPin {
    stuck: Rc<Cell<bool>>,
    highs: Rc<Cell<usize>>,
}

impl digital::ErrorType for StuckPin {
    type Error = digital::ErrorKind;
}

impl OutputPin for StuckPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.highs.set(self.highs.get() + 1);
        if self.stuck.get() {
            Err(digital::ErrorKind::Other)
        } else {
            Ok(())
        }
    }
}

fn stuck_select_radio() -> (Transceiver<StuckPin>, StuckPin) {
    let csn = StuckPin::default();
    let radio = Transceiver::new(RadioId::new(0), StuckPin::default(), csn.clone()).unwrap();
    csn.stuck.set(true);
    (radio, csn)
}

#[test]
fn test_bus_error_reported_before_select_error() {
    let (mut radio, csn) = stuck_select_radio();
    let mut bus = RadioBus::new(FlakySpi { fail: true }, NoopDelay::new());

    let result = radio.read_register(&mut bus, reg::CONFIG);
    assert_eq!(result, Err(RadioError::Bus(spi::ErrorKind::Overrun)));
    // Construction plus the release after the failed transfer
    assert_eq!(csn.highs.get(), 2);
}

#[test]
fn test_select_error_reported_after_good_transfer() {
    let (mut radio, _csn) = stuck_select_radio();
    let mut bus = RadioBus::new(FlakySpi { fail: false }, NoopDelay::new());

    let result = radio.write_register(&mut bus, reg::RF_CH, 40);
    assert_eq!(result, Err(RadioError::Pin(digital::ErrorKind::Other)));
}
