//! Configuration and Constants Tests
//!
//! Tests to verify configuration values are valid and consistent.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test config_tests

use rf_recon::config::*;
use rf_recon::drivers::nrf24::MAX_PAYLOAD_LEN;
use rf_recon::types::{Channel, ScanResolution};

// =============================================================================
// Clock and Bus Tests
// =============================================================================

#[test]
fn system_clock_valid() {
    // STM32G474 max clock is 170 MHz
    assert_eq!(SYSTEM_CLOCK_HZ, 170_000_000);
}

#[test]
fn spi_within_transceiver_limit() {
    // nRF24L01+ accepts up to 10 MHz SCK
    assert!(SPI_FREQUENCY_HZ <= 10_000_000);
}

#[test]
fn i2c_fast_mode() {
    assert_eq!(I2C_FREQUENCY_HZ, 400_000);
    assert_eq!(DISPLAY_I2C_ADDR, 0x3C);
}

// =============================================================================
// Display Geometry Tests
// =============================================================================

#[test]
fn graph_fits_below_status_line() {
    assert_eq!(DISPLAY_WIDTH, 128);
    assert_eq!(DISPLAY_HEIGHT, 64);
    assert_eq!(GRAPH_HEIGHT, 52);
    assert_eq!(u32::from(GRAPH_HEIGHT) + GRAPH_TOP, DISPLAY_HEIGHT);
}

// =============================================================================
// Timing Tests
// =============================================================================

#[test]
fn sample_window_covers_rx_settling() {
    // RPD needs at least 130us after CE rises
    assert!(RX_SETTLE_US + CHANNEL_DWELL_US >= 130);
}

#[test]
fn tx_pulse_long_enough() {
    assert!(TX_PULSE_US >= 10);
}

#[test]
fn scanner_defaults() {
    assert_eq!(SCAN_PASSES, 25);
    assert_eq!(SCAN_RESOLUTION, ScanResolution::Coarse);
    assert_eq!(SCAN_FRAME_DELAY_MS, 30);
}

#[test]
fn button_debounce() {
    assert_eq!(BUTTON_DEBOUNCE_MS, 500);
}

// =============================================================================
// Channel Table Tests
// =============================================================================

#[test]
fn channel_tables_have_expected_lengths() {
    assert_eq!(channels::BLE_ADVERTISING.len(), 3);
    assert_eq!(channels::CLASSIC_HOP.len(), 21);
    for group in [channels::GROUP_1, channels::GROUP_2, channels::GROUP_3] {
        assert_eq!(group.len(), 4);
    }
}

#[test]
fn ble_advertising_frequencies() {
    let mhz: Vec<u16> = channels::BLE_ADVERTISING.iter().map(|c| c.frequency_mhz()).collect();
    assert_eq!(mhz, vec![2402, 2426, 2480]);
}

#[test]
fn bluetooth_tables_within_ism_band() {
    for channel in channels::BLE_ADVERTISING.iter().chain(channels::CLASSIC_HOP) {
        // 2400..=2483.5 MHz
        assert!(channel.frequency_mhz() <= 2483, "{channel:?}");
    }
}

#[test]
fn group_channels_programmable() {
    for channel in [channels::GROUP_1, channels::GROUP_2, channels::GROUP_3].concat() {
        assert!(Channel::new(channel.raw()).is_some());
    }
}

#[test]
fn groups_start_on_advertising_channels() {
    assert_eq!(channels::GROUP_1[0], channels::BLE_ADVERTISING[0]);
    assert_eq!(channels::GROUP_2[0], channels::BLE_ADVERTISING[1]);
    assert_eq!(channels::GROUP_3[0], channels::BLE_ADVERTISING[2]);
}

#[test]
fn groups_step_by_three() {
    for group in [channels::GROUP_1, channels::GROUP_2, channels::GROUP_3] {
        assert!(group.windows(2).all(|w| w[1].raw() - w[0].raw() == 3));
    }
}

// =============================================================================
// Jamming Constants Tests
// =============================================================================

#[test]
fn filler_payload_fits_fifo() {
    assert_eq!(FILLER_PAYLOAD.len(), 16);
    assert!(FILLER_PAYLOAD.len() <= MAX_PAYLOAD_LEN);
}

#[test]
fn neutral_channel_is_zero() {
    assert_eq!(NEUTRAL_CHANNEL, Channel::of(0));
    assert_eq!(NEUTRAL_SETTLE_MS, 100);
    assert_eq!(HOP_INTERVAL_MS, 10);
}

#[test]
fn three_radios() {
    assert_eq!(RADIO_COUNT, 3);
}
