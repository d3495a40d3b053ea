//! Radio Control Logic
//!
//! Scanning, jamming and mode sequencing built on the nRF24 driver.
//! Implements the functional core of the scanner/jammer.

pub mod jammer;
pub mod mode;
pub mod scanner;
