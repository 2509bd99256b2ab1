//! Core types shared by the SmartLamp driver crates.
//!
//! This crate holds the pieces that are independent of the lamp's wire
//! protocol: the driver-wide error taxonomy and the async serial-port
//! abstractions used to reach the CP2102 USB bridge. The protocol engine
//! itself lives in `smartlamp-driver`.

pub mod error;
pub mod serial;

pub use error::{LampError, LampResult};
pub use serial::{DynSerial, SerialPortIO};
