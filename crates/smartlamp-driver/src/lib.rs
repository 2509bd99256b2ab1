//! Host-side driver for the SmartLamp device.
//!
//! The SmartLamp is an ESP32 running a small sensor/actuator firmware,
//! reached through a CP2102 USB-to-serial bridge. This crate implements
//! the device communication core:
//!
//! - [`protocol`]: the closed command vocabulary and parsed value types
//! - [`accumulator`]: reassembly of fragmented response lines
//! - [`extract`]: numeric extraction, including ×1000 fixed-point decimals
//! - [`driver`]: the request/response engine with its write deadline and
//!   bounded read/retry loop
//! - [`attrs`]: the named attribute surface (`led`, `ldr`, `temp`, `hum`)
//!
//! # Usage
//!
//! ```rust,ignore
//! use smartlamp_driver::{Attribute, SmartLamp, SmartLampConfig};
//!
//! let lamp = SmartLamp::open(SmartLampConfig::default()).await?;
//! println!("{}", lamp.read_attribute(Attribute::Ldr).await?);
//! lamp.write_attribute(Attribute::Led, "50").await?;
//! ```

pub mod accumulator;
pub mod attrs;
pub mod driver;
pub mod extract;
pub mod protocol;

pub use attrs::Attribute;
pub use driver::{SmartLamp, SmartLampConfig};
pub use protocol::{Command, Value, MAX_RECV_LINE};
pub use smartlamp_core::{LampError, LampResult};
