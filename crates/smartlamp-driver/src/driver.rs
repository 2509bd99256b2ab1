//! SmartLamp device driver.
//!
//! Reference: DevTITANS SmartLamp firmware (ESP32 + CP2102 bridge).
//!
//! Protocol overview:
//! - Format: simple ASCII command/response lines (see [`crate::protocol`])
//! - Baud: 9600, 8N1, no flow control
//! - Request terminator: LF; response terminator: LF or CR
//! - The bridge delivers responses in bulk packets of at most 64 bytes, so
//!   a response line is reassembled across multiple reads
//!
//! Every request follows the same shape: send one command line under a
//! write deadline, then read under a per-attempt deadline until a full
//! line, an overflow, or retry exhaustion. Failed read attempts are
//! absorbed by the retry loop; a failed write is surfaced immediately.
//! With the default configuration a fully dead link costs
//! 2000 + 10 × 1500 ms before `Timeout` is reported.
//!
//! # Usage
//!
//! ```rust,ignore
//! use smartlamp_driver::{SmartLamp, SmartLampConfig};
//!
//! let lamp = SmartLamp::open(SmartLampConfig::default()).await?;
//! let brightness = lamp.led().await?;
//! lamp.set_led(50).await?;
//! ```

use std::io;
use std::time::Duration;

use serde::Deserialize;
use smartlamp_core::serial::{self, DynSerial};
use smartlamp_core::{LampError, LampResult};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::instrument;

use crate::accumulator::LineAccumulator;
use crate::extract::extract_value;
use crate::protocol::{Command, Value, MAX_RECV_LINE};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the SmartLamp driver.
///
/// Deserializable from TOML so deployments can keep port and timing
/// overrides in a file:
///
/// ```toml
/// port = "/dev/ttyUSB0"
/// baud = 9600
/// read_timeout_ms = 1500
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SmartLampConfig {
    /// Serial port path (e.g. "/dev/ttyUSB0"). When absent the port is
    /// discovered by the bridge chip's USB vendor/product ids.
    #[serde(default)]
    pub port: Option<String>,
    /// Baud rate of the CP2102 link.
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// Deadline for sending one command line.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    /// Deadline for each individual read attempt.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Read attempts per request before giving up.
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,
}

fn default_baud() -> u32 {
    serial::DEFAULT_BAUD
}

fn default_write_timeout_ms() -> u64 {
    2000
}

fn default_read_timeout_ms() -> u64 {
    1500
}

fn default_read_retries() -> u32 {
    10
}

impl Default for SmartLampConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: default_baud(),
            write_timeout_ms: default_write_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            read_retries: default_read_retries(),
        }
    }
}

impl SmartLampConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        use anyhow::Context;
        toml::from_str(text).context("invalid SmartLamp configuration")
    }
}

// =============================================================================
// SmartLamp driver
// =============================================================================

/// An attached transport session. Created on attach, dropped on detach or
/// when the port goes away.
struct Transport {
    io: DynSerial,
    /// Largest chunk one read may return: the bridge endpoint size, capped
    /// by the protocol line limit.
    max_packet: usize,
}

/// Driver for the SmartLamp device.
///
/// The transport lives behind an async mutex that is held for the whole
/// duration of [`execute`](SmartLamp::execute), so concurrent requests
/// against one device serialize instead of interleaving their reads.
pub struct SmartLamp {
    transport: Mutex<Option<Transport>>,
    write_timeout: Duration,
    read_timeout: Duration,
    read_retries: u32,
}

impl SmartLamp {
    /// Bulk endpoint size of the CP2102 bridge.
    pub const DEFAULT_MAX_PACKET: usize = 64;

    /// Create a driver with no device attached.
    ///
    /// Every request fails with [`LampError::DeviceAbsent`] until a
    /// transport is [attached](SmartLamp::attach).
    pub fn new(config: &SmartLampConfig) -> Self {
        Self {
            transport: Mutex::new(None),
            write_timeout: Duration::from_millis(config.write_timeout_ms),
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            read_retries: config.read_retries,
        }
    }

    /// Open the configured (or discovered) serial port and return a ready
    /// driver.
    pub async fn open(config: SmartLampConfig) -> LampResult<Self> {
        let port = match &config.port {
            Some(port) => port.clone(),
            None => serial::discover_port()
                .map_err(|e| LampError::Open {
                    port: "<autodiscover>".to_string(),
                    reason: e,
                })?
                .ok_or(LampError::DeviceAbsent)?,
        };

        let io = serial::open_serial_async(&port, config.baud)
            .await
            .map_err(|e| LampError::Open {
                port: port.clone(),
                reason: e,
            })?;

        let lamp = Self::new(&config);
        lamp.attach(Box::new(io), Self::DEFAULT_MAX_PACKET).await;
        Ok(lamp)
    }

    /// Attach an open byte stream as the device session.
    ///
    /// `max_packet` is the largest chunk a single read may deliver
    /// (the bridge's bulk endpoint size); it is capped at the protocol
    /// line limit.
    pub async fn attach(&self, io: DynSerial, max_packet: usize) {
        let mut guard = self.transport.lock().await;
        *guard = Some(Transport {
            io,
            max_packet: max_packet.clamp(1, MAX_RECV_LINE),
        });
        tracing::info!(max_packet, "SmartLamp transport attached");
    }

    /// Drop the device session, if any. In-flight requests finish first
    /// (they hold the transport lock) and later ones fail fast.
    pub async fn detach(&self) {
        let mut guard = self.transport.lock().await;
        if guard.take().is_some() {
            tracing::info!("SmartLamp transport detached");
        }
    }

    pub async fn is_attached(&self) -> bool {
        self.transport.lock().await.is_some()
    }

    /// Send one command and parse the device's response.
    ///
    /// Holds the transport for the full write/read cycle. Values are always
    /// sampled fresh from the device; nothing is cached between calls.
    #[instrument(skip(self), fields(command = %command))]
    pub async fn execute(&self, command: Command) -> LampResult<Value> {
        let mut guard = self.transport.lock().await;
        let transport = guard.as_mut().ok_or(LampError::DeviceAbsent)?;

        // A late reply to an earlier request must not be read back as the
        // answer to this one.
        let stale = serial::drain_serial_buffer(&mut transport.io, 20).await;
        if stale > 0 {
            tracing::debug!(stale, "discarded stale bytes before command");
        }

        let line = command.to_line();
        tracing::debug!(line = ?line, "sending command");

        let write = async {
            transport.io.write_all(line.as_bytes()).await?;
            transport.io.flush().await
        };
        match timeout(self.write_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(LampError::Write(e)),
            Err(_) => {
                return Err(LampError::Write(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "write deadline elapsed",
                )))
            }
        }

        let response = self.read_response(transport).await?;
        let value = extract_value(&response)?;
        tracing::debug!(%value, "parsed response");
        Ok(value)
    }

    /// Read/retry loop: accumulate fragments until a full line, an
    /// overflow, or retry exhaustion.
    ///
    /// Every iteration consumes one attempt, whether the read errored,
    /// timed out, returned nothing, or succeeded without completing the
    /// line. A single failed read is not fatal; only running out of the
    /// budget is.
    async fn read_response(&self, transport: &mut Transport) -> LampResult<String> {
        let mut acc = LineAccumulator::new();
        let mut frame = vec![0u8; transport.max_packet];

        for attempt in 1..=self.read_retries {
            match timeout(self.read_timeout, transport.io.read(&mut frame)).await {
                Ok(Ok(0)) => {
                    tracing::debug!(attempt, retries = self.read_retries, "read returned no data");
                }
                Ok(Ok(n)) => {
                    if acc.push(&frame[..n])? {
                        let cleaned = acc.cleaned();
                        tracing::debug!(attempt, response = %cleaned, "response complete");
                        return Ok(cleaned);
                    }
                    tracing::trace!(attempt, received = acc.len(), "partial response");
                }
                Ok(Err(e)) => {
                    tracing::debug!(attempt, retries = self.read_retries, error = %e, "read failed");
                }
                Err(_) => {
                    tracing::debug!(attempt, retries = self.read_retries, "read deadline elapsed");
                }
            }
        }

        Err(LampError::Timeout {
            attempts: self.read_retries,
        })
    }

    // -------------------------------------------------------------------------
    // Typed convenience wrappers
    // -------------------------------------------------------------------------

    /// Current LED brightness as reported by the firmware.
    pub async fn led(&self) -> LampResult<i64> {
        Ok(self.execute(Command::GetLed).await?.as_int())
    }

    /// Set the LED brightness. Returns the value the firmware echoes back.
    pub async fn set_led(&self, level: i64) -> LampResult<i64> {
        Ok(self.execute(Command::SetLed(level)).await?.as_int())
    }

    /// Current light-sensor reading.
    pub async fn ldr(&self) -> LampResult<i64> {
        Ok(self.execute(Command::GetLdr).await?.as_int())
    }

    /// Temperature in thousandths of a degree Celsius.
    pub async fn temperature_milli(&self) -> LampResult<i64> {
        Ok(self.execute(Command::GetTemp).await?.to_milli())
    }

    /// Relative humidity in thousandths of a percent.
    pub async fn humidity_milli(&self) -> LampResult<i64> {
        Ok(self.execute(Command::GetHum).await?.to_milli())
    }
}
