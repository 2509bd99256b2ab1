//! Serial-port plumbing for the SmartLamp's CP2102 USB bridge.
//!
//! The lamp firmware runs on an ESP32 behind a Silicon Labs CP2102
//! USB-to-UART bridge. On the host side the bridge enumerates as an
//! ordinary serial port, so all the low-level configuration goes through
//! `tokio-serial`; nothing here touches USB endpoints directly.
//!
//! # Types
//!
//! - [`SerialPortIO`]: trait alias combining `AsyncRead + AsyncWrite`
//! - [`DynSerial`]: type-erased boxed serial port
//!
//! Any type implementing the async I/O traits can stand in for the real
//! port - `tokio_serial::SerialStream` for hardware,
//! `tokio::io::DuplexStream` for tests.

use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

/// USB vendor id of the CP2102 bridge chip on the lamp board.
pub const SMARTLAMP_VID: u16 = 0x10c4;
/// USB product id of the CP2102 bridge chip.
pub const SMARTLAMP_PID: u16 = 0xea60;
/// Baud rate the lamp firmware configures its UART for.
pub const DEFAULT_BAUD: u32 = 9600;

/// Trait alias for async serial port I/O.
pub trait SerialPortIO: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> SerialPortIO for T {}

/// Type-erased boxed serial port.
pub type DynSerial = Box<dyn SerialPortIO>;

/// Open the lamp's serial port asynchronously.
///
/// Port opening is a blocking syscall on every platform `serialport`
/// supports, so it is pushed onto the blocking pool. Settings are fixed at
/// 8N1 with no flow control, which is what the CP2102 on the lamp expects.
pub async fn open_serial_async(
    port_path: &str,
    baud_rate: u32,
) -> anyhow::Result<tokio_serial::SerialStream> {
    use tokio::task::spawn_blocking;
    use tokio_serial::SerialPortBuilderExt;

    let port_path_owned = port_path.to_string();

    let port = spawn_blocking(move || {
        tokio_serial::new(&port_path_owned, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .context(format!(
                "Failed to open SmartLamp serial port: {}",
                port_path_owned
            ))
    })
    .await
    .context("spawn_blocking for serial port opening failed")??;

    tracing::info!(port = port_path, baud = baud_rate, "opened SmartLamp serial port");
    Ok(port)
}

/// List serial ports whose USB ids match the lamp's CP2102 bridge.
///
/// Other CP2102-based gadgets share these ids, so the result is a list of
/// candidates, not a guarantee.
pub fn discover_ports() -> anyhow::Result<Vec<String>> {
    let ports = serialport::available_ports().context("failed to enumerate serial ports")?;

    let mut candidates = Vec::new();
    for port in ports {
        if let serialport::SerialPortType::UsbPort(usb) = &port.port_type {
            if usb.vid == SMARTLAMP_VID && usb.pid == SMARTLAMP_PID {
                tracing::debug!(port = %port.port_name, vid = usb.vid, pid = usb.pid, "found candidate bridge");
                candidates.push(port.port_name.clone());
            }
        }
    }
    Ok(candidates)
}

/// First serial port that looks like a SmartLamp bridge, if any.
pub fn discover_port() -> anyhow::Result<Option<String>> {
    Ok(discover_ports()?.into_iter().next())
}

/// Drain stale data from a serial port buffer.
///
/// Reads and discards whatever is immediately available, giving up after
/// `timeout_ms`. Used before sending a command so a late reply to an
/// earlier request cannot be mistaken for the new response.
///
/// Returns the number of bytes discarded.
pub async fn drain_serial_buffer<R: AsyncRead + Unpin>(port: &mut R, timeout_ms: u64) -> usize {
    let mut discard = [0u8; 256];
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    let mut total_discarded = 0usize;

    loop {
        if tokio::time::Instant::now() >= deadline {
            break;
        }

        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, port.read(&mut discard)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => {
                total_discarded += n;
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::WouldBlock => break,
            Ok(Err(_)) => break,
            Err(_) => break,
        }
    }

    total_discarded
}
