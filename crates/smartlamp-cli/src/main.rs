//! Command-line frontend for the SmartLamp driver.
//!
//! Reads and writes the lamp's attributes over its USB serial bridge:
//!
//! ```text
//! smartlamp list-ports
//! smartlamp get ldr
//! smartlamp set led 50
//! smartlamp status
//! RUST_LOG=smartlamp_driver=debug smartlamp get temp
//! ```
//!
//! The port is autodetected by the bridge chip's USB ids when neither
//! `--port` nor a config file names one.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use smartlamp_core::serial;
use smartlamp_driver::{Attribute, SmartLamp, SmartLampConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "smartlamp",
    version,
    about = "Talk to a SmartLamp device over its USB serial bridge"
)]
struct Cli {
    /// Serial port path; autodetected by USB id when omitted.
    #[arg(long)]
    port: Option<String>,

    /// Baud rate of the link (default 9600).
    #[arg(long)]
    baud: Option<u32>,

    /// TOML config file; --port and --baud override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Read one attribute (led, ldr, temp, hum) and print its value.
    Get { attr: String },
    /// Write an integer value to a writable attribute.
    Set { attr: String, value: String },
    /// Read every attribute.
    Status,
    /// List serial ports that look like a SmartLamp bridge.
    ListPorts,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Cmd::ListPorts = cli.command {
        return list_ports();
    }

    let config = resolve_config(&cli)?;
    tracing::debug!(port = ?config.port, baud = config.baud, "resolved configuration");
    let lamp = SmartLamp::open(config)
        .await
        .context("could not reach a SmartLamp device (try --port or list-ports)")?;

    match cli.command {
        Cmd::Get { attr } => {
            let attr: Attribute = attr.parse()?;
            print!("{}", lamp.read_attribute(attr).await?);
        }
        Cmd::Set { attr, value } => {
            let attr: Attribute = attr.parse()?;
            lamp.write_attribute(attr, &value).await?;
        }
        Cmd::Status => {
            for attr in Attribute::ALL {
                match lamp.read_attribute(attr).await {
                    Ok(line) => println!("{:>4}: {}", attr, line.trim_end()),
                    Err(e) => println!("{:>4}: error: {:#}", attr, e),
                }
            }
        }
        Cmd::ListPorts => unreachable!("handled before opening a port"),
    }

    Ok(())
}

/// Merge the config file (if any) with command-line overrides.
fn resolve_config(cli: &Cli) -> Result<SmartLampConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            SmartLampConfig::from_toml_str(&text)
                .with_context(|| format!("invalid config file {}", path.display()))?
        }
        None => SmartLampConfig::default(),
    };

    if cli.port.is_some() {
        config.port = cli.port.clone();
    }
    if let Some(baud) = cli.baud {
        config.baud = baud;
    }
    Ok(config)
}

fn list_ports() -> Result<()> {
    let candidates = serial::discover_ports()?;
    if candidates.is_empty() {
        return Err(anyhow!(
            "no serial port with USB ids {:04x}:{:04x} found",
            serial::SMARTLAMP_VID,
            serial::SMARTLAMP_PID
        ));
    }
    for port in candidates {
        println!("{}", port);
    }
    Ok(())
}
