//! Attribute surface over the command protocol.
//!
//! The lamp's state is exposed as four named attributes, one per sensor or
//! actuator, each mapped 1:1 to a protocol command pair. This is the layer
//! a filesystem-style frontend (or the CLI) talks to: values go out as one
//! newline-terminated text line, writes come in as one signed integer.
//!
//! Errors cross this boundary as a single opaque failure; the internal
//! [`LampError`](smartlamp_core::LampError) taxonomy stays attached as the
//! error source for logging and tests.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use crate::driver::SmartLamp;
use crate::protocol::{Command, Value};

/// A named device attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// LED brightness. The only writable attribute.
    Led,
    /// Light-dependent resistor reading.
    Ldr,
    /// Temperature, fixed-point.
    Temp,
    /// Relative humidity, fixed-point.
    Hum,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::Led,
        Attribute::Ldr,
        Attribute::Temp,
        Attribute::Hum,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Attribute::Led => "led",
            Attribute::Ldr => "ldr",
            Attribute::Temp => "temp",
            Attribute::Hum => "hum",
        }
    }

    /// Whether the attribute accepts writes. Only the LED is an actuator.
    pub fn writable(self) -> bool {
        matches!(self, Attribute::Led)
    }

    /// Whether readings are fixed-point and printed with three decimals.
    fn fixed_point(self) -> bool {
        matches!(self, Attribute::Temp | Attribute::Hum)
    }

    fn get_command(self) -> Command {
        match self {
            Attribute::Led => Command::GetLed,
            Attribute::Ldr => Command::GetLdr,
            Attribute::Temp => Command::GetTemp,
            Attribute::Hum => Command::GetHum,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Attribute {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "led" => Ok(Attribute::Led),
            "ldr" => Ok(Attribute::Ldr),
            "temp" => Ok(Attribute::Temp),
            "hum" => Ok(Attribute::Hum),
            other => Err(anyhow!(
                "unknown attribute '{}' (expected led, ldr, temp or hum)",
                other
            )),
        }
    }
}

/// Render a ×1000 fixed-point value with exactly three decimal digits.
fn format_milli(milli: i64) -> String {
    let magnitude = milli.unsigned_abs();
    format!(
        "{}{}.{:03}",
        if milli < 0 { "-" } else { "" },
        magnitude / 1000,
        magnitude % 1000
    )
}

impl SmartLamp {
    /// Read `attr` and render it as a single newline-terminated text line.
    ///
    /// Integer attributes print bare; fixed-point attributes always print
    /// `sign? integer.fff`, promoting a whole-number reading to three
    /// zero decimals.
    pub async fn read_attribute(&self, attr: Attribute) -> Result<String> {
        let value = self
            .execute(attr.get_command())
            .await
            .with_context(|| format!("reading attribute '{}' failed", attr))?;

        let text = if attr.fixed_point() {
            format_milli(value.to_milli())
        } else {
            Value::Int(value.as_int()).to_string()
        };
        Ok(format!("{}\n", text))
    }

    /// Parse `input` as a signed base-10 integer and write it to `attr`.
    ///
    /// Read-only attributes are rejected here, before any device I/O.
    pub async fn write_attribute(&self, attr: Attribute, input: &str) -> Result<()> {
        if !attr.writable() {
            return Err(anyhow!("attribute '{}' is read-only", attr));
        }

        let level: i64 = input
            .trim()
            .parse()
            .map_err(|_| anyhow!("invalid value for '{}': {:?}", attr, input))?;

        self.execute(Command::SetLed(level))
            .await
            .with_context(|| format!("writing attribute '{}' failed", attr))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::SmartLampConfig;

    #[test]
    fn attribute_names_round_trip() {
        for attr in Attribute::ALL {
            assert_eq!(attr.name().parse::<Attribute>().unwrap(), attr);
        }
        assert!("lux".parse::<Attribute>().is_err());
        // Matching is exact; no case folding.
        assert!("LED".parse::<Attribute>().is_err());
    }

    #[test]
    fn only_the_led_is_writable() {
        assert!(Attribute::Led.writable());
        assert!(!Attribute::Ldr.writable());
        assert!(!Attribute::Temp.writable());
        assert!(!Attribute::Hum.writable());
    }

    #[test]
    fn milli_formatting_keeps_three_decimals() {
        assert_eq!(format_milli(23500), "23.500");
        assert_eq!(format_milli(-1200), "-1.200");
        assert_eq!(format_milli(25000), "25.000");
        assert_eq!(format_milli(-500), "-0.500");
        assert_eq!(format_milli(0), "0.000");
    }

    #[tokio::test]
    async fn writes_to_read_only_attributes_are_rejected_without_io() {
        // Detached driver: if the bridge tried any I/O this would be
        // DeviceAbsent instead of the read-only rejection.
        let lamp = SmartLamp::new(&SmartLampConfig::default());
        let err = lamp.write_attribute(Attribute::Ldr, "5").await.unwrap_err();
        assert!(err.to_string().contains("read-only"));
    }

    #[tokio::test]
    async fn unparseable_write_input_is_rejected_without_io() {
        let lamp = SmartLamp::new(&SmartLampConfig::default());
        let err = lamp
            .write_attribute(Attribute::Led, "bright")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid value"));

        let err = lamp
            .write_attribute(Attribute::Led, "12.5")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid value"));
    }
}
