//! Wire protocol spoken by the SmartLamp firmware.
//!
//! The link is plain ASCII, one request per line, one response per line.
//! Lines are terminated by `\n` on the way out; the firmware terminates its
//! responses with `\n` or `\r`. There is no escaping and no framing beyond
//! the terminator.
//!
//! | Direction   | Format                                    |
//! |-------------|-------------------------------------------|
//! | host→device | `GET_LED` / `GET_LDR` / `GET_TEMP` / `GET_HUM` |
//! | host→device | `SET_LED <int>`                           |
//! | device→host | `RES <CMD> <value>`                       |
//!
//! `<value>` is a signed integer for the LED and LDR, and may carry a
//! decimal fraction for temperature and humidity.

use std::fmt;

/// Maximum length of one response line from the device, terminator
/// included. Anything longer is a protocol violation.
pub const MAX_RECV_LINE: usize = 100;

/// Scale factor for fixed-point readings: three decimal digits.
pub const MILLI_SCALE: i64 = 1000;

/// One request to the firmware.
///
/// The vocabulary is closed; only `SET_LED` carries a parameter, so
/// "command without parameter" is not representable by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetLed,
    GetLdr,
    GetTemp,
    GetHum,
    SetLed(i64),
}

impl Command {
    /// Command name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetLed => "GET_LED",
            Command::GetLdr => "GET_LDR",
            Command::GetTemp => "GET_TEMP",
            Command::GetHum => "GET_HUM",
            Command::SetLed(_) => "SET_LED",
        }
    }

    /// Serialize to the single newline-terminated line sent to the device.
    pub fn to_line(&self) -> String {
        match self {
            Command::SetLed(level) => format!("{} {}\n", self.name(), level),
            _ => format!("{}\n", self.name()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetLed(level) => write!(f, "{} {}", self.name(), level),
            _ => f.write_str(self.name()),
        }
    }
}

/// A parsed response value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// Plain integer reading, in raw device units.
    Int(i64),
    /// Fixed-point reading scaled by [`MILLI_SCALE`].
    Milli(i64),
}

impl Value {
    /// The reading scaled by 1000 regardless of variant.
    pub fn to_milli(self) -> i64 {
        match self {
            Value::Int(v) => v.saturating_mul(MILLI_SCALE),
            Value::Milli(m) => m,
        }
    }

    /// The reading as a whole number, truncating any fraction toward zero.
    pub fn as_int(self) -> i64 {
        match self {
            Value::Int(v) => v,
            Value::Milli(m) => m / MILLI_SCALE,
        }
    }
}

impl fmt::Display for Value {
    /// Integers print bare. Fixed-point values with no fractional remainder
    /// also print bare; otherwise they print as `integer.mmm` with exactly
    /// three fractional digits, sign first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Milli(m) if m % MILLI_SCALE == 0 => write!(f, "{}", m / MILLI_SCALE),
            Value::Milli(m) => {
                let magnitude = m.unsigned_abs();
                write!(
                    f,
                    "{}{}.{:03}",
                    if m < 0 { "-" } else { "" },
                    magnitude / 1000,
                    magnitude % 1000
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_commands_serialize_without_parameter() {
        assert_eq!(Command::GetLed.to_line(), "GET_LED\n");
        assert_eq!(Command::GetLdr.to_line(), "GET_LDR\n");
        assert_eq!(Command::GetTemp.to_line(), "GET_TEMP\n");
        assert_eq!(Command::GetHum.to_line(), "GET_HUM\n");
    }

    #[test]
    fn set_led_serializes_with_parameter() {
        assert_eq!(Command::SetLed(50).to_line(), "SET_LED 50\n");
        assert_eq!(Command::SetLed(-1).to_line(), "SET_LED -1\n");
        assert_eq!(Command::SetLed(0).to_line(), "SET_LED 0\n");
    }

    #[test]
    fn value_display_integer() {
        assert_eq!(Value::Int(742).to_string(), "742");
        assert_eq!(Value::Int(-3).to_string(), "-3");
    }

    #[test]
    fn value_display_fixed_point() {
        assert_eq!(Value::Milli(23500).to_string(), "23.500");
        assert_eq!(Value::Milli(-1200).to_string(), "-1.200");
        assert_eq!(Value::Milli(52250).to_string(), "52.250");
        // Whole readings lose the decimal point entirely.
        assert_eq!(Value::Milli(24000).to_string(), "24");
        assert_eq!(Value::Milli(-5000).to_string(), "-5");
        // Sub-unit readings keep their sign.
        assert_eq!(Value::Milli(-500).to_string(), "-0.500");
        assert_eq!(Value::Milli(7).to_string(), "0.007");
    }

    #[test]
    fn value_scaling() {
        assert_eq!(Value::Int(23).to_milli(), 23000);
        assert_eq!(Value::Milli(23500).to_milli(), 23500);
        assert_eq!(Value::Int(42).as_int(), 42);
        assert_eq!(Value::Milli(23500).as_int(), 23);
        assert_eq!(Value::Milli(-1200).as_int(), -1);
    }
}
