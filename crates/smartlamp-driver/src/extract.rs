//! Numeric extraction from cleaned response lines.
//!
//! Firmware revisions differ in how much they echo back: some send
//! `RES GET_LDR 742`, older ones prepend debug chatter. Rather than match
//! response shapes per command, the extractor scans the whole line and
//! takes the *last* embedded number, which makes the echo irrelevant.
//!
//! Grammar for a number: `[+-]?[0-9]+(\.[0-9]+)?`. Without a decimal point
//! the result is a plain [`Value::Int`]. With one, the fractional part is
//! normalized to exactly three digits - padded with zeros when shorter,
//! truncated (never rounded) when longer - and the whole reading becomes a
//! [`Value::Milli`] scaled by 1000. The sign comes from the integer-part
//! token, so `-0.5` stays negative even though its integer part parses
//! to zero.

use once_cell::sync::Lazy;
use regex::Regex;
use smartlamp_core::LampError;

use crate::protocol::{Value, MILLI_SCALE};

/// One signed integer or decimal number, with the fraction captured
/// separately from the integer part.
#[allow(clippy::expect_used)]
static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([+-]?[0-9]+)(?:\.([0-9]+))?").expect("number grammar is a valid regex")
});

/// Extract the numeric payload of a cleaned response line.
pub fn extract_value(line: &str) -> Result<Value, LampError> {
    let format_err = || LampError::Format {
        line: line.to_string(),
    };

    let caps = NUMBER
        .captures_iter(line)
        .last()
        .ok_or_else(format_err)?;

    // Group 1 always participates in a match.
    let int_token = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let int_part: i64 = int_token.parse().map_err(|_| format_err())?;

    let Some(fraction) = caps.get(2) else {
        return Ok(Value::Int(int_part));
    };

    let digits = fraction.as_str();
    let mut frac_milli: i64 = 0;
    for c in digits.chars().take(3) {
        frac_milli = frac_milli * 10 + i64::from(c as u8 - b'0');
    }
    for _ in digits.len().min(3)..3 {
        frac_milli *= 10;
    }

    let combined = int_part
        .checked_abs()
        .and_then(|magnitude| magnitude.checked_mul(MILLI_SCALE))
        .and_then(|scaled| scaled.checked_add(frac_milli))
        .ok_or_else(format_err)?;

    let negative = int_token.starts_with('-');
    Ok(Value::Milli(if negative { -combined } else { combined }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_integer_response() {
        assert_eq!(extract_value("RES GET_LDR 742").unwrap(), Value::Int(742));
        assert_eq!(extract_value("RES GET_LED 0").unwrap(), Value::Int(0));
        assert_eq!(extract_value("RES SET_LED 50").unwrap(), Value::Int(50));
    }

    #[test]
    fn decimal_response_scales_to_milli() {
        assert_eq!(
            extract_value("RES GET_TEMP 23.5").unwrap(),
            Value::Milli(23500)
        );
        assert_eq!(
            extract_value("RES GET_HUM 52.25").unwrap(),
            Value::Milli(52250)
        );
    }

    #[test]
    fn negative_decimal_keeps_its_sign() {
        assert_eq!(
            extract_value("RES GET_TEMP -1.2").unwrap(),
            Value::Milli(-1200)
        );
        // Integer part parses to zero; the sign must survive anyway.
        assert_eq!(
            extract_value("RES GET_TEMP -0.5").unwrap(),
            Value::Milli(-500)
        );
    }

    #[test]
    fn explicit_plus_sign_is_accepted() {
        assert_eq!(extract_value("RES GET_LED +5").unwrap(), Value::Int(5));
        assert_eq!(
            extract_value("RES GET_TEMP +2.5").unwrap(),
            Value::Milli(2500)
        );
    }

    #[test]
    fn long_fractions_truncate_without_rounding() {
        assert_eq!(extract_value("1.23456").unwrap(), Value::Milli(1234));
        assert_eq!(extract_value("0.9999").unwrap(), Value::Milli(999));
    }

    #[test]
    fn short_fractions_pad_with_zeros() {
        assert_eq!(extract_value("7.5").unwrap(), Value::Milli(7500));
        assert_eq!(extract_value("7.05").unwrap(), Value::Milli(7050));
    }

    #[test]
    fn last_number_wins() {
        // "32" inside the chatter must lose to the actual reading.
        assert_eq!(
            extract_value("ESP32 RES GET_TEMP 23.5").unwrap(),
            Value::Milli(23500)
        );
        assert_eq!(
            extract_value("RES GET_LDR 742").unwrap(),
            Value::Int(742)
        );
    }

    #[test]
    fn line_without_digits_is_a_format_error() {
        assert!(matches!(
            extract_value("RES ERROR"),
            Err(LampError::Format { .. })
        ));
        assert!(matches!(extract_value(""), Err(LampError::Format { .. })));
    }

    #[test]
    fn integer_overflow_is_a_format_error() {
        assert!(matches!(
            extract_value("99999999999999999999999"),
            Err(LampError::Format { .. })
        ));
        // Fits in i64 raw, but not once scaled by 1000.
        assert!(matches!(
            extract_value("9223372036854775807.9"),
            Err(LampError::Format { .. })
        ));
    }
}
