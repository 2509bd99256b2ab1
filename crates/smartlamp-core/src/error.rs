//! Error taxonomy for the SmartLamp driver.
//!
//! Every non-success path through the protocol engine maps to exactly one
//! variant of [`LampError`]:
//!
//! - `DeviceAbsent` - no transport session; failed before any I/O.
//! - `Open` - the serial port could not be opened or configured.
//! - `Write` - sending the command line failed; never retried here, a
//!   higher layer may re-issue the whole request.
//! - `Overflow` - the response grew past the protocol line limit before a
//!   terminator appeared. Distinct from `Timeout` on purpose: the device is
//!   talking, just not speaking the protocol.
//! - `Timeout` - the read retry budget ran out without a complete line.
//!   Individual failed read attempts are logged, not surfaced.
//! - `Format` - a complete line arrived but no numeric value could be
//!   extracted from it.
//!
//! The attribute layer collapses all of these into one opaque failure for
//! its callers; the variants stay distinguishable internally for logging
//! and tests.

use thiserror::Error;

/// Convenience alias for results using the driver error type.
pub type LampResult<T> = std::result::Result<T, LampError>;

/// Primary error type for SmartLamp device communication.
#[derive(Debug, Error)]
pub enum LampError {
    /// No device session is attached. Reported before any I/O is attempted.
    #[error("no SmartLamp device attached")]
    DeviceAbsent,

    /// The serial port could not be opened.
    #[error("failed to open serial port {port}: {reason}")]
    Open {
        /// Port path, or a description of the discovery that failed.
        port: String,
        reason: anyhow::Error,
    },

    /// Sending the command line to the device failed.
    #[error("failed to send command to device")]
    Write(#[source] std::io::Error),

    /// The accumulated response reached the line-length limit before a
    /// terminator was seen.
    #[error("device response exceeded {capacity} bytes without a line terminator")]
    Overflow { capacity: usize },

    /// No complete response line arrived within the retry budget.
    #[error("no complete response from device after {attempts} read attempts")]
    Timeout { attempts: u32 },

    /// A complete line arrived but did not contain a parseable value.
    #[error("malformed device response: {line:?}")]
    Format { line: String },
}

impl LampError {
    /// True for failures that a fresh request against the same session may
    /// not reproduce (glitched link, slow firmware). `Open`, `DeviceAbsent`
    /// and `Format` need operator intervention instead.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LampError::Write(_) | LampError::Overflow { .. } | LampError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_failure() {
        let err = LampError::Timeout { attempts: 10 };
        assert!(err.to_string().contains("10 read attempts"));

        let err = LampError::Overflow { capacity: 100 };
        assert!(err.to_string().contains("100 bytes"));

        let err = LampError::Format {
            line: "RES ERROR".to_string(),
        };
        assert!(err.to_string().contains("RES ERROR"));
    }

    #[test]
    fn transient_classification() {
        assert!(LampError::Timeout { attempts: 10 }.is_transient());
        assert!(LampError::Overflow { capacity: 100 }.is_transient());
        assert!(!LampError::DeviceAbsent.is_transient());
        assert!(!LampError::Format { line: String::new() }.is_transient());
    }
}
