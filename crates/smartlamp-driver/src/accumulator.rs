//! Fragment reassembly for device response lines.
//!
//! The CP2102 bridge chops serial traffic into bulk packets no larger than
//! its endpoint size, so one transport read rarely returns a whole response
//! line. [`LineAccumulator`] folds successive raw reads into a single
//! buffer until a line terminator shows up, enforcing the protocol's line
//! length limit along the way.
//!
//! An accumulator is created fresh for every request and dropped with it;
//! nothing carries over between calls.

use smartlamp_core::LampError;

use crate::protocol::MAX_RECV_LINE;

/// Accumulates raw transport fragments until a full line is present.
#[derive(Debug)]
pub struct LineAccumulator {
    buf: Vec<u8>,
}

impl LineAccumulator {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(MAX_RECV_LINE),
        }
    }

    /// Append one raw fragment.
    ///
    /// Returns `true` once the buffer holds a `\n` or `\r` anywhere.
    /// Fails with [`LampError::Overflow`] if the fragment would bring the
    /// total to the line limit or beyond; the accumulated total must stay
    /// strictly below [`MAX_RECV_LINE`]. The check runs before the
    /// terminator scan, so an oversized fragment is an overflow even when
    /// it happens to contain a terminator.
    pub fn push(&mut self, fragment: &[u8]) -> Result<bool, LampError> {
        if self.buf.len() + fragment.len() >= MAX_RECV_LINE {
            return Err(LampError::Overflow {
                capacity: MAX_RECV_LINE,
            });
        }
        self.buf.extend_from_slice(fragment);
        Ok(self.buf.iter().any(|&b| b == b'\n' || b == b'\r'))
    }

    /// Number of bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated response, trimmed of surrounding whitespace and
    /// control bytes, ready for numeric extraction.
    pub fn cleaned(&self) -> String {
        String::from_utf8_lossy(&self.buf)
            .trim_matches(|c: char| c.is_whitespace() || c.is_control())
            .to_string()
    }
}

impl Default for LineAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_fragment_with_newline_completes() {
        let mut acc = LineAccumulator::new();
        assert!(acc.push(b"RES GET_LDR 742\n").unwrap());
        assert_eq!(acc.cleaned(), "RES GET_LDR 742");
    }

    #[test]
    fn carriage_return_also_terminates() {
        let mut acc = LineAccumulator::new();
        assert!(acc.push(b"RES GET_LED 10\r").unwrap());
        assert_eq!(acc.cleaned(), "RES GET_LED 10");
    }

    #[test]
    fn fragments_accumulate_until_terminator() {
        let mut acc = LineAccumulator::new();
        assert!(!acc.push(b"R").unwrap());
        assert!(!acc.push(b"ES GE").unwrap());
        assert!(acc.push(b"T_LDR 742\n").unwrap());
        assert_eq!(acc.cleaned(), "RES GET_LDR 742");
    }

    #[test]
    fn terminator_anywhere_in_buffer_counts() {
        let mut acc = LineAccumulator::new();
        assert!(acc.push(b"RES GET_LDR 742\ntrailing").unwrap());
    }

    #[test]
    fn overflow_is_reported_at_the_limit() {
        let mut acc = LineAccumulator::new();
        assert!(!acc.push(&[b'x'; 64]).unwrap());
        // 64 + 36 == MAX_RECV_LINE: no room left for the NUL a C string
        // view of the buffer would need, so this is already an overflow.
        let err = acc.push(&[b'x'; 36]).unwrap_err();
        assert!(matches!(err, LampError::Overflow { capacity: 100 }));
    }

    #[test]
    fn just_under_the_limit_is_accepted() {
        let mut acc = LineAccumulator::new();
        assert!(!acc.push(&[b'x'; 64]).unwrap());
        assert!(!acc.push(&[b'x'; 35]).unwrap());
        assert_eq!(acc.len(), 99);
    }

    #[test]
    fn oversized_fragment_with_terminator_is_still_overflow() {
        let mut acc = LineAccumulator::new();
        let mut fragment = vec![b'x'; 99];
        fragment.push(b'\n');
        assert!(matches!(
            acc.push(&fragment),
            Err(LampError::Overflow { .. })
        ));
    }

    #[test]
    fn cleaned_strips_whitespace_and_control_bytes() {
        let mut acc = LineAccumulator::new();
        acc.push(b"  RES GET_TEMP 23.5\r\n").unwrap();
        assert_eq!(acc.cleaned(), "RES GET_TEMP 23.5");
    }
}
