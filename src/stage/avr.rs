//! AVR text framing used by capture files and receiver feeds.
//!
//! Each line carries one frame as hex, in one of three shapes:
//!
//! ```text
//! *8D4840D6202CC371C32CE0576098;         plain AVR
//! @0000A1B2C3D48D4840D6202CC371C32CE0576098;   AVR with 48-bit timestamp
//! 8D4840D6202CC371C32CE0576098           bare hex
//! ```

use crate::queue::Frame;

/// Mode S short frame length (56 bits).
pub const SHORT_FRAME_LEN: usize = 7;
/// Mode S long frame length (112 bits).
pub const LONG_FRAME_LEN: usize = 14;

/// Hex digits of the `@` timestamp prefix.
const TIMESTAMP_DIGITS: usize = 12;

/// Parse one AVR line into frame bytes.
///
/// Returns `None` for blank lines, comments (`#`) and anything that is not
/// an even-length hex payload.
///
/// ```
/// use modes_rx::stage::avr::parse_line;
///
/// assert_eq!(parse_line("*5D4840D6;"), Some(vec![0x5d, 0x48, 0x40, 0xd6]));
/// assert_eq!(parse_line("@0000000000015D4840D6;"), Some(vec![0x5d, 0x48, 0x40, 0xd6]));
/// assert_eq!(parse_line("# comment"), None);
/// ```
pub fn parse_line(line: &str) -> Option<Vec<u8>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let body = if let Some(rest) = line.strip_prefix('*') {
        rest.strip_suffix(';')?
    } else if let Some(rest) = line.strip_prefix('@') {
        let rest = rest.strip_suffix(';')?;
        rest.get(TIMESTAMP_DIGITS..)?
    } else {
        line.strip_suffix(';').unwrap_or(line)
    };

    if body.is_empty() {
        return None;
    }
    hex::decode(body).ok()
}

/// Returns `true` when `bytes` has a valid Mode S frame length.
pub fn is_modes_length(bytes: &[u8]) -> bool {
    matches!(bytes.len(), SHORT_FRAME_LEN | LONG_FRAME_LEN)
}

// ---------------------------------------------------------------------------
// LineDecoder
// ---------------------------------------------------------------------------

/// Turns AVR lines into [`Frame`]s, applying the frame-length filter and
/// keeping counts for the end-of-run log line.
#[derive(Debug, Default)]
pub struct LineDecoder {
    output_all: bool,
    accepted: u64,
    skipped: u64,
}

impl LineDecoder {
    /// `output_all` passes frames of any length; otherwise only valid
    /// Mode S lengths are accepted.
    pub fn new(output_all: bool) -> Self {
        Self {
            output_all,
            ..Self::default()
        }
    }

    /// Decode one line.  `None` for unparseable or filtered lines.
    pub fn decode(&mut self, line: &str) -> Option<Frame> {
        match parse_line(line) {
            Some(bytes) if self.output_all || is_modes_length(&bytes) => {
                self.accepted += 1;
                Some(Frame::from(bytes))
            }
            Some(bytes) => {
                log::debug!("avr: skipping {}-byte frame", bytes.len());
                self.skipped += 1;
                None
            }
            None => {
                if !line.trim().is_empty() {
                    log::debug!("avr: unparseable line {:?}", line.trim());
                    self.skipped += 1;
                }
                None
            }
        }
    }

    /// Frames returned so far.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Non-blank lines rejected so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: &str = "8D4840D6202CC371C32CE0576098";

    #[test]
    fn parses_plain_avr() {
        let bytes = parse_line(&format!("*{LONG};")).unwrap();
        assert_eq!(bytes.len(), LONG_FRAME_LEN);
        assert_eq!(bytes[0], 0x8d);
        assert_eq!(bytes[13], 0x98);
    }

    #[test]
    fn strips_timestamp_prefix() {
        let bytes = parse_line(&format!("@0123456789AB{LONG};")).unwrap();
        assert_eq!(bytes, parse_line(LONG).unwrap());
    }

    #[test]
    fn bare_hex_with_and_without_semicolon() {
        assert_eq!(parse_line("5d4840d6"), Some(vec![0x5d, 0x48, 0x40, 0xd6]));
        assert_eq!(parse_line("5d4840d6;"), Some(vec![0x5d, 0x48, 0x40, 0xd6]));
    }

    #[test]
    fn lower_case_hex_is_accepted() {
        assert_eq!(parse_line("*8d4840d6;"), Some(vec![0x8d, 0x48, 0x40, 0xd6]));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_line("  *5D;\r\n"), Some(vec![0x5d]));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("# capture header"), None);
        assert_eq!(parse_line("*5D4"), None); // missing terminator
        assert_eq!(parse_line("*5D4;"), None); // odd length
        assert_eq!(parse_line("*ZZ;"), None);
        assert_eq!(parse_line("*;"), None);
        assert_eq!(parse_line("@0123;"), None); // timestamp cut short
        assert_eq!(parse_line("@000000000001;"), None); // timestamp, no payload
    }

    #[test]
    fn decoder_filters_lengths_unless_output_all() {
        let mut strict = LineDecoder::new(false);
        assert!(strict.decode(&format!("*{LONG};")).is_some());
        assert!(strict.decode("*5D4840D6;").is_none());
        assert!(strict.decode("garbage").is_none());
        assert!(strict.decode("").is_none());
        assert_eq!(strict.accepted(), 1);
        assert_eq!(strict.skipped(), 2);

        let mut all = LineDecoder::new(true);
        let frame = all.decode("*5D4840D6;").unwrap();
        assert_eq!(frame.to_hex(), "5D4840D6");
        assert_eq!(all.accepted(), 1);
    }

    #[test]
    fn modes_lengths() {
        assert!(is_modes_length(&[0; SHORT_FRAME_LEN]));
        assert!(is_modes_length(&[0; LONG_FRAME_LEN]));
        assert!(!is_modes_length(&[0; 8]));
        assert!(!is_modes_length(&[]));
    }
}
