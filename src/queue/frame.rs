//! Decoded frame payload.

use std::fmt;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One decoded message as produced by the pipeline stage.
///
/// The payload is opaque to the dispatch layer: it is never inspected,
/// only handed by reference to each sink.  The bytes are immutable once the
/// frame is built.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    bytes: Box<[u8]>,
}

impl Frame {
    /// Raw payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-length payload.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Upper-case hex rendering of the payload, e.g. `"8D4840D6"`.
    ///
    /// ```
    /// use modes_rx::queue::Frame;
    ///
    /// let frame = Frame::from(vec![0x8d, 0x0a]);
    /// assert_eq!(frame.to_hex(), "8D0A");
    /// ```
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.bytes)
    }
}

impl From<Vec<u8>> for Frame {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }
}

impl From<&[u8]> for Frame {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
