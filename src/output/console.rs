//! Console printer: one AVR line per frame.

use std::io::{self, Write};

use super::registry::{Sink, SinkError};
use crate::queue::Frame;

/// Emit sink writing `*HEX;` lines to a writer (stdout by default).
pub struct ConsoleSink<W: Write + Send> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Sink for ConsoleSink<W> {
    fn name(&self) -> &str {
        "console"
    }

    fn handle(&mut self, frame: &Frame) -> Result<(), SinkError> {
        writeln!(self.out, "*{};", frame.to_hex())?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_avr_lines() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.handle(&Frame::from(vec![0x8d, 0x48])).unwrap();
        sink.handle(&Frame::from(vec![0x5d])).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "*8D48;\n*5D;\n");
    }

    #[test]
    fn tick_is_a_no_op() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.tick().unwrap();
        assert!(sink.into_inner().is_empty());
    }
}
