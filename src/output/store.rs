//! Persistent frame store: append-only JSON lines.
//!
//! Every frame becomes one [`StoredFrame`] record.  Writes go through a
//! `BufWriter`; the poll tick flushes it so records reach disk within one
//! dispatch cycle even when traffic is sparse.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::registry::{Sink, SinkError};
use crate::queue::Frame;

// ---------------------------------------------------------------------------
// StoredFrame
// ---------------------------------------------------------------------------

/// One persisted frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFrame {
    /// Wall-clock receive time, milliseconds since the Unix epoch.
    pub received_at_ms: u64,
    /// Payload length in bytes.
    pub len: usize,
    /// Upper-case hex payload.
    pub hex: String,
}

impl StoredFrame {
    fn now(frame: &Frame) -> Self {
        let received_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            received_at_ms,
            len: frame.len(),
            hex: frame.to_hex(),
        }
    }
}

// ---------------------------------------------------------------------------
// StoreSink
// ---------------------------------------------------------------------------

/// Emit + poll sink appending frames to a JSON-lines file.
pub struct StoreSink {
    path: PathBuf,
    out: BufWriter<File>,
    pending: usize,
}

impl StoreSink {
    /// Open (or create) `path` for appending, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        log::info!("store: appending frames to {}", path.display());

        Ok(Self {
            path,
            out: BufWriter::new(file),
            pending: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for StoreSink {
    fn name(&self) -> &str {
        "store"
    }

    fn handle(&mut self, frame: &Frame) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.out, &StoredFrame::now(frame))?;
        self.out.write_all(b"\n")?;
        self.pending += 1;
        Ok(())
    }

    fn tick(&mut self) -> Result<(), SinkError> {
        if self.pending > 0 {
            self.out.flush()?;
            log::trace!("store: flushed {} records", self.pending);
            self.pending = 0;
        }
        Ok(())
    }
}

impl Drop for StoreSink {
    fn drop(&mut self) {
        if let Err(e) = self.out.flush() {
            log::warn!("store: final flush of {} failed: {e}", self.path.display());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_records(path: &Path) -> Vec<StoredFrame> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn tick_flushes_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frames.jsonl");
        let mut sink = StoreSink::open(&path).unwrap();

        sink.handle(&Frame::from(vec![0x8d, 0x48])).unwrap();
        sink.handle(&Frame::from(vec![0x5d])).unwrap();
        sink.tick().unwrap();

        let records = read_records(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].hex, "8D48");
        assert_eq!(records[0].len, 2);
        assert_eq!(records[1].hex, "5D");
        assert!(records[0].received_at_ms > 0);
    }

    #[test]
    fn drop_flushes_pending_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frames.jsonl");
        {
            let mut sink = StoreSink::open(&path).unwrap();
            sink.handle(&Frame::from(vec![0x01])).unwrap();
        }
        assert_eq!(read_records(&path).len(), 1);
    }

    #[test]
    fn reopening_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("frames.jsonl");
        for b in [1u8, 2] {
            let mut sink = StoreSink::open(&path).unwrap();
            sink.handle(&Frame::from(vec![b])).unwrap();
        }

        let hex: Vec<String> = read_records(&path).into_iter().map(|r| r.hex).collect();
        assert_eq!(hex, vec!["01", "02"]);
    }
}
