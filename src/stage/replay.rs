//! Capture replay: feeds a recorded AVR frame log through the pipeline.
//!
//! The file is opened when the stage is built so a bad path fails at
//! startup, then consumed by the first [`run`](PipelineStage::run) call.
//! Replay ends at end of file or on [`stop`](PipelineStage::stop).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::avr::LineDecoder;
use super::engine::{PipelineStage, StageError};
use crate::queue::SharedFrameQueue;

// ---------------------------------------------------------------------------
// ReplayStage
// ---------------------------------------------------------------------------

/// Pipeline stage backed by a capture file.
pub struct ReplayStage {
    path: PathBuf,
    reader: Mutex<Option<BufReader<File>>>,
    queue: SharedFrameQueue,
    output_all: bool,
    /// Pause after each queued frame; `None` replays as fast as possible.
    interval: Option<Duration>,
    stop: AtomicBool,
}

impl ReplayStage {
    /// Open `path` for replay into `queue`.
    ///
    /// # Errors
    ///
    /// [`StageError::Open`] when the file cannot be opened.
    pub fn open(
        path: impl AsRef<Path>,
        queue: SharedFrameQueue,
        output_all: bool,
        interval: Option<Duration>,
    ) -> Result<Self, StageError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| StageError::Open {
            path: path.display().to_string(),
            source,
        })?;

        Ok(Self {
            path,
            reader: Mutex::new(Some(BufReader::new(file))),
            queue,
            output_all,
            interval,
            stop: AtomicBool::new(false),
        })
    }
}

impl PipelineStage for ReplayStage {
    fn name(&self) -> &str {
        "replay"
    }

    fn run(&self) -> Result<(), StageError> {
        let Some(reader) = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            log::warn!("replay: {} already consumed", self.path.display());
            return Ok(());
        };

        let mut decoder = LineDecoder::new(self.output_all);

        for line in reader.lines() {
            if self.stop.load(Ordering::Relaxed) {
                log::info!("replay: stop requested");
                break;
            }

            let line = line?;
            if let Some(frame) = decoder.decode(&line) {
                self.queue.push(frame);
                if let Some(interval) = self.interval {
                    std::thread::sleep(interval);
                }
            }
        }

        log::info!(
            "replay: {} frames queued, {} lines skipped from {}",
            decoder.accepted(),
            decoder.skipped(),
            self.path.display()
        );
        Ok(())
    }

    fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// A recording was captured at a fixed frequency and cannot be retuned.
    fn retune(&self, frequency_hz: f64) -> bool {
        log::debug!("replay: ignoring retune to {frequency_hz} Hz");
        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
