//! Core pipeline stage trait and error type.
//!
//! # Overview
//!
//! [`PipelineStage`] is the interface the runner and dispatch loop use to
//! drive whatever turns a sample stream into decoded frames.  It is
//! object-safe and `Send + Sync` so one instance can be shared between the
//! runner thread (which blocks in [`run`](PipelineStage::run)) and the
//! dispatch thread (which calls [`stop`](PipelineStage::stop)).
//!
//! [`MockStage`] (available under `#[cfg(test)]`) pushes a scripted list of
//! frames and then finishes, fails, panics or idles until stopped.

use thiserror::Error;

// ---------------------------------------------------------------------------
// StageError
// ---------------------------------------------------------------------------

/// All errors that can arise from a pipeline stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// The capture file could not be opened.
    #[error("cannot open capture {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The receiver could not be reached.
    #[error("cannot connect to receiver {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while the stage was running.
    #[error("stage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// PipelineStage trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for the frame-producing pipeline.
///
/// # Contract
///
/// - [`run`](Self::run) blocks until the input is exhausted, [`stop`] is
///   called, or a fatal error occurs.  Every decoded frame is pushed onto
///   the stage's frame queue before `run` returns.
/// - [`stop`] may be called from any thread, any number of times.
/// - [`retune`](Self::retune) reports whether the front end accepted the
///   frequency; a `false` leaves the previous tuning in place.
///
/// [`stop`]: Self::stop
pub trait PipelineStage: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Run the pipeline to completion.
    fn run(&self) -> Result<(), StageError>;

    /// Ask a running pipeline to return from [`run`](Self::run).
    fn stop(&self);

    /// Retune the front end to `frequency_hz`.
    fn retune(&self, frequency_hz: f64) -> bool;
}

// Compile-time assertion: Box<dyn PipelineStage> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn PipelineStage>) {}
};

// ---------------------------------------------------------------------------
// MockStage  (test-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
pub use mock::{MockBehaviour, MockStage};

#[cfg(test)]
mod mock {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use super::{PipelineStage, StageError};
    use crate::queue::{Frame, SharedFrameQueue};

    /// What [`MockStage::run`] does after pushing its frames.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum MockBehaviour {
        /// Return `Ok(())`.
        Finish,
        /// Return an I/O error.
        Fail,
        /// Panic inside `run`.
        Panic,
        /// Keep running until `stop` is called.
        RunUntilStopped,
    }

    /// A test double that pushes pre-configured frames without any sample
    /// source.
    pub struct MockStage {
        queue: SharedFrameQueue,
        frames: Vec<Frame>,
        behaviour: MockBehaviour,
        retune_ok: bool,
        stopped: AtomicBool,
        stop_calls: AtomicUsize,
    }

    impl MockStage {
        pub fn new(queue: SharedFrameQueue, frames: Vec<Frame>, behaviour: MockBehaviour) -> Self {
            Self {
                queue,
                frames,
                behaviour,
                retune_ok: true,
                stopped: AtomicBool::new(false),
                stop_calls: AtomicUsize::new(0),
            }
        }

        /// Make every `retune` call fail.
        pub fn rejecting_retune(mut self) -> Self {
            self.retune_ok = false;
            self
        }

        pub fn stop_calls(&self) -> usize {
            self.stop_calls.load(Ordering::SeqCst)
        }
    }

    impl PipelineStage for MockStage {
        fn name(&self) -> &str {
            "mock"
        }

        fn run(&self) -> Result<(), StageError> {
            for frame in &self.frames {
                self.queue.push(frame.clone());
            }
            match self.behaviour {
                MockBehaviour::Finish => Ok(()),
                MockBehaviour::Fail => Err(StageError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "mock failure",
                ))),
                MockBehaviour::Panic => panic!("mock stage panicked"),
                MockBehaviour::RunUntilStopped => {
                    while !self.stopped.load(Ordering::SeqCst) {
                        std::thread::sleep(Duration::from_millis(5));
                    }
                    Ok(())
                }
            }
        }

        fn stop(&self) {
            self.stop_calls.fetch_add(1, Ordering::SeqCst);
            self.stopped.store(true, Ordering::SeqCst);
        }

        fn retune(&self, _frequency_hz: f64) -> bool {
            self.retune_ok
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
