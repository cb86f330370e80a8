//! Pipeline runner: drives a [`PipelineStage`] on its own OS thread.
//!
//! [`PipelineRunner::start`] spawns the `pipeline-runner` thread, which
//! blocks in [`PipelineStage::run`] for the pipeline's whole lifetime.  When
//! `run` returns (input exhausted, stopped, failed) or panics, the thread
//! publishes completion on a `watch` channel; the dispatch loop reads it
//! with [`is_done`](PipelineRunner::is_done) without blocking.
//!
//! # Shutdown
//!
//! Nothing relies on the thread being abandoned at process exit.
//! [`stop`](PipelineRunner::stop) asks the stage to halt;
//! [`release`](PipelineRunner::release) then waits a bounded grace period
//! for completion and joins the thread, or detaches it with a warning if the
//! stage ignored the request.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use crate::stage::PipelineStage;

// ---------------------------------------------------------------------------
// RunnerError
// ---------------------------------------------------------------------------

/// Errors that can occur while starting the runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The OS refused to create the runner thread.
    #[error("failed to spawn pipeline-runner thread: {0}")]
    Spawn(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// CompletionGuard
// ---------------------------------------------------------------------------

/// Publishes completion when dropped, so a panicking stage still reads as
/// finished rather than leaving the dispatch loop waiting forever.
struct CompletionGuard(watch::Sender<bool>);

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

// ---------------------------------------------------------------------------
// PipelineRunner
// ---------------------------------------------------------------------------

/// Handle to a running pipeline thread.
pub struct PipelineRunner {
    stage: Arc<dyn PipelineStage>,
    done: watch::Receiver<bool>,
    thread: Option<JoinHandle<()>>,
}

impl PipelineRunner {
    /// Spawn the runner thread and return immediately.
    ///
    /// # Errors
    ///
    /// [`RunnerError::Spawn`] if the thread cannot be created.
    pub fn start(stage: Arc<dyn PipelineStage>) -> Result<Self, RunnerError> {
        let (done_tx, done_rx) = watch::channel(false);
        let thread_stage = Arc::clone(&stage);

        let thread = std::thread::Builder::new()
            .name("pipeline-runner".into())
            .spawn(move || {
                let _guard = CompletionGuard(done_tx);
                let name = thread_stage.name().to_string();
                log::debug!("runner: {name} started");

                match thread_stage.run() {
                    Ok(()) => log::info!("runner: {name} finished"),
                    Err(e) => log::error!("runner: {name} stopped with error: {e}"),
                }
            })?;

        Ok(Self {
            stage,
            done: done_rx,
            thread: Some(thread),
        })
    }

    /// Returns `true` once the stage's `run` has returned.
    pub fn is_done(&self) -> bool {
        *self.done.borrow()
    }

    /// Ask the stage to halt.  Does not wait; safe to call repeatedly.
    pub fn stop(&self) {
        self.stage.stop();
    }

    /// Wait up to `grace` for completion, then join the thread.
    ///
    /// Returns `true` if the thread finished and was joined, `false` if it
    /// was still running and had to be detached.
    pub async fn release(mut self, grace: Duration) -> bool {
        let finished = tokio::time::timeout(grace, self.done.wait_for(|done| *done))
            .await
            .is_ok();

        let Some(thread) = self.thread.take() else {
            return finished;
        };

        if !finished {
            log::warn!(
                "runner: {} did not stop within {grace:?}; detaching its thread",
                self.stage.name()
            );
            return false;
        }

        // Completion is published as the thread's last action, so this join
        // does not wait on pipeline work.
        if thread.join().is_err() {
            log::error!("runner: {} panicked", self.stage.name());
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
