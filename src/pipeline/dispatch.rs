//! Dispatch loop: moves frames from the queue to the output sinks.
//!
//! [`Dispatcher`] owns the [`OutputRegistry`] and the [`PipelineRunner`] and
//! runs on the main thread.  One cycle:
//!
//! ```text
//! poll every poll sink
//!   └─▶ try_pop_all() ──▶ emit each frame to every emit sink
//!         ├─ frames delivered         → next cycle
//!         ├─ empty, runner active     → sleep idle_interval (or until interrupt)
//!         └─ empty, runner done       → DrainingAndStopping → final drain → Stopped
//! interrupt at any point ─────────────────────────────────────────────▶ Stopped
//! ```
//!
//! On reaching `Stopped` the stage is asked to stop and the runner is
//! released with a bounded grace period.

use std::time::Duration;

use crate::config::DispatchConfig;
use crate::output::OutputRegistry;
use crate::queue::SharedFrameQueue;

use super::runner::PipelineRunner;
use super::shutdown::Shutdown;
use super::state::DispatchState;

// ---------------------------------------------------------------------------
// Outcomes and reports
// ---------------------------------------------------------------------------

/// Result of a single [`Dispatcher::cycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// This many frames were drained and delivered.
    Delivered(usize),
    /// Nothing queued; the pipeline is still running.
    Idle,
    /// Nothing queued and the pipeline has completed.
    PipelineFinished,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    PipelineFinished,
    Interrupted,
}

/// Running counters, updated every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub cycles: u64,
    pub frames: u64,
    pub sink_failures: u64,
}

/// Summary returned by [`Dispatcher::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub reason: StopReason,
    pub cycles: u64,
    /// Frames drained from the queue (delivered to zero or more sinks).
    pub frames: u64,
    /// Individual `handle`/`tick` calls that returned an error.
    pub sink_failures: u64,
    /// Frames evicted by a bounded queue before they could be drained.
    pub dropped: u64,
    /// `false` if the runner thread ignored the stop request and was detached.
    pub runner_joined: bool,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher {
    queue: SharedFrameQueue,
    registry: OutputRegistry,
    runner: PipelineRunner,
    idle_interval: Duration,
    shutdown_grace: Duration,
    state: DispatchState,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Build a dispatcher.  The registry must be fully configured: it is not
    /// reachable for registration once moved in here.
    pub fn new(
        queue: SharedFrameQueue,
        registry: OutputRegistry,
        runner: PipelineRunner,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            queue,
            registry,
            runner,
            idle_interval: config.idle_interval(),
            shutdown_grace: config.shutdown_grace(),
            state: DispatchState::Running,
            stats: DispatchStats::default(),
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Run one poll / drain / completion-check cycle.  Never blocks.
    pub fn cycle(&mut self) -> CycleOutcome {
        self.stats.cycles += 1;
        self.stats.sink_failures += self.registry.poll() as u64;

        let delivered = self.drain();
        if delivered > 0 {
            CycleOutcome::Delivered(delivered)
        } else if self.runner.is_done() {
            CycleOutcome::PipelineFinished
        } else {
            CycleOutcome::Idle
        }
    }

    /// Cycle until the pipeline finishes or `shutdown` is triggered, then
    /// stop the stage and release the runner.
    pub async fn run(mut self, shutdown: Shutdown) -> DispatchReport {
        log::info!(
            "dispatch: running with {} emit sink(s) {:?}, {} poll sink(s)",
            self.registry.emit_count(),
            self.registry.emit_names(),
            self.registry.poll_count()
        );

        let reason = loop {
            if shutdown.is_triggered() {
                break StopReason::Interrupted;
            }

            match self.cycle() {
                CycleOutcome::Delivered(n) => {
                    log::trace!("dispatch: delivered {n} frame(s)");
                    tokio::task::yield_now().await;
                }
                CycleOutcome::Idle => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.idle_interval) => {}
                        _ = shutdown.wait() => {}
                    }
                }
                CycleOutcome::PipelineFinished => {
                    self.final_drain();
                    break StopReason::PipelineFinished;
                }
            }
        };

        self.stop(reason).await
    }

    /// Enter `DrainingAndStopping` and deliver anything pushed between the
    /// cycle's empty drain and its completion check.
    fn final_drain(&mut self) -> usize {
        self.state = DispatchState::DrainingAndStopping;
        log::debug!("dispatch: pipeline finished, {}", self.state.label());
        let late = self.drain();
        if late > 0 {
            log::debug!("dispatch: final drain delivered {late} frame(s)");
        }
        late
    }

    fn drain(&mut self) -> usize {
        let frames = self.queue.try_pop_all();
        for frame in &frames {
            self.stats.sink_failures += self.registry.emit(frame) as u64;
        }
        self.stats.frames += frames.len() as u64;
        frames.len()
    }

    async fn stop(mut self, reason: StopReason) -> DispatchReport {
        self.state = DispatchState::Stopped;
        if reason == StopReason::Interrupted {
            log::info!("dispatch: interrupted, stopping pipeline");
        }

        self.runner.stop();
        let runner_joined = self.runner.release(self.shutdown_grace).await;

        let report = DispatchReport {
            reason,
            cycles: self.stats.cycles,
            frames: self.stats.frames,
            sink_failures: self.stats.sink_failures,
            dropped: self.queue.dropped(),
            runner_joined,
        };
        log::info!(
            "dispatch: {} after {} cycle(s), {} frame(s), {} sink failure(s), {} dropped",
            self.state.label(),
            report.cycles,
            report.frames,
            report.sink_failures,
            report.dropped
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
