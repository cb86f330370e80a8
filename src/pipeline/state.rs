//! Dispatch loop state machine.

/// States of the dispatch loop.
///
/// The state machine transitions are:
///
/// ```text
/// Running ──queue empty + runner done──▶ DrainingAndStopping
///                                         ──final drain──▶ Stopped
/// Running ──interrupt──▶ Stopped
/// ```
///
/// `Stopped` is terminal; the dispatcher is consumed when it gets there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    /// Cycling: poll sinks, drain the queue, deliver frames.
    #[default]
    Running,

    /// The pipeline has finished and the queue was empty; one last drain
    /// catches frames pushed between the empty drain and the completion check.
    DrainingAndStopping,

    /// The loop has exited and the stage has been asked to stop.
    Stopped,
}

impl DispatchState {
    /// Returns `true` once the loop can no longer deliver frames.
    ///
    /// ```
    /// use modes_rx::pipeline::DispatchState;
    ///
    /// assert!(!DispatchState::Running.is_terminal());
    /// assert!(!DispatchState::DrainingAndStopping.is_terminal());
    /// assert!(DispatchState::Stopped.is_terminal());
    /// ```
    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Stopped)
    }

    /// A short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            DispatchState::Running => "running",
            DispatchState::DrainingAndStopping => "draining",
            DispatchState::Stopped => "stopped",
        }
    }
}
