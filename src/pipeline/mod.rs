//! Pipeline lifecycle and the dispatch loop.
//!
//! # Architecture
//!
//! ```text
//! pipeline-runner thread              main thread (current-thread tokio runtime)
//! ──────────────────────              ───────────────────────────────────────────
//! PipelineStage::run()                Dispatcher::run(Shutdown)
//!   │  push                             │  registry.poll()
//!   ▼                                   │  queue.try_pop_all() ──▶ registry.emit()
//! FrameQueue ───────────────────────────┘
//!   │                                   │
//! run() returns ──watch──▶ is_done() ───┘──▶ final drain ──▶ stop + release
//!                                       ▲
//!                        ctrl_c ──▶ Shutdown::trigger()
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use modes_rx::config::AppConfig;
//! use modes_rx::output::{ConsoleSink, OutputRegistry};
//! use modes_rx::pipeline::{Dispatcher, PipelineRunner, Shutdown};
//! use modes_rx::queue::FrameQueue;
//! use modes_rx::stage;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::default();
//!     let queue = Arc::new(FrameQueue::unbounded());
//!     let stage = stage::configure(&config, Arc::clone(&queue))?;
//!
//!     let mut registry = OutputRegistry::new();
//!     let console = registry.add(ConsoleSink::stdout());
//!     registry.register_emit(console)?;
//!
//!     let runner = PipelineRunner::start(stage)?;
//!     let report = Dispatcher::new(queue, registry, runner, &config.dispatch)
//!         .run(Shutdown::new())
//!         .await;
//!     println!("{} frames", report.frames);
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod runner;
pub mod shutdown;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use dispatch::{CycleOutcome, DispatchReport, DispatchStats, Dispatcher, StopReason};
pub use runner::{PipelineRunner, RunnerError};
pub use shutdown::Shutdown;
pub use state::DispatchState;
