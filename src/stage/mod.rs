//! Pipeline stage module: the frame producer driven by the runner.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                 PipelineStage (trait)                 │
//! │                                                       │
//! │   configure(AppConfig) ──┬──▶ ReplayStage (file)      │
//! │                          └──▶ RemoteStage (host:port) │
//! │                                     │                 │
//! │                                     ▼                 │
//! │                      LineDecoder (AVR) ──▶ FrameQueue │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use modes_rx::config::AppConfig;
//! use modes_rx::queue::FrameQueue;
//! use modes_rx::stage;
//!
//! let queue = Arc::new(FrameQueue::unbounded());
//! let stage = stage::configure(&AppConfig::default(), Arc::clone(&queue))
//!     .expect("receiver unreachable");
//!
//! stage.run().unwrap(); // blocks until the feed ends
//! println!("{} frames", queue.try_pop_all().len());
//! ```

pub mod avr;
pub mod configure;
pub mod engine;
pub mod remote;
pub mod replay;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use avr::LineDecoder;
pub use configure::{configure, tune, unapplied_settings};
pub use engine::{PipelineStage, StageError};
pub use remote::RemoteStage;
pub use replay::ReplayStage;

// test-only re-export so other modules' tests can import MockStage directly.
#[cfg(test)]
pub use engine::{MockBehaviour, MockStage};
