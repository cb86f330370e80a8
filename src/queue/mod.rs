//! Frame handoff between the pipeline stage and the dispatch loop.
//!
//! # Flow
//!
//! ```text
//! PipelineStage (runner thread) ──push──▶ FrameQueue ──try_pop_all──▶ Dispatcher (main thread)
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use modes_rx::queue::{Frame, FrameQueue};
//!
//! let queue = FrameQueue::unbounded();
//! queue.push(Frame::from(vec![0x8d, 0x48, 0x40, 0xd6]));
//!
//! let frames = queue.try_pop_all();
//! assert_eq!(frames.len(), 1);
//! assert!(queue.try_pop_all().is_empty());
//! ```

pub mod buffer;
pub mod frame;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use buffer::{FrameQueue, SharedFrameQueue};
pub use frame::Frame;
