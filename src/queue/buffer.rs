//! Thread-safe FIFO queue of decoded [`Frame`]s.
//!
//! The pipeline stage pushes from its runner thread; the dispatch loop takes
//! everything queued so far with [`FrameQueue::try_pop_all`].  Neither side
//! ever blocks beyond a short critical section.
//!
//! ## Backpressure
//!
//! [`FrameQueue::unbounded`] never drops anything: a producer that outruns
//! the dispatch loop grows the queue without limit.  [`FrameQueue::bounded`]
//! caps the backlog and **overwrites the oldest** frame once full, counting
//! every discarded frame in [`FrameQueue::dropped`].  Live traffic is more
//! useful than a stale backlog, so the newest frames win.
//!
//! # Example
//!
//! ```rust
//! use modes_rx::queue::{Frame, FrameQueue};
//!
//! let queue = FrameQueue::bounded(2);
//! for b in [1u8, 2, 3] {
//!     queue.push(Frame::from(vec![b]));
//! }
//! let frames = queue.try_pop_all();
//! assert_eq!(frames, vec![Frame::from(vec![2]), Frame::from(vec![3])]);
//! assert_eq!(queue.dropped(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::Frame;

/// Queue handle shared between the stage and the dispatcher.
pub type SharedFrameQueue = Arc<FrameQueue>;

// ---------------------------------------------------------------------------
// FrameQueue
// ---------------------------------------------------------------------------

/// FIFO frame queue with an optional drop-oldest capacity.
#[derive(Debug)]
pub struct FrameQueue {
    frames: Mutex<VecDeque<Frame>>,
    /// `None` means unbounded.
    capacity: Option<usize>,
    dropped: AtomicU64,
}

impl FrameQueue {
    /// Create a queue that never discards frames.
    pub fn unbounded() -> Self {
        Self {
            frames: Mutex::new(VecDeque::new()),
            capacity: None,
            dropped: AtomicU64::new(0),
        }
    }

    /// Create a queue holding at most `capacity` frames.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn bounded(capacity: usize) -> Self {
        assert!(capacity > 0, "FrameQueue capacity must be > 0");
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: Some(capacity),
            dropped: AtomicU64::new(0),
        }
    }

    /// Build from an optional capacity (`None` or `Some(0)` → unbounded).
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        match capacity {
            Some(n) if n > 0 => Self::bounded(n),
            _ => Self::unbounded(),
        }
    }

    /// Append `frame` to the tail of the queue.
    ///
    /// Never blocks the producer for longer than the lock hold time of a
    /// concurrent [`try_pop_all`](Self::try_pop_all), which is a single
    /// pointer swap.
    pub fn push(&self, frame: Frame) {
        let mut frames = self.lock();
        if let Some(cap) = self.capacity {
            if frames.len() >= cap {
                frames.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
        frames.push_back(frame);
    }

    /// Remove and return every queued frame in enqueue order.
    ///
    /// Returns an empty `Vec` when nothing is queued.  Never blocks waiting
    /// for frames.
    pub fn try_pop_all(&self) -> Vec<Frame> {
        let taken = std::mem::take(&mut *self.lock());
        taken.into()
    }

    /// Number of frames currently queued.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when no frames are queued.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Configured capacity, `None` for an unbounded queue.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Total frames discarded by the drop-oldest policy since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
