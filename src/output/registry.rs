//! Sink trait and the ordered output registry.
//!
//! A [`Sink`] has two capabilities: [`handle`](Sink::handle) receives one
//! decoded frame, [`tick`](Sink::tick) runs non-blocking housekeeping once
//! per dispatch cycle.  The [`OutputRegistry`] owns every sink and keeps two
//! independent, append-only delivery lists, one per capability, so a sink
//! can take part in either, both, or neither.
//!
//! # Failure isolation
//!
//! A sink returning `Err` is logged and counted, then skipped: the next sink
//! in the list still receives the same frame (or tick).  One broken output
//! never starves the others.

use thiserror::Error;

use crate::queue::Frame;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors a sink may report from `handle` or `tick`.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink serialisation error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors from registry configuration.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    /// The id was not issued by this registry.
    #[error("unknown sink id {0}")]
    UnknownSink(usize),
}

// ---------------------------------------------------------------------------
// Sink trait
// ---------------------------------------------------------------------------

/// An output consumer.
///
/// Both capability methods default to doing nothing, so a sink implements
/// only the one it registers for.  Calls always arrive on the dispatch
/// thread; implementations must not block.
pub trait Sink: Send {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Consume one decoded frame.
    fn handle(&mut self, _frame: &Frame) -> Result<(), SinkError> {
        Ok(())
    }

    /// Periodic housekeeping, e.g. accepting clients or flushing buffers.
    fn tick(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Wraps a closure as an emit-only [`Sink`].
///
/// ```
/// use modes_rx::output::{EmitFn, OutputRegistry};
/// use modes_rx::queue::Frame;
///
/// let mut registry = OutputRegistry::new();
/// let id = registry.add(EmitFn::new("debug", |frame: &Frame| {
///     eprintln!("{}", frame.to_hex());
///     Ok(())
/// }));
/// registry.register_emit(id).unwrap();
/// ```
pub struct EmitFn<F> {
    name: String,
    f: F,
}

impl<F> EmitFn<F>
where
    F: FnMut(&Frame) -> Result<(), SinkError> + Send,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Sink for EmitFn<F>
where
    F: FnMut(&Frame) -> Result<(), SinkError> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&mut self, frame: &Frame) -> Result<(), SinkError> {
        (self.f)(frame)
    }
}

/// Wraps a closure as a poll-only [`Sink`].
pub struct PollFn<F> {
    name: String,
    f: F,
}

impl<F> PollFn<F>
where
    F: FnMut() -> Result<(), SinkError> + Send,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Sink for PollFn<F>
where
    F: FnMut() -> Result<(), SinkError> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self) -> Result<(), SinkError> {
        (self.f)()
    }
}

// ---------------------------------------------------------------------------
// OutputRegistry
// ---------------------------------------------------------------------------

/// Handle to a sink owned by an [`OutputRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkId(usize);

/// Ordered set of sinks with separate emit and poll delivery lists.
///
/// Built during single-threaded startup, then moved into the dispatcher;
/// nothing is ever removed or reordered.
#[derive(Default)]
pub struct OutputRegistry {
    sinks: Vec<Box<dyn Sink>>,
    emit: Vec<usize>,
    poll: Vec<usize>,
}

impl OutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `sink`.  It receives nothing until registered for
    /// a capability.
    pub fn add(&mut self, sink: impl Sink + 'static) -> SinkId {
        self.sinks.push(Box::new(sink));
        SinkId(self.sinks.len() - 1)
    }

    /// Append `id` to the emit list.
    pub fn register_emit(&mut self, id: SinkId) -> Result<(), RegistryError> {
        self.check(id)?;
        self.emit.push(id.0);
        Ok(())
    }

    /// Append `id` to the poll list.
    pub fn register_poll(&mut self, id: SinkId) -> Result<(), RegistryError> {
        self.check(id)?;
        self.poll.push(id.0);
        Ok(())
    }

    /// Deliver `frame` to every emit sink in registration order.
    ///
    /// Returns the number of sinks that failed.
    pub fn emit(&mut self, frame: &Frame) -> usize {
        let mut failures = 0;
        for &idx in &self.emit {
            let sink = &mut self.sinks[idx];
            if let Err(e) = sink.handle(frame) {
                log::warn!("output: {} failed to handle frame: {e}", sink.name());
                failures += 1;
            }
        }
        failures
    }

    /// Tick every poll sink in registration order.
    ///
    /// Returns the number of sinks that failed.
    pub fn poll(&mut self) -> usize {
        let mut failures = 0;
        for &idx in &self.poll {
            let sink = &mut self.sinks[idx];
            if let Err(e) = sink.tick() {
                log::warn!("output: {} tick failed: {e}", sink.name());
                failures += 1;
            }
        }
        failures
    }

    /// Number of sinks owned, registered or not.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn emit_count(&self) -> usize {
        self.emit.len()
    }

    pub fn poll_count(&self) -> usize {
        self.poll.len()
    }

    /// Sink names in emit order, for the startup log line.
    pub fn emit_names(&self) -> Vec<&str> {
        self.emit.iter().map(|&i| self.sinks[i].name()).collect()
    }

    fn check(&self, id: SinkId) -> Result<(), RegistryError> {
        if id.0 < self.sinks.len() {
            Ok(())
        } else {
            Err(RegistryError::UnknownSink(id.0))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    fn tagging(log: &Log, tag: &'static str) -> EmitFn<impl FnMut(&Frame) -> Result<(), SinkError>> {
        let log = Arc::clone(log);
        EmitFn::new(tag, move |frame: &Frame| {
            log.lock().unwrap().push(format!("{tag}:{}", frame.to_hex()));
            Ok(())
        })
    }

    #[test]
    fn emit_runs_in_registration_order_exactly_once() {
        let log: Log = Arc::default();
        let mut registry = OutputRegistry::new();
        for tag in ["c1", "c2", "c3"] {
            let id = registry.add(tagging(&log, tag));
            registry.register_emit(id).unwrap();
        }

        let failures = registry.emit(&Frame::from(vec![0xab]));
        assert_eq!(failures, 0);
        assert_eq!(*log.lock().unwrap(), vec!["c1:AB", "c2:AB", "c3:AB"]);
    }

    #[test]
    fn failing_sink_does_not_block_later_sinks() {
        let log: Log = Arc::default();
        let mut registry = OutputRegistry::new();

        let bad = registry.add(EmitFn::new("bad", |_: &Frame| Err(SinkError::Other("boom".into()))));
        let good = registry.add(tagging(&log, "good"));
        registry.register_emit(bad).unwrap();
        registry.register_emit(good).unwrap();

        assert_eq!(registry.emit(&Frame::from(vec![1])), 1);
        assert_eq!(registry.emit(&Frame::from(vec![2])), 1);
        assert_eq!(*log.lock().unwrap(), vec!["good:01", "good:02"]);
    }

    #[test]
    fn unregistered_sink_receives_nothing() {
        let log: Log = Arc::default();
        let mut registry = OutputRegistry::new();
        let _inert = registry.add(tagging(&log, "inert"));

        registry.emit(&Frame::from(vec![1]));
        registry.poll();
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.emit_count(), 0);
    }

    #[test]
    fn poll_list_is_independent_of_emit_list() {
        let ticks = Arc::new(Mutex::new(0u32));
        let mut registry = OutputRegistry::new();
        let id = {
            let ticks = Arc::clone(&ticks);
            registry.add(PollFn::new("ticker", move || {
                *ticks.lock().unwrap() += 1;
                Ok(())
            }))
        };
        registry.register_poll(id).unwrap();

        assert_eq!(registry.emit(&Frame::from(vec![1])), 0);
        registry.poll();
        registry.poll();
        assert_eq!(*ticks.lock().unwrap(), 2);
        assert_eq!(registry.poll_count(), 1);
    }

    #[test]
    fn failing_tick_is_counted() {
        let mut registry = OutputRegistry::new();
        let id = registry.add(PollFn::new("bad", || Err(SinkError::Other("nope".into()))));
        registry.register_poll(id).unwrap();
        assert_eq!(registry.poll(), 1);
    }

    #[test]
    fn foreign_id_is_rejected() {
        let mut other = OutputRegistry::new();
        other.add(PollFn::new("a", || Ok(())));
        let foreign = other.add(PollFn::new("b", || Ok(())));

        let mut registry = OutputRegistry::new();
        assert_eq!(
            registry.register_emit(foreign),
            Err(RegistryError::UnknownSink(1))
        );
    }

    #[test]
    fn emit_names_follow_order() {
        let log: Log = Arc::default();
        let mut registry = OutputRegistry::new();
        let b = registry.add(tagging(&log, "b"));
        let a = registry.add(tagging(&log, "a"));
        registry.register_emit(a).unwrap();
        registry.register_emit(b).unwrap();
        assert_eq!(registry.emit_names(), vec!["a", "b"]);
    }

    #[test]
    fn registry_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<OutputRegistry>();
    }
}
