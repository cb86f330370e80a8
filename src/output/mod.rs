//! Output sinks and the registry that fans frames out to them.
//!
//! This module provides:
//! * [`Sink`]: the two-capability interface (`handle` / `tick`).
//! * [`OutputRegistry`]: ordered emit and poll lists over owned sinks.
//! * [`ConsoleSink`]: AVR lines on stdout.
//! * [`StoreSink`]: append-only JSON-lines frame store.
//! * [`BroadcastSink`]: line-oriented TCP broadcast.
//! * [`EmitFn`] / [`PollFn`]: closure adapters.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use modes_rx::output::{BroadcastSink, ConsoleSink, OutputRegistry};
//!
//! let mut registry = OutputRegistry::new();
//!
//! let server = registry.add(BroadcastSink::bind(30003).unwrap());
//! registry.register_emit(server).unwrap();
//! registry.register_poll(server).unwrap(); // accept clients every cycle
//!
//! let console = registry.add(ConsoleSink::stdout());
//! registry.register_emit(console).unwrap();
//! ```

pub mod broadcast;
pub mod console;
pub mod registry;
pub mod store;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use broadcast::BroadcastSink;
pub use console::ConsoleSink;
pub use registry::{EmitFn, OutputRegistry, PollFn, RegistryError, Sink, SinkError, SinkId};
pub use store::{StoreSink, StoredFrame};
