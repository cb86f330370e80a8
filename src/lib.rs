//! Runtime controller for a Mode S receive pipeline.
//!
//! A [`stage::PipelineStage`] runs on its own thread and pushes decoded
//! frames into a [`queue::FrameQueue`].  The [`pipeline::Dispatcher`] drains
//! that queue on the main thread and fans every frame out to the sinks in an
//! [`output::OutputRegistry`], giving stateful sinks a non-blocking tick once
//! per cycle.

pub mod cli;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod queue;
pub mod stage;
