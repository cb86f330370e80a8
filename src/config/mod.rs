//! Configuration module for the Mode S receiver controller.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the sample
//! source, radio front end, outputs and dispatch loop, `AppPaths` for
//! cross-platform directories, and TOML persistence via
//! `AppConfig::load_from` / `AppConfig::save_to`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, DispatchConfig, OutputConfig, RadioConfig, SourceConfig};
