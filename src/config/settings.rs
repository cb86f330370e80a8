//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  The resolved
//! [`AppConfig`] is an immutable snapshot: it is built once in `main`
//! (file, then command-line overrides) and only read afterwards.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// SourceConfig
// ---------------------------------------------------------------------------

/// Where the pipeline stage reads its input from.
///
/// ```toml
/// [source]
/// kind = "file"
/// path = "capture.avr"
/// interval_ms = 5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Live receiver reached through a `host:port` descriptor.
    Device {
        /// Receiver address, e.g. `"localhost:30002"`.
        descriptor: String,
    },
    /// Recorded capture replayed from disk.
    File {
        /// Capture file path.
        path: PathBuf,
        /// Optional pause between replayed frames, in milliseconds.
        #[serde(default)]
        interval_ms: Option<u64>,
    },
}

impl SourceConfig {
    /// Returns `true` for sources that have a tunable front end.
    pub fn is_device(&self) -> bool {
        matches!(self, SourceConfig::Device { .. })
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Device {
            descriptor: "localhost:30002".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RadioConfig
// ---------------------------------------------------------------------------

/// Radio front-end and detector parameters handed to the pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Receive frequency in Hz.
    pub frequency_hz: f64,
    /// RF gain in dB.  `None` leaves the front end at its own default.
    pub gain_db: Option<f32>,
    /// ADC sample rate in samples per second.
    pub sample_rate: u32,
    /// Pulse detection threshold above noise, in dB.
    pub threshold_db: f32,
    /// Pass frames of any length instead of only valid Mode S lengths.
    pub output_all: bool,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 1090e6,
            gain_db: None,
            sample_rate: 4_000_000,
            threshold_db: 3.0,
            output_all: false,
        }
    }
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// Which sinks are registered with the output registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Print every frame to stdout.
    pub console: bool,
    /// Append every frame to the persistent frame store.
    pub database: bool,
    /// Frame store location.  `None` uses [`AppPaths::store_file`].
    pub store_path: Option<PathBuf>,
    /// Broadcast frames to TCP clients.
    pub broadcast: bool,
    /// Listening port for the broadcast server.
    pub broadcast_port: u16,
}

impl OutputConfig {
    /// Effective frame store path.
    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| AppPaths::new().store_file)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            console: true,
            database: false,
            store_path: None,
            broadcast: false,
            broadcast_port: 30003,
        }
    }
}

// ---------------------------------------------------------------------------
// DispatchConfig
// ---------------------------------------------------------------------------

/// Timing and queue settings for the dispatch loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Sleep between cycles that found the queue empty, in milliseconds.
    pub idle_interval_ms: u64,
    /// How long shutdown waits for the pipeline thread to finish.
    pub shutdown_grace_ms: u64,
    /// Maximum queued frames before the oldest is dropped.  `None` is
    /// unbounded.
    pub queue_capacity: Option<usize>,
}

impl DispatchConfig {
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            idle_interval_ms: 100,
            shutdown_grace_ms: 1_000,
            queue_capacity: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use modes_rx::config::{AppConfig, AppPaths};
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load_from(&AppPaths::new().settings_file).unwrap();
///
/// // Modify and save
/// // config.save_to(&AppPaths::new().settings_file).unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sample source.
    pub source: SourceConfig,
    /// Radio / detector parameters.
    pub radio: RadioConfig,
    /// Active sinks.
    pub outputs: OutputConfig,
    /// Dispatch loop timing.
    pub dispatch: DispatchConfig,
}

impl AppConfig {
    /// Load from an explicit path.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
