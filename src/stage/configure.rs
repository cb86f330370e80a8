//! Builds the pipeline stage selected by the configuration.

use std::sync::Arc;
use std::time::Duration;

use super::engine::{PipelineStage, StageError};
use super::remote::RemoteStage;
use super::replay::ReplayStage;
use crate::config::{AppConfig, RadioConfig, SourceConfig};
use crate::queue::SharedFrameQueue;

/// Build the stage for `config.source`, wired to push into `queue`.
///
/// Device sources get an initial [`tune`] to the configured frequency; a
/// rejected tune is reported and the device keeps its previous frequency.
///
/// # Errors
///
/// Propagates [`StageError::Open`] / [`StageError::Connect`] when the
/// source cannot be reached.
pub fn configure(
    config: &AppConfig,
    queue: SharedFrameQueue,
) -> Result<Arc<dyn PipelineStage>, StageError> {
    let radio = &config.radio;

    let stage: Arc<dyn PipelineStage> = match &config.source {
        SourceConfig::File { path, interval_ms } => Arc::new(ReplayStage::open(
            path,
            queue,
            radio.output_all,
            interval_ms.map(Duration::from_millis),
        )?),
        SourceConfig::Device { descriptor } => {
            Arc::new(RemoteStage::connect(descriptor, queue, radio.output_all)?)
        }
    };

    if config.source.is_device() {
        tune(stage.as_ref(), radio.frequency_hz);
    }

    log::info!("Rate is {}", radio.sample_rate);
    match radio.gain_db {
        Some(gain) => log::info!("Gain is {gain}"),
        None => log::info!("Gain is the front-end default"),
    }
    log::info!("Threshold is {} dB", radio.threshold_db);

    let ignored = unapplied_settings(radio);
    if !ignored.is_empty() {
        log::warn!(
            "{}: feed carries decoded frames; {} not applied",
            stage.name(),
            ignored.join(", ")
        );
    }

    Ok(stage)
}

/// Sample-level settings changed from their defaults.
///
/// Both sources consume frames that were already demodulated, so gain,
/// sample rate and detection threshold have nothing to act on.
pub fn unapplied_settings(radio: &RadioConfig) -> Vec<&'static str> {
    let defaults = RadioConfig::default();
    let mut ignored = Vec::new();
    if radio.gain_db.is_some() {
        ignored.push("gain");
    }
    if radio.sample_rate != defaults.sample_rate {
        ignored.push("sample rate");
    }
    if radio.threshold_db != defaults.threshold_db {
        ignored.push("threshold");
    }
    ignored
}

/// Tune `stage` to `frequency_hz`, reporting a rejection instead of failing.
///
/// Returns the stage's answer so callers can act on it.
pub fn tune(stage: &dyn PipelineStage, frequency_hz: f64) -> bool {
    let accepted = stage.retune(frequency_hz);
    if accepted {
        log::info!("{}: tuned to {frequency_hz} Hz", stage.name());
    } else {
        log::warn!(
            "{}: failed to set initial frequency {frequency_hz} Hz, keeping previous tuning",
            stage.name()
        );
    }
    accepted
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
