//! Command-line options.
//!
//! Every option is an override: values not given on the command line keep
//! whatever `settings.toml` (or the built-in default) says.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{AppConfig, AppPaths, SourceConfig};

/// Mode S receiver: runs the decoding pipeline and fans frames out to sinks.
#[derive(Debug, Parser)]
#[command(name = "modes-rx", version, about, long_about = None)]
pub struct Args {
    /// Receive frequency in Hz.
    #[arg(short = 'f', long = "freq")]
    pub frequency: Option<f64>,

    /// RF gain in dB.  Not applied by decoded-frame feeds.
    #[arg(short = 'g', long)]
    pub gain: Option<f32>,

    /// Sample rate in samples per second.  Not applied by decoded-frame feeds.
    #[arg(short = 'r', long)]
    pub rate: Option<u32>,

    /// Pulse detection threshold in dB.  Not applied by decoded-frame feeds.
    #[arg(short = 'T', long)]
    pub threshold: Option<f32>,

    /// Output frames of every length, not just valid Mode S lengths.
    #[arg(short = 'a', long)]
    pub output_all: bool,

    /// Replay frames from a capture file instead of a live receiver.
    #[arg(short = 'F', long, value_name = "PATH", conflicts_with = "device")]
    pub filename: Option<PathBuf>,

    /// Receiver address (`host:port`).
    #[arg(short = 'd', long, value_name = "HOST:PORT")]
    pub device: Option<String>,

    /// Store frames; an optional path overrides the default store file.
    #[arg(short = 'D', long, value_name = "PATH", num_args = 0..=1)]
    pub database: Option<Option<PathBuf>>,

    /// Broadcast frames to TCP clients.
    #[arg(short = 'P', long)]
    pub sbs1: bool,

    /// Broadcast listening port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Do not print frames to stdout.
    #[arg(short = 'n', long)]
    pub no_print: bool,

    /// Settings file to load instead of the default location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the resolved settings back to the settings file and exit.
    #[arg(long)]
    pub save_config: bool,
}

impl Args {
    /// Settings file named by `--config`, or the default location.
    pub fn settings_file(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| AppPaths::new().settings_file)
    }

    /// Load `settings_file` and layer these options over it.
    ///
    /// A file that cannot be read or parsed falls back to defaults for a
    /// normal run.  With `--save-config` it is an error instead, so the
    /// user's file is never replaced by defaults.
    pub fn resolve_config(&self, settings_file: &Path) -> Result<AppConfig> {
        let file_config = match AppConfig::load_from(settings_file) {
            Ok(config) => config,
            Err(e) if self.save_config => {
                return Err(e).context("refusing to overwrite unreadable settings");
            }
            Err(e) => {
                log::warn!("Failed to load config ({e:#}); using defaults");
                AppConfig::default()
            }
        };
        Ok(self.apply(file_config))
    }

    /// Resolve the configuration and write it back to `settings_file`.
    pub fn save_settings(&self, settings_file: &Path) -> Result<AppConfig> {
        let config = self.resolve_config(settings_file)?;
        config.save_to(settings_file)?;
        Ok(config)
    }

    /// Layer these options over `config`.
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(f) = self.frequency {
            config.radio.frequency_hz = f;
        }
        if let Some(g) = self.gain {
            config.radio.gain_db = Some(g);
        }
        if let Some(r) = self.rate {
            config.radio.sample_rate = r;
        }
        if let Some(t) = self.threshold {
            config.radio.threshold_db = t;
        }
        if self.output_all {
            config.radio.output_all = true;
        }

        if let Some(path) = &self.filename {
            config.source = SourceConfig::File {
                path: path.clone(),
                interval_ms: None,
            };
        } else if let Some(descriptor) = &self.device {
            config.source = SourceConfig::Device {
                descriptor: descriptor.clone(),
            };
        }

        if let Some(store) = &self.database {
            config.outputs.database = true;
            if let Some(path) = store {
                config.outputs.store_path = Some(path.clone());
            }
        }
        if self.sbs1 {
            config.outputs.broadcast = true;
        }
        if let Some(port) = self.port {
            config.outputs.broadcast_port = port;
        }
        if self.no_print {
            config.outputs.console = false;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("modes-rx").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_options_keep_config() {
        let config = parse(&[]).apply(AppConfig::default());
        assert_eq!(config.radio.frequency_hz, 1090e6);
        assert_eq!(config.radio.sample_rate, 4_000_000);
        assert!(config.outputs.console);
        assert!(!config.outputs.database);
        assert!(config.source.is_device());
    }

    #[test]
    fn radio_overrides() {
        let config = parse(&["-f", "1089e6", "-g", "40", "-r", "2000000", "-T", "5.5", "-a"])
            .apply(AppConfig::default());
        assert_eq!(config.radio.frequency_hz, 1089e6);
        assert_eq!(config.radio.gain_db, Some(40.0));
        assert_eq!(config.radio.sample_rate, 2_000_000);
        assert_eq!(config.radio.threshold_db, 5.5);
        assert!(config.radio.output_all);
    }

    #[test]
    fn filename_selects_replay_source() {
        let config = parse(&["-F", "capture.avr"]).apply(AppConfig::default());
        assert_eq!(
            config.source,
            SourceConfig::File {
                path: PathBuf::from("capture.avr"),
                interval_ms: None,
            }
        );
    }

    #[test]
    fn device_selects_remote_source() {
        let config = parse(&["-d", "radio.local:30002"]).apply(AppConfig::default());
        assert_eq!(
            config.source,
            SourceConfig::Device {
                descriptor: "radio.local:30002".into()
            }
        );
    }

    #[test]
    fn filename_and_device_conflict() {
        assert!(Args::try_parse_from(["modes-rx", "-F", "a", "-d", "b:1"]).is_err());
    }

    #[test]
    fn database_flag_with_and_without_path() {
        let config = parse(&["-D"]).apply(AppConfig::default());
        assert!(config.outputs.database);
        assert_eq!(config.outputs.store_path, None);

        let config = parse(&["--database", "/tmp/frames.jsonl"]).apply(AppConfig::default());
        assert!(config.outputs.database);
        assert_eq!(
            config.outputs.store_path,
            Some(PathBuf::from("/tmp/frames.jsonl"))
        );
    }

    #[test]
    fn sink_selection() {
        let config = parse(&["-P", "--port", "4000", "-n"]).apply(AppConfig::default());
        assert!(config.outputs.broadcast);
        assert_eq!(config.outputs.broadcast_port, 4000);
        assert!(!config.outputs.console);
    }

    #[test]
    fn save_config_leaves_malformed_settings_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let original = "[radio\nthreshold_db = ";
        std::fs::write(&path, original).unwrap();

        let args = parse(&["--save-config", "-g", "20"]);
        assert!(args.save_settings(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn malformed_settings_fall_back_to_defaults_without_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[radio\nthreshold_db = ").unwrap();

        let config = parse(&["-T", "4.5"]).resolve_config(&path).unwrap();
        assert_eq!(config.radio.threshold_db, 4.5);
        assert_eq!(config.radio.sample_rate, 4_000_000);
    }

    #[test]
    fn save_config_keeps_file_settings_and_adds_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[outputs]\nbroadcast_port = 4001\n").unwrap();

        parse(&["--save-config", "-g", "20"]).save_settings(&path).unwrap();

        let saved = AppConfig::load_from(&path).unwrap();
        assert_eq!(saved.outputs.broadcast_port, 4001);
        assert_eq!(saved.radio.gain_db, Some(20.0));
    }

    #[test]
    fn absent_flags_do_not_clear_file_settings() {
        let mut file = AppConfig::default();
        file.outputs.broadcast = true;
        file.radio.output_all = true;

        let config = parse(&[]).apply(file);
        assert!(config.outputs.broadcast);
        assert!(config.radio.output_all);
    }
}
