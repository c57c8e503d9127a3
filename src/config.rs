use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::session::SessionConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub voice: VoiceConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "grocer-voice".to_string(),
        }
    }
}

/// Voice search tuning, durations in milliseconds
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub language: String,
    pub pre_clean_settle_ms: u64,
    pub stop_settle_ms: u64,
    pub start_timeout_ms: u64,
    pub mount_delay_ms: u64,
    pub probe_delay_ms: u64,
    pub event_buffer: usize,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        let defaults = SessionConfig::default();
        Self {
            language: defaults.language,
            pre_clean_settle_ms: defaults.pre_clean_settle.as_millis() as u64,
            stop_settle_ms: defaults.stop_settle.as_millis() as u64,
            start_timeout_ms: defaults.start_timeout.as_millis() as u64,
            mount_delay_ms: defaults.mount_delay.as_millis() as u64,
            probe_delay_ms: defaults.probe_delay.as_millis() as u64,
            event_buffer: defaults.event_buffer,
        }
    }
}

impl From<&VoiceConfig> for SessionConfig {
    fn from(cfg: &VoiceConfig) -> Self {
        Self {
            language: cfg.language.clone(),
            pre_clean_settle: Duration::from_millis(cfg.pre_clean_settle_ms),
            stop_settle: Duration::from_millis(cfg.stop_settle_ms),
            start_timeout: Duration::from_millis(cfg.start_timeout_ms),
            mount_delay: Duration::from_millis(cfg.mount_delay_ms),
            probe_delay: Duration::from_millis(cfg.probe_delay_ms),
            event_buffer: cfg.event_buffer,
        }
    }
}

impl Config {
    /// Load from `path` (any format `config` understands, extension optional)
    /// with `GROCER_VOICE__SECTION__KEY` environment overrides
    ///
    /// A missing file is not an error: defaults apply.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("GROCER_VOICE").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to parse config")
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig::from(&self.voice)
    }
}
