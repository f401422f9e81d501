//! Playback configuration
//!
//! Loaded from an optional file and `ENCORE_`-prefixed environment
//! variables. Nested keys use a double underscore, e.g.
//! `ENCORE_CROSSFADE__DURATION_SECS=6`.

use crate::crossfade::CrossfadeSettings;
use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const ENV_PREFIX: &str = "ENCORE";

/// Configuration for the playback manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial volume (0.0-1.0, default: 0.8)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Interval the host should drive `tick()` at (default: 50ms)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default)]
    pub crossfade: CrossfadeSettings,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            tick_interval_ms: default_tick_interval_ms(),
            crossfade: CrossfadeSettings::default(),
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// A missing path is skipped; a path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    pub(crate) fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path).required(true));
        }

        settings = settings.add_source(
            config::Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        let mut loaded: Self = config
            .try_deserialize()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        loaded.validate()?;
        loaded.crossfade.normalize();

        tracing::debug!(
            volume = loaded.volume,
            tick_interval_ms = loaded.tick_interval_ms,
            crossfade_enabled = loaded.crossfade.enabled,
            crossfade_secs = loaded.crossfade.duration_secs,
            "Loaded playback configuration"
        );

        Ok(loaded)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.volume.is_finite() || !(0.0..=1.0).contains(&self.volume) {
            return Err(PlaybackError::Config(format!(
                "volume must be within 0.0-1.0, got {}",
                self.volume
            )));
        }

        if self.tick_interval_ms == 0 {
            return Err(PlaybackError::Config(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }

        if !self.crossfade.duration_secs.is_finite() {
            return Err(PlaybackError::Config(
                "crossfade.duration_secs must be a finite number".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_volume() -> f32 {
    0.8
}

fn default_tick_interval_ms() -> u64 {
    50
}
