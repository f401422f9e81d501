//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Slowest supported playback rate
pub const MIN_PLAYBACK_RATE: f64 = 0.5;

/// Fastest supported playback rate
pub const MAX_PLAYBACK_RATE: f64 = 2.0;

/// Step used by the speed up / slow down controls
pub const PLAYBACK_RATE_STEP: f64 = 0.05;

/// Rate every freshly loaded track starts at
pub const DEFAULT_PLAYBACK_RATE: f64 = 1.0;

/// Crossfade window bounds, in seconds
pub const MIN_CROSSFADE_SECS: f64 = 1.0;
pub const MAX_CROSSFADE_SECS: f64 = 30.0;
pub const DEFAULT_CROSSFADE_SECS: f64 = 10.0;

/// Track reference handed to the engine by the data-fetch layer
///
/// The locator is already resolved (the engine never issues HTTP calls)
/// and is passed through to the voice untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique song identifier
    pub id: String,

    /// Opaque streaming resource locator
    pub locator: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name (optional)
    #[serde(default)]
    pub album: Option<String>,

    /// Track number in album (optional)
    #[serde(default)]
    pub track_number: Option<u32>,

    /// Advisory duration, used for display before the stream's metadata loads
    #[serde(default)]
    pub duration_hint: Duration,
}

impl Track {
    /// Create a track with the required fields
    pub fn new(
        id: impl Into<String>,
        locator: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_hint: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            locator: locator.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            track_number: None,
            duration_hint,
        }
    }
}

/// Coarse transport state as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing loaded, or stopped
    Idle,

    /// A track is loading
    Loading,

    /// Currently playing
    Playing,

    /// Loaded but not playing
    Paused,

    /// The last load or play attempt failed
    Errored,
}

/// Clamp a rate into the supported range, rounded to two decimals
///
/// Rounding keeps repeated 0.05 steps from drifting.
pub fn clamp_playback_rate(rate: f64) -> f64 {
    let clamped = rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
    (clamped * 100.0).round() / 100.0
}

/// Clamp a crossfade window into [1, 30] seconds
pub fn clamp_crossfade_secs(secs: f64) -> f64 {
    secs.clamp(MIN_CROSSFADE_SECS, MAX_CROSSFADE_SECS)
}
