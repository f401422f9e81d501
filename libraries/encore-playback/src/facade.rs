//! Formatted accessors for the UI
//!
//! Pure derivations over player, crossfade and queue state. Nothing here
//! holds state of its own.

use crate::types::{PlaybackState, Track};
use serde::Serialize;

/// Seconds as `m:ss`
///
/// Zero, negative, NaN or infinite input renders as `0:00`.
pub fn format_duration(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    format!("{}:{:02}", total / 60, total % 60)
}

/// Seconds as `h:mm:ss`
///
/// Same fallback rules as [`format_duration`], rendering `0:00:00`.
pub fn format_long_duration(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Rate with one decimal and an `x` suffix, e.g. `1.5x`
pub fn format_playback_speed(rate: f64) -> String {
    format!("{rate:.1}x")
}

/// Crossfade window with an `s` suffix, e.g. `10s`
pub fn format_crossfade_duration(seconds: f64) -> String {
    format!("{seconds}s")
}

/// Position as a percentage of the duration (0 while duration is unknown)
pub fn progress_percentage(current_time: f64, duration: f64) -> f64 {
    if duration <= 0.0 || !duration.is_finite() || !current_time.is_finite() {
        return 0.0;
    }
    current_time / duration * 100.0
}

fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    }
}

/// Everything the UI renders, captured at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub state: PlaybackState,
    pub is_playing: bool,
    pub is_loading: bool,
    pub error: Option<String>,

    pub current_time: f64,
    pub duration: f64,
    pub progress_percentage: f64,
    pub formatted_current_time: String,
    pub formatted_duration: String,

    pub volume: f32,
    pub is_muted: bool,

    pub playback_rate: f64,
    pub formatted_playback_speed: String,

    pub crossfade_enabled: bool,
    pub crossfade_duration_secs: f64,
    pub formatted_crossfade_duration: String,
    pub is_crossfading: bool,
    pub crossfade_progress: f32,

    pub seek_preview: Option<f64>,
    pub formatted_seek_preview: Option<String>,

    pub current_track: Option<Track>,
    pub queue_length: usize,
    pub current_index: Option<usize>,
}
