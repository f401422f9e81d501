//! Playback Events
//!
//! Event-based communication for UI synchronization. The manager queues
//! events as they happen and the shell drains them with
//! [`crate::PlaybackManager::drain_events`]:
//! - State changes (loading/play/pause/error/idle)
//! - Track changes (on load, or when a crossfade hands over)
//! - Crossfade lifecycle and ramp progress
//! - Volume, rate and queue changes

use crate::types::PlaybackState;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// Coarse playback state changed
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// The selected track changed
    ///
    /// For crossfade: emitted when the incoming track takes over
    /// For manual skip or load: emitted immediately
    TrackChanged {
        /// ID of the new (current) track
        track_id: String,
        /// ID of the previous track (if any)
        previous_track_id: Option<String>,
    },

    /// A secondary unit began preparing the next track
    CrossfadeStarted {
        /// ID of the incoming track
        to_track_id: String,
        /// Configured fade window in seconds
        duration_secs: f64,
    },

    /// Crossfade progress update (for UI animations)
    CrossfadeProgress {
        /// Progress from 0.0 (just started) to 1.0 (complete)
        progress: f32,
    },

    /// Crossfade completed, outgoing unit released
    CrossfadeCompleted,

    /// Crossfade abandoned or cancelled
    CrossfadeAborted {
        /// Why the fade stopped
        reason: String,
    },

    /// Volume changed
    VolumeChanged {
        /// New volume level (0.0-1.0)
        level: f32,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Playback rate changed
    PlaybackRateChanged {
        /// New rate (0.5-2.0)
        rate: f64,
    },

    /// Queue changed (tracks added/removed/reordered/selected)
    QueueChanged {
        /// New queue length
        length: usize,
        /// Selected index, if any
        current_index: Option<usize>,
    },

    /// Error occurred during playback
    Error {
        /// Error message
        message: String,
    },
}
