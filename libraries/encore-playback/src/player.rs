//! Core player
//!
//! Owns the primary playback unit and the transport state the UI reads.
//! Queue-driven navigation and crossfade cancellation are composed on top
//! of this by [`crate::PlaybackManager`].

use crate::error::{PlaybackError, Result};
use crate::types::{
    clamp_playback_rate, PlaybackState, DEFAULT_PLAYBACK_RATE, PLAYBACK_RATE_STEP,
};
use crate::unit::{PlaybackUnit, UnitState};
use crate::voice::{UnitId, VoiceEvent, VoiceHost};
use crate::volume::Volume;

/// What a primary-unit event meant for the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSignal {
    /// Nothing the caller needs to act on
    None,
    /// Position moved; time to check the crossfade trigger
    Progress,
    /// Metadata arrived
    Ready,
    /// The primary unit reached its end
    Ended,
    /// Load or playback failed; `error` is set
    Failed,
}

/// Transport state around exactly one primary unit
#[derive(Debug)]
pub struct CorePlayer {
    primary: PlaybackUnit,

    is_playing: bool,
    current_time: f64,
    duration: f64,
    is_loading: bool,
    error: Option<String>,

    volume: Volume,
    playback_rate: f64,

    /// Start playback as soon as the primary unit is ready
    autoplay: bool,
}

impl CorePlayer {
    /// Create a player with a fresh, unloaded primary unit
    pub fn new(host: &mut VoiceHost, volume: f32) -> Self {
        let mut player = Self {
            primary: host.spawn(),
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            is_loading: false,
            error: None,
            volume: Volume::new(volume),
            playback_rate: DEFAULT_PLAYBACK_RATE,
            autoplay: false,
        };
        player.configure_primary();
        player
    }

    // ===== Accessors =====

    pub fn primary(&self) -> &PlaybackUnit {
        &self.primary
    }

    pub fn primary_mut(&mut self) -> &mut PlaybackUnit {
        &mut self.primary
    }

    pub fn primary_id(&self) -> UnitId {
        self.primary.id()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn volume(&self) -> f32 {
        self.volume.level()
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    /// Locator of the loaded resource, if any
    pub fn locator(&self) -> Option<&str> {
        self.primary.locator()
    }

    /// Whether a resource is loaded (or loading) and can be resumed
    pub fn has_source(&self) -> bool {
        !matches!(
            self.primary.state(),
            UnitState::Uninitialized | UnitState::Disposed
        )
    }

    /// Coarse state for the UI
    pub fn state(&self) -> PlaybackState {
        if self.error.is_some() {
            PlaybackState::Errored
        } else if self.is_loading {
            PlaybackState::Loading
        } else if self.is_playing {
            PlaybackState::Playing
        } else if self.primary.is_ready() {
            PlaybackState::Paused
        } else {
            PlaybackState::Idle
        }
    }

    // ===== Transport =====

    /// Load a resource into a fresh primary unit and play it once ready
    ///
    /// Every load starts at normal speed.
    pub fn load(&mut self, host: &mut VoiceHost, locator: &str) -> Result<()> {
        let mut previous = std::mem::replace(&mut self.primary, host.spawn());
        previous.dispose();

        self.playback_rate = DEFAULT_PLAYBACK_RATE;
        self.current_time = 0.0;
        self.duration = 0.0;
        self.is_playing = false;
        self.is_loading = true;
        self.error = None;
        self.autoplay = true;
        self.configure_primary();

        tracing::info!(unit = %self.primary.id(), locator, "Loading track");

        if let Err(e) = self.primary.load(locator) {
            self.fail(format!("Failed to load track: {e}"));
            return Err(e);
        }
        Ok(())
    }

    /// Resume the loaded resource
    ///
    /// While loading this only re-arms autoplay. An errored resource is
    /// loaded again from its locator so the user can retry.
    pub fn resume(&mut self, host: &mut VoiceHost) -> Result<()> {
        match self.primary.state() {
            UnitState::Uninitialized | UnitState::Disposed => Err(PlaybackError::NoTrackLoaded),
            UnitState::Loading => {
                self.autoplay = true;
                Ok(())
            }
            UnitState::Errored => {
                let locator = self
                    .primary
                    .locator()
                    .map(str::to_string)
                    .ok_or(PlaybackError::NoTrackLoaded)?;
                let rate = self.playback_rate;
                self.load(host, &locator)?;
                self.set_playback_rate(rate);
                Ok(())
            }
            UnitState::Ready | UnitState::Playing | UnitState::Paused | UnitState::Ended => {
                self.start_playback()
            }
        }
    }

    pub fn pause(&mut self) {
        self.autoplay = false;
        self.primary.pause();
        self.is_playing = false;
    }

    /// Seek the primary unit, clamped to [0, duration]
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        self.primary.seek(seconds)?;
        if self.primary.is_ready() {
            self.current_time = self.primary.current_time();
        }
        Ok(())
    }

    /// Seek to `percent` (0-100) of the duration
    ///
    /// No-op while the duration is unknown.
    pub fn seek_by_percentage(&mut self, percent: f64) -> Result<()> {
        if self.duration <= 0.0 {
            return Ok(());
        }
        if !percent.is_finite() {
            return Err(PlaybackError::InvalidSeekPosition(percent));
        }
        self.seek(percent / 100.0 * self.duration)
    }

    /// Pause and rewind without unloading
    pub fn rewind(&mut self) {
        self.pause();
        if self.primary.is_ready() {
            // Zero is always a valid target
            let _ = self.primary.seek(0.0);
        }
        self.current_time = 0.0;
    }

    /// Tear down the primary unit and start over with a fresh one
    ///
    /// Volume, mute and rate preferences survive.
    pub fn stop(&mut self, host: &mut VoiceHost) {
        let mut previous = std::mem::replace(&mut self.primary, host.spawn());
        previous.dispose();

        self.is_playing = false;
        self.current_time = 0.0;
        self.duration = 0.0;
        self.is_loading = false;
        self.error = None;
        self.autoplay = false;
        self.configure_primary();

        tracing::debug!(unit = %self.primary.id(), "Player stopped");
    }

    // ===== Volume / Rate =====

    pub fn set_volume(&mut self, level: f32) -> f32 {
        let level = self.volume.set_level(level);
        self.primary.set_volume(level);
        level
    }

    /// Toggle mute without touching the stored level
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.volume.toggle_mute();
        self.primary.set_muted(muted);
        muted
    }

    /// Push the stored volume to the primary unit
    pub fn apply_volume(&mut self) {
        self.primary.set_volume(self.volume.level());
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> f64 {
        if rate.is_finite() {
            self.playback_rate = clamp_playback_rate(rate);
            self.primary.set_playback_rate(self.playback_rate);
        }
        self.playback_rate
    }

    pub fn increase_playback_rate(&mut self) -> f64 {
        self.set_playback_rate(self.playback_rate + PLAYBACK_RATE_STEP)
    }

    pub fn decrease_playback_rate(&mut self) -> f64 {
        self.set_playback_rate(self.playback_rate - PLAYBACK_RATE_STEP)
    }

    // ===== Ownership handoff =====

    /// Make `incoming` the primary unit and hand back the previous one
    ///
    /// Timing state switches to the incoming unit in the same call, so no
    /// reader can observe the outgoing unit's position afterwards.
    pub fn swap_primary(&mut self, mut incoming: PlaybackUnit) -> PlaybackUnit {
        incoming.set_primary(true);
        let mut outgoing = std::mem::replace(&mut self.primary, incoming);
        outgoing.set_primary(false);

        self.current_time = self.primary.current_time();
        self.duration = self.primary.duration();
        self.is_playing = self.primary.is_playing();
        self.is_loading = self.primary.state() == UnitState::Loading;
        self.autoplay = false;

        outgoing
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    // ===== Events =====

    /// Apply an event from the primary unit to the shared state
    pub fn handle_event(&mut self, event: &VoiceEvent) -> PlayerSignal {
        self.primary.observe(event);

        match event {
            VoiceEvent::Progress(_) => {
                self.current_time = self.primary.current_time();
                PlayerSignal::Progress
            }
            VoiceEvent::MetadataReady(_) => {
                self.duration = self.primary.duration();
                self.is_loading = false;
                if self.autoplay {
                    self.autoplay = false;
                    if self.start_playback().is_err() {
                        return PlayerSignal::Failed;
                    }
                }
                PlayerSignal::Ready
            }
            VoiceEvent::Ended => {
                self.is_playing = false;
                self.current_time = self.duration;
                PlayerSignal::Ended
            }
            VoiceEvent::Error(code) => {
                self.autoplay = false;
                self.fail(format!("Audio error code: {code}"));
                PlayerSignal::Failed
            }
            VoiceEvent::PlaybackRejected(reason) => {
                self.is_playing = false;
                self.error = Some(format!("Failed to play track: {reason}"));
                tracing::warn!(unit = %self.primary.id(), reason = %reason, "Playback rejected");
                PlayerSignal::Failed
            }
            VoiceEvent::BufferingStart => {
                self.is_loading = true;
                PlayerSignal::None
            }
            VoiceEvent::BufferingEnd => {
                self.is_loading = false;
                PlayerSignal::None
            }
        }
    }

    fn start_playback(&mut self) -> Result<()> {
        match self.primary.play() {
            Ok(()) => {
                self.is_playing = true;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.is_playing = false;
                self.error = Some(format!("Failed to play track: {e}"));
                tracing::warn!(unit = %self.primary.id(), error = %e, "Playback failed to start");
                Err(e)
            }
        }
    }

    fn fail(&mut self, message: String) {
        tracing::warn!(unit = %self.primary.id(), error = %message, "Playback error");
        self.is_playing = false;
        self.is_loading = false;
        self.error = Some(message);
    }

    fn configure_primary(&mut self) {
        self.primary.set_primary(true);
        self.primary.set_volume(self.volume.level());
        self.primary.set_muted(self.volume.is_muted());
        self.primary.set_playback_rate(self.playback_rate);
    }
}
