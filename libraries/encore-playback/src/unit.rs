//! Playback unit
//!
//! Wraps one [`Voice`] with lifecycle bookkeeping so the player and the
//! crossfade controller never touch the platform primitive directly.
//!
//! ```text
//! Uninitialized -> Loading -> Ready -> Playing <-> Paused
//!                     |                   |
//!                     v                   v
//!                  Errored              Ended        (any) -> Disposed
//! ```

use crate::error::{PlaybackError, Result, VoiceError};
use crate::voice::{UnitId, Voice, VoiceEvent};
use std::fmt;

/// Lifecycle of a playback unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Uninitialized,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    Errored,
    Disposed,
}

impl UnitState {
    /// Whether duration/position are meaningful
    pub fn is_ready(self) -> bool {
        matches!(
            self,
            UnitState::Ready | UnitState::Playing | UnitState::Paused | UnitState::Ended
        )
    }
}

/// One decode/output resource plus its bookkeeping
pub struct PlaybackUnit {
    id: UnitId,
    voice: Option<Box<dyn Voice>>,
    state: UnitState,
    locator: Option<String>,

    // Timing, valid once ready
    current_time: f64,
    duration: f64,
    buffering: bool,

    /// Whether this unit drives externally visible state
    is_primary: bool,

    // Requested output settings; pushed to the voice once ready
    volume: f32,
    muted: bool,
    playback_rate: f64,
}

impl PlaybackUnit {
    pub(crate) fn new(id: UnitId, voice: Box<dyn Voice>) -> Self {
        Self {
            id,
            voice: Some(voice),
            state: UnitState::Uninitialized,
            locator: None,
            current_time: 0.0,
            duration: 0.0,
            buffering: false,
            is_primary: false,
            volume: 1.0,
            muted: false,
            playback_rate: 1.0,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn is_playing(&self) -> bool {
        self.state == UnitState::Playing
    }

    pub fn is_disposed(&self) -> bool {
        self.state == UnitState::Disposed
    }

    pub fn is_buffering(&self) -> bool {
        self.buffering
    }

    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    /// Position in seconds (0 until ready)
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Duration in seconds (0 until ready)
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Seconds left until the end, never negative
    pub fn remaining(&self) -> f64 {
        (self.duration - self.current_time).max(0.0)
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn set_primary(&mut self, primary: bool) {
        self.is_primary = primary;
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    /// Start preparing a resource
    ///
    /// Readiness is reported later through [`VoiceEvent::MetadataReady`].
    pub fn load(&mut self, locator: &str) -> Result<()> {
        let voice = self.voice.as_mut().ok_or(VoiceError::Released)?;

        self.locator = Some(locator.to_string());
        self.current_time = 0.0;
        self.duration = 0.0;
        self.buffering = false;
        self.state = UnitState::Loading;

        if let Err(e) = voice.load(locator) {
            self.state = UnitState::Errored;
            return Err(e.into());
        }
        Ok(())
    }

    /// Start or resume playback
    pub fn play(&mut self) -> Result<()> {
        if self.state == UnitState::Disposed {
            return Err(VoiceError::Released.into());
        }
        if !self.state.is_ready() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        let voice = self.voice.as_mut().ok_or(VoiceError::Released)?;

        if self.state == UnitState::Ended {
            voice.seek(0.0);
            self.current_time = 0.0;
        }

        voice.play()?;
        self.state = UnitState::Playing;
        Ok(())
    }

    /// Pause playback. Calling it again is a no-op.
    pub fn pause(&mut self) {
        if self.state != UnitState::Playing {
            return;
        }
        if let Some(voice) = self.voice.as_mut() {
            voice.pause();
        }
        self.state = UnitState::Paused;
    }

    /// Jump to `seconds`, clamped to [0, duration]
    ///
    /// Ignored until the unit is ready.
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        if !seconds.is_finite() {
            return Err(PlaybackError::InvalidSeekPosition(seconds));
        }
        if !self.state.is_ready() {
            return Ok(());
        }
        let target = seconds.clamp(0.0, self.duration.max(0.0));
        if let Some(voice) = self.voice.as_mut() {
            voice.seek(target);
        }
        self.current_time = target;
        if self.state == UnitState::Ended && target < self.duration {
            self.state = UnitState::Paused;
        }
        Ok(())
    }

    pub fn set_volume(&mut self, level: f32) {
        self.volume = level.clamp(0.0, 1.0);
        if self.state.is_ready() {
            if let Some(voice) = self.voice.as_mut() {
                voice.set_volume(self.volume);
            }
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if self.state.is_ready() {
            if let Some(voice) = self.voice.as_mut() {
                voice.set_muted(muted);
            }
        }
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        self.playback_rate = rate;
        if self.state.is_ready() {
            if let Some(voice) = self.voice.as_mut() {
                voice.set_playback_rate(rate);
            }
        }
    }

    /// Release the voice. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.state == UnitState::Disposed {
            return;
        }
        if let Some(mut voice) = self.voice.take() {
            voice.pause();
            voice.release();
        }
        self.state = UnitState::Disposed;
        self.is_primary = false;
        self.buffering = false;
        tracing::debug!(unit = %self.id, "Disposed playback unit");
    }

    /// Fold a voice event into the unit's bookkeeping
    pub fn observe(&mut self, event: &VoiceEvent) {
        if self.state == UnitState::Disposed {
            return;
        }

        match event {
            VoiceEvent::Progress(time) => {
                if self.state.is_ready() && time.is_finite() {
                    self.current_time = time.max(0.0);
                }
            }
            VoiceEvent::MetadataReady(duration) => {
                self.duration = if duration.is_finite() {
                    duration.max(0.0)
                } else {
                    0.0
                };
                if self.state == UnitState::Loading {
                    self.state = UnitState::Ready;
                    self.flush_settings();
                }
            }
            VoiceEvent::Ended => {
                if self.state.is_ready() {
                    self.current_time = self.duration;
                    self.state = UnitState::Ended;
                }
            }
            VoiceEvent::Error(_) => {
                self.state = UnitState::Errored;
                self.buffering = false;
            }
            VoiceEvent::BufferingStart => self.buffering = true,
            VoiceEvent::BufferingEnd => self.buffering = false,
            VoiceEvent::PlaybackRejected(_) => {
                if self.state == UnitState::Playing {
                    self.state = UnitState::Paused;
                }
            }
        }
    }

    fn flush_settings(&mut self) {
        if let Some(voice) = self.voice.as_mut() {
            voice.set_volume(self.volume);
            voice.set_muted(self.muted);
            voice.set_playback_rate(self.playback_rate);
        }
    }
}

impl Drop for PlaybackUnit {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for PlaybackUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackUnit")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("locator", &self.locator)
            .field("current_time", &self.current_time)
            .field("duration", &self.duration)
            .field("is_primary", &self.is_primary)
            .finish_non_exhaustive()
    }
}
