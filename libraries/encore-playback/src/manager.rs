//! Playback manager - core orchestration
//!
//! Owns the queue, the core player, the crossfade controller and the voice
//! host, and is the only thing UI code talks to. The shell constructs one
//! per session and drives it from its event loop:
//!
//! ```text
//! every ~50ms:  manager.tick()            // drain voice events, advance ramp
//! on demand:    manager.play() / seek() / play_next() / ...
//! afterwards:   manager.drain_events()    // push changes to the UI
//! ```

use crate::{
    clock::Clock,
    config::PlaybackConfig,
    crossfade::{CrossfadeController, CrossfadeOutcome, CrossfadeSettings, FadeCurve},
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    facade::{self, PlayerSnapshot},
    player::{CorePlayer, PlayerSignal},
    queue::Queue,
    types::{PlaybackState, Track},
    unit::UnitState,
    voice::{UnitEvent, VoiceEvent, VoiceFactory, VoiceHost},
};
use std::time::Duration;

/// Playback manager
pub struct PlaybackManager {
    host: VoiceHost,
    core: CorePlayer,
    crossfade: CrossfadeController,
    queue: Queue,
    clock: Box<dyn Clock>,

    // Track whose audio the primary unit carries (None for bare locators)
    now_playing: Option<Track>,
    // Track that was playing before the last crossfade handover
    handover_from: Option<Track>,

    // Hover position on the seek bar, in seconds
    seek_preview: Option<f64>,

    tick_interval: Duration,

    // Event queue for UI synchronization
    last_state: PlaybackState,
    pending_events: Vec<PlaybackEvent>,
}

impl PlaybackManager {
    /// Create a new playback manager
    pub fn new(
        config: PlaybackConfig,
        factory: Box<dyn VoiceFactory>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let mut host = VoiceHost::new(factory);
        let core = CorePlayer::new(&mut host, config.volume);

        tracing::debug!(
            volume = config.volume,
            crossfade_enabled = config.crossfade.enabled,
            crossfade_secs = config.crossfade.duration_secs,
            "Playback manager created"
        );

        Self {
            host,
            core,
            crossfade: CrossfadeController::new(config.crossfade),
            queue: Queue::new(),
            clock,
            now_playing: None,
            handover_from: None,
            seek_preview: None,
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            last_state: PlaybackState::Idle,
            pending_events: Vec::new(),
        }
    }

    // ===== Playback Control =====

    /// Load a resource by locator and play it once ready
    pub fn load_track(&mut self, locator: &str) -> Result<()> {
        self.cancel_crossfade("new track loaded");
        self.now_playing = None;
        self.handover_from = None;
        self.load_locator(locator)
    }

    /// Start or resume playback
    ///
    /// With nothing loaded, plays the queue's selected track, or the first
    /// queued track when nothing is selected.
    pub fn play(&mut self) -> Result<()> {
        if self.core.has_source() {
            if self.core.primary().state() == UnitState::Errored {
                self.cancel_crossfade("retrying failed track");
            }
            let result = self.core.resume(&mut self.host);
            if result.is_err() {
                self.report_error();
            }
            self.sync_state();
            return result;
        }

        let track = match self.queue.current_track() {
            Some(track) => track.clone(),
            None => self
                .queue
                .select(0)
                .cloned()
                .ok_or(PlaybackError::QueueEmpty)?,
        };
        self.load_queue_track(track)
    }

    /// Pause playback
    ///
    /// An active fade is finished first so the outgoing track does not keep
    /// sounding.
    pub fn pause(&mut self) {
        if self.crossfade.is_fading() {
            let outcome = self.crossfade.finish(&mut self.core);
            self.apply_outcome(outcome);
        } else {
            self.cancel_crossfade("paused");
        }
        self.core.pause();
        self.sync_state();
    }

    /// Toggle between play and pause
    pub fn toggle_play(&mut self) -> Result<()> {
        if self.core.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Skip to next track (wraps around)
    ///
    /// On an empty queue playback stops at position zero and
    /// [`PlaybackError::QueueEmpty`] is returned.
    pub fn play_next(&mut self) -> Result<()> {
        self.cancel_crossfade("skipped to next track");

        match self.queue.advance().cloned() {
            Some(track) => self.load_queue_track(track),
            None => {
                self.core.rewind();
                self.sync_state();
                Err(PlaybackError::QueueEmpty)
            }
        }
    }

    /// Go to previous track (wraps around)
    pub fn play_previous(&mut self) -> Result<()> {
        self.cancel_crossfade("skipped to previous track");

        let track = self
            .queue
            .retreat()
            .cloned()
            .ok_or(PlaybackError::QueueEmpty)?;
        self.load_queue_track(track)
    }

    /// Select and play the track at `index`
    pub fn play_from_queue(&mut self, index: usize) -> Result<()> {
        let track = self
            .queue
            .get(index)
            .cloned()
            .ok_or(PlaybackError::IndexOutOfBounds(index))?;

        self.cancel_crossfade("played from queue");
        self.queue.select(index);
        self.load_queue_track(track)
    }

    /// Stop playback and reset transport state
    ///
    /// The queue is kept.
    pub fn stop(&mut self) {
        self.cancel_crossfade("stopped");
        self.core.stop(&mut self.host);
        self.now_playing = None;
        self.handover_from = None;
        self.seek_preview = None;
        self.sync_state();
    }

    // ===== Seek =====

    /// Seek to a position in seconds, clamped to the duration
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        self.core.seek(seconds)
    }

    /// Seek to a percentage (0-100); no-op while the duration is unknown
    pub fn seek_by_percentage(&mut self, percent: f64) -> Result<()> {
        self.core.seek_by_percentage(percent)
    }

    /// Update the hover position shown on the seek bar
    pub fn update_seek_preview(&mut self, percent: Option<f64>) {
        self.seek_preview = percent.map(|p| {
            let duration = self.core.duration();
            if duration > 0.0 && p.is_finite() {
                p / 100.0 * duration
            } else {
                0.0
            }
        });
    }

    // ===== Volume =====

    /// Set volume (0.0-1.0)
    pub fn set_volume(&mut self, level: f32) -> f32 {
        let level = self.core.set_volume(level);
        if self.crossfade.is_fading() {
            // Re-apply the ramp so the incoming unit is not jumped to full level
            let outcome = self.crossfade.tick(self.clock.now(), &mut self.core);
            self.apply_outcome(outcome);
        }
        self.emit_volume_changed();
        level
    }

    /// Toggle mute, keeping the stored level
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.core.toggle_mute();
        self.crossfade.sync_muted(muted);
        self.emit_volume_changed();
        muted
    }

    pub fn volume(&self) -> f32 {
        self.core.volume()
    }

    pub fn is_muted(&self) -> bool {
        self.core.is_muted()
    }

    // ===== Playback Rate =====

    /// Set the playback rate, clamped to 0.5-2.0
    pub fn set_playback_rate(&mut self, rate: f64) -> f64 {
        let before = self.core.playback_rate();
        let rate = self.core.set_playback_rate(rate);
        self.after_rate_change(before);
        rate
    }

    /// Speed up by one 0.05 step
    pub fn increase_playback_speed(&mut self) -> f64 {
        let before = self.core.playback_rate();
        let rate = self.core.increase_playback_rate();
        self.after_rate_change(before);
        rate
    }

    /// Slow down by one 0.05 step
    pub fn decrease_playback_speed(&mut self) -> f64 {
        let before = self.core.playback_rate();
        let rate = self.core.decrease_playback_rate();
        self.after_rate_change(before);
        rate
    }

    pub fn playback_rate(&self) -> f64 {
        self.core.playback_rate()
    }

    // ===== Crossfade =====

    /// Flip crossfade on/off; an in-progress fade is left to finish
    pub fn toggle_crossfade(&mut self) -> bool {
        self.crossfade.toggle_enabled()
    }

    pub fn set_crossfade_enabled(&mut self, enabled: bool) {
        self.crossfade.set_enabled(enabled);
    }

    /// Set the crossfade window, clamped to 1-30 seconds
    pub fn set_crossfade_duration(&mut self, seconds: f64) -> f64 {
        self.crossfade.set_duration(seconds)
    }

    pub fn set_fade_curve(&mut self, curve: FadeCurve) {
        self.crossfade.set_curve(curve);
    }

    pub fn crossfade_settings(&self) -> &CrossfadeSettings {
        self.crossfade.settings()
    }

    pub fn is_crossfading(&self) -> bool {
        self.crossfade.is_crossfading()
    }

    // ===== Queue Management =====

    /// Append a track to the queue
    pub fn add_to_queue(&mut self, track: Track) {
        self.queue.add(track);
        self.emit_queue_changed();
    }

    /// Append several tracks to the queue
    pub fn add_all_to_queue(&mut self, tracks: impl IntoIterator<Item = Track>) {
        for track in tracks {
            self.queue.add(track);
        }
        self.emit_queue_changed();
    }

    /// Insert a track at `index` (0..=len)
    pub fn insert_into_queue(&mut self, track: Track, index: usize) -> Result<()> {
        self.queue.insert_at(track, index)?;
        self.emit_queue_changed();
        Ok(())
    }

    /// Remove a track by position; the selected track cannot be removed
    pub fn remove_from_queue(&mut self, index: usize) -> Result<Track> {
        let removed = self.queue.remove(index)?;
        self.emit_queue_changed();
        Ok(removed)
    }

    /// Remove the first track with this id
    pub fn remove_from_queue_by_id(&mut self, id: &str) -> Result<Track> {
        let removed = self.queue.remove_by_id(id)?;
        self.emit_queue_changed();
        Ok(removed)
    }

    /// Reorder the queue, keeping the selection on the same track
    pub fn move_in_queue(&mut self, from: usize, to: usize) -> Result<()> {
        self.queue.move_track(from, to)?;
        self.emit_queue_changed();
        Ok(())
    }

    /// Empty the queue; playback is not interrupted
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.emit_queue_changed();
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn is_track_selected(&self, id: &str) -> bool {
        self.queue.is_track_selected(id)
    }

    // ===== State Queries =====

    pub fn state(&self) -> PlaybackState {
        self.core.state()
    }

    pub fn is_playing(&self) -> bool {
        self.core.is_playing()
    }

    pub fn is_loading(&self) -> bool {
        self.core.is_loading()
    }

    pub fn current_time(&self) -> f64 {
        self.core.current_time()
    }

    pub fn duration(&self) -> f64 {
        self.core.duration()
    }

    pub fn error(&self) -> Option<&str> {
        self.core.error()
    }

    /// Track the primary unit is playing, if it came from the queue
    pub fn current_track(&self) -> Option<&Track> {
        self.now_playing.as_ref()
    }

    pub fn progress_percentage(&self) -> f64 {
        facade::progress_percentage(self.core.current_time(), self.core.duration())
    }

    pub fn seek_preview(&self) -> Option<f64> {
        self.seek_preview
    }

    /// Units currently holding a voice (primary plus any crossfade unit)
    pub fn live_units(&self) -> usize {
        1 + self.crossfade.unit_count()
    }

    /// Interval the host should call [`Self::tick`] at
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Read-only player state for the UI
    pub fn snapshot(&self) -> PlayerSnapshot {
        let settings = self.crossfade.settings();
        let current_time = self.core.current_time();
        let duration = self.core.duration();

        PlayerSnapshot {
            state: self.core.state(),
            is_playing: self.core.is_playing(),
            is_loading: self.core.is_loading(),
            error: self.core.error().map(str::to_string),
            current_time,
            duration,
            progress_percentage: facade::progress_percentage(current_time, duration),
            formatted_current_time: facade::format_duration(current_time),
            formatted_duration: facade::format_duration(duration),
            volume: self.core.volume(),
            is_muted: self.core.is_muted(),
            playback_rate: self.core.playback_rate(),
            formatted_playback_speed: facade::format_playback_speed(self.core.playback_rate()),
            crossfade_enabled: settings.enabled,
            crossfade_duration_secs: settings.duration_secs,
            formatted_crossfade_duration: facade::format_crossfade_duration(settings.duration_secs),
            is_crossfading: self.crossfade.is_crossfading(),
            crossfade_progress: self.crossfade.progress(),
            seek_preview: self.seek_preview,
            formatted_seek_preview: self.seek_preview.map(facade::format_duration),
            current_track: self.now_playing.clone(),
            queue_length: self.queue.len(),
            current_index: self.queue.current_index(),
        }
    }

    // ===== Event Loop =====

    /// Dispatch every pending voice event
    pub fn process_events(&mut self) {
        while let Some(event) = self.host.try_next_event() {
            self.dispatch(event);
        }
        self.sync_state();
    }

    /// Drain voice events and advance any crossfade ramp
    pub fn tick(&mut self) {
        self.process_events();
        let outcome = self.crossfade.tick(self.clock.now(), &mut self.core);
        self.apply_outcome(outcome);
        self.sync_state();
    }

    /// Get and clear pending events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    fn dispatch(&mut self, UnitEvent { unit, event }: UnitEvent) {
        if unit == self.core.primary_id() {
            self.handle_primary_event(&event);
        } else if self.crossfade.owns(unit) {
            let now = self.clock.now();
            let outcome = self.crossfade.handle_event(
                unit,
                &event,
                &mut self.core,
                &mut self.queue,
                now,
            );
            let aborted = matches!(outcome, CrossfadeOutcome::Aborted { .. });
            self.apply_outcome(outcome);

            // The outgoing track ran out while the fade target was loading
            if aborted && self.core.primary().state() == UnitState::Ended {
                if let Err(e) = self.play_next() {
                    tracing::debug!(error = %e, "Nothing to advance to after aborted crossfade");
                }
            }
        } else {
            tracing::trace!(unit = %unit, ?event, "Dropping event from detached unit");
        }
    }

    fn handle_primary_event(&mut self, event: &VoiceEvent) {
        match self.core.handle_event(event) {
            PlayerSignal::Progress => {
                if self.crossfade.should_trigger(&self.core) {
                    let outcome = self.crossfade.start(&self.queue, &self.core, &mut self.host);
                    self.apply_outcome(outcome);
                }
            }
            PlayerSignal::Ended => {
                if self.crossfade.is_preparing() {
                    // The incoming unit takes over as soon as it is ready
                    tracing::debug!("Track ended while crossfade target is loading");
                    return;
                }
                if self.crossfade.is_fading() {
                    let outcome = self.crossfade.finish(&mut self.core);
                    self.apply_outcome(outcome);
                }
                if let Err(e) = self.play_next() {
                    tracing::debug!(error = %e, "Reached end with nothing queued");
                }
            }
            PlayerSignal::Failed => {
                if self.crossfade.is_fading() {
                    let reason = self.core.error().unwrap_or("playback failed").to_string();
                    let outcome =
                        self.crossfade
                            .rollback(&mut self.core, &mut self.queue, reason);
                    let restored = matches!(outcome, CrossfadeOutcome::RolledBack { .. });
                    self.apply_outcome(outcome);
                    if !restored {
                        // Outgoing track is gone; the failed one stays selected
                        self.report_error();
                    }
                } else {
                    self.cancel_crossfade("current track failed");
                    self.report_error();
                }
            }
            PlayerSignal::Ready | PlayerSignal::None => {}
        }
    }

    fn apply_outcome(&mut self, outcome: CrossfadeOutcome) {
        match outcome {
            CrossfadeOutcome::None => {}
            CrossfadeOutcome::Started {
                to_track,
                duration_secs,
            } => {
                self.emit(PlaybackEvent::CrossfadeStarted {
                    to_track_id: to_track.id,
                    duration_secs,
                });
            }
            CrossfadeOutcome::Committed { track, .. } => {
                let previous = self.now_playing.replace(track.clone());
                let previous_track_id = previous.as_ref().map(|t| t.id.clone());
                self.handover_from = previous;
                self.emit(PlaybackEvent::TrackChanged {
                    track_id: track.id,
                    previous_track_id,
                });
                self.emit_queue_changed();
            }
            CrossfadeOutcome::Progress(progress) => {
                self.emit(PlaybackEvent::CrossfadeProgress { progress });
            }
            CrossfadeOutcome::Completed => {
                self.handover_from = None;
                self.emit(PlaybackEvent::CrossfadeCompleted);
            }
            CrossfadeOutcome::Aborted { reason } => {
                self.handover_from = None;
                self.emit(PlaybackEvent::CrossfadeAborted { reason });
            }
            CrossfadeOutcome::RolledBack { reason } => {
                if let Some(previous) = self.handover_from.take() {
                    self.now_playing = Some(previous);
                }
                self.emit(PlaybackEvent::CrossfadeAborted { reason });
                self.emit_queue_changed();
            }
        }
    }

    fn cancel_crossfade(&mut self, reason: &str) {
        if self.crossfade.cancel(&mut self.core) {
            self.handover_from = None;
            self.emit(PlaybackEvent::CrossfadeAborted {
                reason: reason.to_string(),
            });
        }
    }

    fn load_queue_track(&mut self, track: Track) -> Result<()> {
        self.cancel_crossfade("new track loaded");

        let previous = self.now_playing.replace(track.clone());
        self.handover_from = None;
        self.emit(PlaybackEvent::TrackChanged {
            track_id: track.id.clone(),
            previous_track_id: previous.map(|t| t.id),
        });
        self.emit_queue_changed();

        self.load_locator(&track.locator)
    }

    fn load_locator(&mut self, locator: &str) -> Result<()> {
        let rate_before = self.core.playback_rate();
        self.seek_preview = None;

        let result = self.core.load(&mut self.host, locator);
        if result.is_err() {
            self.report_error();
        }
        self.after_rate_change(rate_before);
        self.sync_state();
        result
    }

    fn after_rate_change(&mut self, before: f64) {
        let rate = self.core.playback_rate();
        self.crossfade.sync_playback_rate(rate);
        if rate != before {
            self.emit(PlaybackEvent::PlaybackRateChanged { rate });
        }
    }

    fn report_error(&mut self) {
        if let Some(message) = self.core.error() {
            let message = message.to_string();
            self.emit(PlaybackEvent::Error { message });
        }
    }

    fn emit_volume_changed(&mut self) {
        self.emit(PlaybackEvent::VolumeChanged {
            level: self.core.volume(),
            is_muted: self.core.is_muted(),
        });
    }

    fn emit_queue_changed(&mut self) {
        self.emit(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
            current_index: self.queue.current_index(),
        });
    }

    fn sync_state(&mut self) {
        let state = self.core.state();
        if state != self.last_state {
            tracing::debug!(from = ?self.last_state, to = ?state, "Playback state changed");
            self.last_state = state;
            self.emit(PlaybackEvent::StateChanged { state });
        }
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PlaybackManager {
    /// Create a manager timed by the system clock
    pub fn with_system_clock(config: PlaybackConfig, factory: Box<dyn VoiceFactory>) -> Self {
        Self::new(config, factory, Box::new(crate::clock::SystemClock::new()))
    }
}

impl std::fmt::Debug for PlaybackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackManager")
            .field("core", &self.core)
            .field("crossfade", &self.crossfade)
            .field("queue_len", &self.queue.len())
            .field("pending_events", &self.pending_events.len())
            .finish_non_exhaustive()
    }
}
