//! Crossfade controller for smooth track transitions
//!
//! Near the end of the primary track a secondary unit is prepared for the
//! next queued track. Once it is ready the queue advances, the secondary
//! becomes primary, and both units are ramped in opposite directions until
//! the outgoing unit is silent and disposed.
//!
//! ```text
//!            trigger                 incoming ready            ramp >= 1
//! (none) ─────────────> Preparing ─────────────────> Fading ─────────────> (none)
//!                           │                          │
//!                           └── error / cancel ────────┴──> (none), outgoing kept or disposed
//! ```
//!
//! Provides multiple fade curve types:
//! - Linear: volume scales with elapsed fraction (default)
//! - SquareRoot: Faster rise than linear, natural-sounding transitions
//! - S-Curve: Smooth transitions with slow start/end
//! - Equal Power: Constant perceived loudness

use crate::player::CorePlayer;
use crate::queue::Queue;
use crate::types::{clamp_crossfade_secs, Track, DEFAULT_CROSSFADE_SECS};
use crate::unit::{PlaybackUnit, UnitState};
use crate::voice::{UnitId, VoiceEvent, VoiceHost};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::time::Duration;

/// Crossfade curve type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Linear fade: gain equals the elapsed fraction
    ///
    /// **Note**: Linear crossfade has a 3dB volume dip at the midpoint because
    /// it maintains constant amplitude sum (0.5 + 0.5 = 1.0) but not constant power.
    #[default]
    Linear,

    /// Square root fade: faster rise than linear, creates natural-sounding transitions
    SquareRoot,

    /// S-Curve fade: slow start, fast middle, slow end
    SCurve,

    /// Equal power fade: maintains perceived loudness
    EqualPower,
}

impl FadeCurve {
    /// Calculate the fade gain at a given position
    ///
    /// # Arguments
    /// * `position` - Normalized position in the fade (0.0 to 1.0)
    /// * `fade_out` - If true, calculates fade-out gain; if false, fade-in gain
    ///
    /// # Returns
    /// Gain multiplier (0.0 to 1.0)
    #[inline]
    pub fn calculate_gain(&self, position: f32, fade_out: bool) -> f32 {
        let position = position.clamp(0.0, 1.0);
        let t = if fade_out { 1.0 - position } else { position };

        match self {
            FadeCurve::Linear => t,

            FadeCurve::SquareRoot => {
                if t <= 0.0 {
                    0.0
                } else {
                    t.sqrt()
                }
            }

            // sin-shaped: slow start, fast middle, slow end
            FadeCurve::SCurve => (1.0 - (PI * t).cos()) * 0.5,

            // sin²(x) + cos²(x) = 1 keeps the summed power constant
            FadeCurve::EqualPower => (t * PI * 0.5).sin(),
        }
    }

    /// Get a human-readable name for the curve
    pub fn display_name(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "Linear",
            FadeCurve::SquareRoot => "Square Root",
            FadeCurve::SCurve => "S-Curve",
            FadeCurve::EqualPower => "Equal Power",
        }
    }
}

/// Crossfade settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossfadeSettings {
    /// Whether crossfade is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Fade window in seconds (1-30)
    #[serde(default = "default_duration_secs")]
    pub duration_secs: f64,

    /// Fade curve type
    #[serde(default)]
    pub curve: FadeCurve,
}

impl Default for CrossfadeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            duration_secs: DEFAULT_CROSSFADE_SECS,
            curve: FadeCurve::Linear,
        }
    }
}

impl CrossfadeSettings {
    /// Enabled settings with a specific window
    pub fn with_duration(duration_secs: f64) -> Self {
        let mut settings = Self {
            enabled: true,
            duration_secs,
            curve: FadeCurve::Linear,
        };
        settings.normalize();
        settings
    }

    /// Clamp the window into range
    pub fn normalize(&mut self) {
        self.duration_secs = if self.duration_secs.is_finite() {
            clamp_crossfade_secs(self.duration_secs)
        } else {
            DEFAULT_CROSSFADE_SECS
        };
    }
}

fn default_duration_secs() -> f64 {
    DEFAULT_CROSSFADE_SECS
}

/// Fraction of `window` elapsed between `started_at` and `now`, in [0, 1]
///
/// A zero window is complete immediately.
pub fn ramp_progress(started_at: Duration, now: Duration, window: Duration) -> f32 {
    if window.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_sub(started_at);
    (elapsed.as_secs_f64() / window.as_secs_f64()).clamp(0.0, 1.0) as f32
}

/// What a controller step did, for the manager to report
#[derive(Debug, Clone, PartialEq)]
pub enum CrossfadeOutcome {
    /// Nothing changed
    None,

    /// A secondary unit started loading the next track
    Started { to_track: Track, duration_secs: f64 },

    /// The secondary unit took over as primary and the queue advanced
    Committed { track: Track, window_secs: f64 },

    /// Ramp moved
    Progress(f32),

    /// Ramp finished and the outgoing unit was disposed
    Completed,

    /// The fade was abandoned
    Aborted { reason: String },

    /// The incoming unit failed mid-fade and the outgoing track is primary again
    RolledBack { reason: String },
}

/// Secondary unit loading, queue untouched
struct Preparing {
    incoming: PlaybackUnit,
    next_index: usize,
    track: Track,
}

/// Secondary promoted to primary, outgoing unit owned here
struct Fading {
    outgoing: PlaybackUnit,
    /// Queue entry selected before the commit advanced past it
    outgoing_track_id: Option<String>,
    started_at: Duration,
    window: Duration,
    outgoing_start_volume: f32,
    progress: f32,
}

enum Session {
    Preparing(Preparing),
    Fading(Fading),
}

/// Drives at most one crossfade session at a time
pub struct CrossfadeController {
    settings: CrossfadeSettings,
    session: Option<Session>,

    /// Primary unit a fade already failed for; no retry until it changes
    failed_for: Option<UnitId>,
}

impl CrossfadeController {
    /// Create a controller with specific settings
    pub fn new(mut settings: CrossfadeSettings) -> Self {
        settings.normalize();
        Self {
            settings,
            session: None,
            failed_for: None,
        }
    }

    // ===== Settings =====

    pub fn settings(&self) -> &CrossfadeSettings {
        &self.settings
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    pub fn toggle_enabled(&mut self) -> bool {
        self.settings.enabled = !self.settings.enabled;
        self.settings.enabled
    }

    /// Set the window, clamped to 1-30 seconds. Non-finite input is ignored.
    pub fn set_duration(&mut self, secs: f64) -> f64 {
        if secs.is_finite() {
            self.settings.duration_secs = clamp_crossfade_secs(secs);
        }
        self.settings.duration_secs
    }

    pub fn set_curve(&mut self, curve: FadeCurve) {
        self.settings.curve = curve;
    }

    // ===== Session state =====

    pub fn is_crossfading(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_preparing(&self) -> bool {
        matches!(self.session, Some(Session::Preparing(_)))
    }

    pub fn is_fading(&self) -> bool {
        matches!(self.session, Some(Session::Fading(_)))
    }

    /// Ramp progress of the active fade (0 while preparing or idle)
    pub fn progress(&self) -> f32 {
        match &self.session {
            Some(Session::Fading(f)) => f.progress,
            _ => 0.0,
        }
    }

    /// Whether the unit is held by the current session
    pub fn owns(&self, unit: UnitId) -> bool {
        match &self.session {
            Some(Session::Preparing(p)) => p.incoming.id() == unit,
            Some(Session::Fading(f)) => f.outgoing.id() == unit,
            None => false,
        }
    }

    /// Units held by the controller (0 or 1)
    pub fn unit_count(&self) -> usize {
        usize::from(self.session.is_some())
    }

    // ===== Lifecycle =====

    /// Whether the primary unit is close enough to its end to start a fade
    pub fn should_trigger(&self, core: &CorePlayer) -> bool {
        let duration = core.duration();
        self.settings.enabled
            && self.session.is_none()
            && self.failed_for != Some(core.primary_id())
            && core.is_playing()
            && duration > 0.0
            && duration - core.current_time() <= self.settings.duration_secs
    }

    /// Begin preparing the next queued track
    ///
    /// The queue is only peeked here; it advances once the secondary unit
    /// is ready.
    pub fn start(
        &mut self,
        queue: &Queue,
        core: &CorePlayer,
        host: &mut VoiceHost,
    ) -> CrossfadeOutcome {
        if self.session.is_some() {
            return CrossfadeOutcome::None;
        }
        if queue.len() < 2 {
            tracing::debug!(queue_len = queue.len(), "No distinct next track to crossfade into");
            return CrossfadeOutcome::None;
        }
        let Some(next_index) = queue.peek_next_index() else {
            return CrossfadeOutcome::None;
        };
        let Some(track) = queue.get(next_index).cloned() else {
            return CrossfadeOutcome::None;
        };

        let mut incoming = host.spawn();
        incoming.set_volume(0.0);
        incoming.set_muted(core.is_muted());
        // Crossfade continues the listening session, so the rate carries over
        incoming.set_playback_rate(core.playback_rate());

        if let Err(e) = incoming.load(&track.locator) {
            tracing::warn!(track_id = %track.id, error = %e, "Crossfade target failed to load");
            self.failed_for = Some(core.primary_id());
            return CrossfadeOutcome::Aborted {
                reason: e.to_string(),
            };
        }

        tracing::info!(
            unit = %incoming.id(),
            track_id = %track.id,
            next_index,
            duration_secs = self.settings.duration_secs,
            "Starting crossfade"
        );

        self.session = Some(Session::Preparing(Preparing {
            incoming,
            next_index,
            track: track.clone(),
        }));

        CrossfadeOutcome::Started {
            to_track: track,
            duration_secs: self.settings.duration_secs,
        }
    }

    /// Handle an event from a unit the controller owns
    pub fn handle_event(
        &mut self,
        unit: UnitId,
        event: &VoiceEvent,
        core: &mut CorePlayer,
        queue: &mut Queue,
        now: Duration,
    ) -> CrossfadeOutcome {
        enum Next {
            Nothing,
            Commit,
            Abort(String),
        }

        let next = match &mut self.session {
            Some(Session::Preparing(p)) if p.incoming.id() == unit => {
                p.incoming.observe(event);
                match event {
                    VoiceEvent::MetadataReady(_) => Next::Commit,
                    VoiceEvent::Error(code) => Next::Abort(format!("Audio error code: {code}")),
                    VoiceEvent::PlaybackRejected(reason) => {
                        Next::Abort(format!("Failed to play track: {reason}"))
                    }
                    _ => Next::Nothing,
                }
            }
            Some(Session::Fading(f)) if f.outgoing.id() == unit => {
                f.outgoing.observe(event);
                if *event == VoiceEvent::Ended {
                    tracing::trace!(unit = %unit, "Outgoing unit ended during fade");
                }
                Next::Nothing
            }
            _ => {
                tracing::trace!(unit = %unit, "Event for a unit the controller does not own");
                Next::Nothing
            }
        };

        match next {
            Next::Nothing => CrossfadeOutcome::None,
            Next::Commit => self.commit(core, queue, now),
            Next::Abort(reason) => self.abort(core, reason, true),
        }
    }

    /// Advance the ramp
    pub fn tick(&mut self, now: Duration, core: &mut CorePlayer) -> CrossfadeOutcome {
        let curve = self.settings.curve;
        let Some(Session::Fading(fading)) = &mut self.session else {
            return CrossfadeOutcome::None;
        };

        let computed = ramp_progress(fading.started_at, now, fading.window);
        fading.progress = fading.progress.max(computed);
        let progress = fading.progress;

        if progress < 1.0 {
            // Target is read live so volume changes mid-fade are honoured
            let target = core.volume();
            fading
                .outgoing
                .set_volume(fading.outgoing_start_volume * curve.calculate_gain(progress, true));
            fading.outgoing.set_muted(core.is_muted());
            core.primary_mut()
                .set_volume(target * curve.calculate_gain(progress, false));

            tracing::trace!(progress, target, "Crossfade ramp");
            return CrossfadeOutcome::Progress(progress);
        }

        self.complete(core)
    }

    /// Finish an active fade right away
    pub fn finish(&mut self, core: &mut CorePlayer) -> CrossfadeOutcome {
        if self.is_fading() {
            self.complete(core)
        } else {
            CrossfadeOutcome::None
        }
    }

    /// Tear down any session synchronously
    ///
    /// While preparing the secondary unit is disposed; while fading the
    /// outgoing unit is. Either way the primary ends at its full volume.
    /// Returns whether a session existed.
    pub fn cancel(&mut self, core: &mut CorePlayer) -> bool {
        match self.session.take() {
            None => false,
            Some(Session::Preparing(mut preparing)) => {
                preparing.incoming.dispose();
                core.apply_volume();
                tracing::debug!(track_id = %preparing.track.id, "Crossfade cancelled while preparing");
                true
            }
            Some(Session::Fading(mut fading)) => {
                fading.outgoing.pause();
                fading.outgoing.dispose();
                core.apply_volume();
                tracing::debug!(progress = fading.progress, "Crossfade cancelled mid-fade");
                true
            }
        }
    }

    /// Undo a fade whose incoming unit failed after taking over
    ///
    /// If the outgoing unit can still play and its queue entry is found, it
    /// becomes primary again at full volume and the selection goes back to
    /// it (`RolledBack`). Otherwise the outgoing unit is disposed and the
    /// failed unit stays primary with its error (`Aborted`).
    pub fn rollback(
        &mut self,
        core: &mut CorePlayer,
        queue: &mut Queue,
        reason: String,
    ) -> CrossfadeOutcome {
        let Some(Session::Fading(fading)) = self.session.take() else {
            return CrossfadeOutcome::None;
        };

        let Fading {
            mut outgoing,
            outgoing_track_id,
            ..
        } = fading;

        let alive = matches!(
            outgoing.state(),
            UnitState::Ready | UnitState::Playing | UnitState::Paused
        );
        let restore_index = match &outgoing_track_id {
            Some(id) => locate_outgoing(queue, id).map(Some),
            None => Some(None),
        };

        let Some(restore_index) = restore_index.filter(|_| alive) else {
            tracing::warn!(
                reason = %reason,
                outgoing_state = ?outgoing.state(),
                "Crossfade target failed mid-fade, outgoing track cannot resume"
            );
            outgoing.pause();
            outgoing.dispose();
            core.apply_volume();
            return CrossfadeOutcome::Aborted { reason };
        };

        let mut failed = core.swap_primary(outgoing);
        failed.dispose();
        core.clear_error();
        core.apply_volume();

        if let Some(index) = restore_index {
            queue.select(index);
        }
        self.failed_for = Some(core.primary_id());

        tracing::warn!(reason = %reason, "Crossfade target failed mid-fade, restored outgoing track");
        CrossfadeOutcome::RolledBack { reason }
    }

    /// Mirror a rate change onto a unit still being prepared
    pub fn sync_playback_rate(&mut self, rate: f64) {
        if let Some(Session::Preparing(p)) = &mut self.session {
            p.incoming.set_playback_rate(rate);
        }
    }

    /// Mirror the mute state onto the unit the controller holds
    pub fn sync_muted(&mut self, muted: bool) {
        match &mut self.session {
            Some(Session::Preparing(p)) => p.incoming.set_muted(muted),
            Some(Session::Fading(f)) => f.outgoing.set_muted(muted),
            None => {}
        }
    }

    fn commit(&mut self, core: &mut CorePlayer, queue: &mut Queue, now: Duration) -> CrossfadeOutcome {
        let Some(Session::Preparing(preparing)) = self.session.take() else {
            return CrossfadeOutcome::None;
        };
        let Preparing {
            mut incoming,
            next_index,
            track,
        } = preparing;

        let still_next = queue.peek_next_index() == Some(next_index)
            && queue.get(next_index).is_some_and(|t| t.id == track.id);
        if !still_next {
            incoming.dispose();
            core.apply_volume();
            tracing::debug!(track_id = %track.id, "Queue changed while preparing crossfade");
            return CrossfadeOutcome::Aborted {
                reason: "queue changed while preparing crossfade".to_string(),
            };
        }

        if let Err(e) = incoming.play() {
            incoming.dispose();
            return self.abort(core, e.to_string(), true);
        }

        let outgoing_track_id = queue.current_track().map(|t| t.id.clone());
        queue.advance();

        let outgoing_start_volume = core.primary().volume();
        let outgoing = core.swap_primary(incoming);

        let window_secs = outgoing.remaining().min(self.settings.duration_secs).max(0.0);
        let window = Duration::from_secs_f64(window_secs);

        tracing::debug!(
            track_id = %track.id,
            queue_index = ?queue.current_index(),
            window_secs,
            "Crossfade committed"
        );

        self.session = Some(Session::Fading(Fading {
            outgoing,
            outgoing_track_id,
            started_at: now,
            window,
            outgoing_start_volume,
            progress: 0.0,
        }));

        CrossfadeOutcome::Committed { track, window_secs }
    }

    fn complete(&mut self, core: &mut CorePlayer) -> CrossfadeOutcome {
        let Some(Session::Fading(mut fading)) = self.session.take() else {
            return CrossfadeOutcome::None;
        };

        // Exact target, never the last ramp step
        core.apply_volume();
        fading.outgoing.pause();
        fading.outgoing.dispose();

        if core.is_playing() && !core.primary().is_playing() {
            tracing::debug!("Resuming incoming unit after crossfade");
            if let Err(e) = core.primary_mut().play() {
                tracing::warn!(error = %e, "Failed to resume after crossfade");
            }
        }

        tracing::info!(unit = %core.primary_id(), "Crossfade completed");
        CrossfadeOutcome::Completed
    }

    /// Drop a session that never reached the fading phase
    fn abort(&mut self, core: &mut CorePlayer, reason: String, latch: bool) -> CrossfadeOutcome {
        if let Some(Session::Preparing(mut preparing)) = self.session.take() {
            preparing.incoming.dispose();
        }
        core.apply_volume();
        if latch {
            self.failed_for = Some(core.primary_id());
        }
        tracing::warn!(reason = %reason, "Crossfade aborted, keeping current track");
        CrossfadeOutcome::Aborted { reason }
    }
}

/// Position of the outgoing track after edits made during the fade
///
/// The queue advanced exactly once at commit, so the slot before the
/// selection is preferred over other entries with the same id.
fn locate_outgoing(queue: &Queue, track_id: &str) -> Option<usize> {
    let current = queue.current_index()?;
    let before = (current + queue.len() - 1) % queue.len();
    if queue.get(before).is_some_and(|t| t.id == track_id) {
        return Some(before);
    }
    queue.tracks().iter().position(|t| t.id == track_id)
}

impl Default for CrossfadeController {
    fn default() -> Self {
        Self::new(CrossfadeSettings::default())
    }
}

impl std::fmt::Debug for CrossfadeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phase = match &self.session {
            None => "idle",
            Some(Session::Preparing(_)) => "preparing",
            Some(Session::Fading(_)) => "fading",
        };
        f.debug_struct("CrossfadeController")
            .field("settings", &self.settings)
            .field("phase", &phase)
            .field("progress", &self.progress())
            .finish()
    }
}
