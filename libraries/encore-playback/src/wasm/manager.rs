//! WASM-compatible PlaybackManager wrapper

use super::types::WasmTrack;
use super::voice::{DateClock, WebVoiceFactory};
use crate::{FadeCurve, PlaybackConfig, PlaybackError, PlaybackEvent, PlaybackManager, Track};
use js_sys::Function;
use wasm_bindgen::prelude::*;

/// WASM-compatible playback manager
///
/// Wraps [`PlaybackManager`] with a JavaScript-friendly API. The page is
/// expected to call `tick()` every `tickIntervalMs` milliseconds; queued
/// engine events are delivered to the registered callbacks after every
/// call that can change state.
#[wasm_bindgen]
pub struct WasmPlaybackManager {
    inner: PlaybackManager,

    // Event callbacks
    on_state_change: Option<Function>,
    on_track_change: Option<Function>,
    on_queue_change: Option<Function>,
    on_crossfade: Option<Function>,
    on_volume_change: Option<Function>,
    on_error: Option<Function>,
}

#[wasm_bindgen]
impl WasmPlaybackManager {
    /// Create a new playback manager
    ///
    /// `config` is an optional plain object with the same shape as the
    /// engine configuration (`volume`, `tick_interval_ms`, `crossfade`).
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmPlaybackManager, JsValue> {
        console_error_panic_hook::set_once();

        let config: PlaybackConfig = if config.is_undefined() || config.is_null() {
            PlaybackConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {e}")))?
        };
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(Self {
            inner: PlaybackManager::new(
                config,
                Box::new(WebVoiceFactory),
                Box::new(DateClock::new()),
            ),
            on_state_change: None,
            on_track_change: None,
            on_queue_change: None,
            on_crossfade: None,
            on_volume_change: None,
            on_error: None,
        })
    }

    // ===== Event Loop =====

    /// Drain audio events and advance the crossfade ramp
    pub fn tick(&mut self) {
        self.inner.tick();
        self.flush();
    }

    /// Interval the page should call `tick()` at
    #[wasm_bindgen(js_name = tickIntervalMs)]
    pub fn tick_interval_ms(&self) -> f64 {
        self.inner.tick_interval().as_secs_f64() * 1000.0
    }

    // ===== Playback Control =====

    /// Start or resume playback
    pub fn play(&mut self) -> Result<(), JsValue> {
        let result = self.inner.play();
        self.finish(result)
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.inner.pause();
        self.flush();
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&mut self) -> Result<(), JsValue> {
        let result = self.inner.toggle_play();
        self.finish(result)
    }

    /// Stop playback and unload the current track
    pub fn stop(&mut self) {
        self.inner.stop();
        self.flush();
    }

    /// Load a stream locator directly, bypassing the queue
    #[wasm_bindgen(js_name = loadTrack)]
    pub fn load_track(&mut self, locator: &str) -> Result<(), JsValue> {
        let result = self.inner.load_track(locator);
        self.finish(result)
    }

    /// Skip to next track
    pub fn next(&mut self) -> Result<(), JsValue> {
        let result = self.inner.play_next();
        self.finish(result)
    }

    /// Go to previous track
    pub fn previous(&mut self) -> Result<(), JsValue> {
        let result = self.inner.play_previous();
        self.finish(result)
    }

    /// Play the track at a queue index
    #[wasm_bindgen(js_name = playFromQueue)]
    pub fn play_from_queue(&mut self, index: usize) -> Result<(), JsValue> {
        let result = self.inner.play_from_queue(index);
        self.finish(result)
    }

    // ===== Seeking =====

    /// Seek to position in seconds
    pub fn seek(&mut self, position_secs: f64) -> Result<(), JsValue> {
        let result = self.inner.seek(position_secs);
        self.finish(result)
    }

    /// Seek to position by percentage (0 - 100)
    #[wasm_bindgen(js_name = seekByPercentage)]
    pub fn seek_by_percentage(&mut self, percent: f64) -> Result<(), JsValue> {
        let result = self.inner.seek_by_percentage(percent);
        self.finish(result)
    }

    /// Update the seek bar hover preview (`undefined` clears it)
    #[wasm_bindgen(js_name = updateSeekPreview)]
    pub fn update_seek_preview(&mut self, percent: Option<f64>) {
        self.inner.update_seek_preview(percent);
    }

    // ===== Volume & Speed =====

    /// Set volume (0.0 - 1.0)
    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&mut self, level: f32) -> f32 {
        let level = self.inner.set_volume(level);
        self.flush();
        level
    }

    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.inner.toggle_mute();
        self.flush();
        muted
    }

    #[wasm_bindgen(js_name = setPlaybackRate)]
    pub fn set_playback_rate(&mut self, rate: f64) -> f64 {
        let rate = self.inner.set_playback_rate(rate);
        self.flush();
        rate
    }

    #[wasm_bindgen(js_name = increasePlaybackSpeed)]
    pub fn increase_playback_speed(&mut self) -> f64 {
        let rate = self.inner.increase_playback_speed();
        self.flush();
        rate
    }

    #[wasm_bindgen(js_name = decreasePlaybackSpeed)]
    pub fn decrease_playback_speed(&mut self) -> f64 {
        let rate = self.inner.decrease_playback_speed();
        self.flush();
        rate
    }

    // ===== Crossfade =====

    #[wasm_bindgen(js_name = toggleCrossfade)]
    pub fn toggle_crossfade(&mut self) -> bool {
        self.inner.toggle_crossfade()
    }

    /// Set the crossfade window in seconds (1 - 30)
    #[wasm_bindgen(js_name = setCrossfadeDuration)]
    pub fn set_crossfade_duration(&mut self, seconds: f64) -> f64 {
        self.inner.set_crossfade_duration(seconds)
    }

    /// Set fade curve ("linear" | "square_root" | "s_curve" | "equal_power")
    #[wasm_bindgen(js_name = setFadeCurve)]
    pub fn set_fade_curve(&mut self, curve: &str) -> Result<(), JsValue> {
        let curve = match curve {
            "linear" => FadeCurve::Linear,
            "square_root" => FadeCurve::SquareRoot,
            "s_curve" => FadeCurve::SCurve,
            "equal_power" => FadeCurve::EqualPower,
            _ => {
                return Err(JsValue::from_str(
                    "Invalid fade curve. Use 'linear', 'square_root', 's_curve' or 'equal_power'",
                ))
            }
        };
        self.inner.set_fade_curve(curve);
        Ok(())
    }

    // ===== Queue Management =====

    /// Add track to end of queue
    #[wasm_bindgen(js_name = addToQueue)]
    pub fn add_to_queue(&mut self, track: JsValue) -> Result<(), JsValue> {
        let track = WasmTrack::from_js(track)?;
        self.inner.add_to_queue(track);
        self.flush();
        Ok(())
    }

    /// Append an array of plain track objects to the queue
    #[wasm_bindgen(js_name = appendToQueue)]
    pub fn append_to_queue(&mut self, tracks: JsValue) -> Result<(), JsValue> {
        let tracks: Vec<WasmTrack> = serde_wasm_bindgen::from_value(tracks)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse tracks: {e}")))?;

        self.inner
            .add_all_to_queue(tracks.into_iter().map(Track::from));
        self.flush();
        Ok(())
    }

    #[wasm_bindgen(js_name = insertIntoQueue)]
    pub fn insert_into_queue(&mut self, track: JsValue, index: usize) -> Result<(), JsValue> {
        let track = WasmTrack::from_js(track)?;
        let result = self.inner.insert_into_queue(track, index);
        self.finish(result)
    }

    /// Remove track from queue by index, returning it
    #[wasm_bindgen(js_name = removeFromQueue)]
    pub fn remove_from_queue(&mut self, index: usize) -> Result<JsValue, JsValue> {
        let result = self.inner.remove_from_queue(index);
        self.finish_track(result)
    }

    #[wasm_bindgen(js_name = removeFromQueueById)]
    pub fn remove_from_queue_by_id(&mut self, id: &str) -> Result<JsValue, JsValue> {
        let result = self.inner.remove_from_queue_by_id(id);
        self.finish_track(result)
    }

    #[wasm_bindgen(js_name = moveInQueue)]
    pub fn move_in_queue(&mut self, from: usize, to: usize) -> Result<(), JsValue> {
        let result = self.inner.move_in_queue(from, to);
        self.finish(result)
    }

    /// Clear entire queue (playback continues)
    #[wasm_bindgen(js_name = clearQueue)]
    pub fn clear_queue(&mut self) {
        self.inner.clear_queue();
        self.flush();
    }

    /// Get all tracks in queue
    #[wasm_bindgen(js_name = getQueue)]
    pub fn get_queue(&self) -> JsValue {
        let tracks: Vec<WasmTrack> = self.inner.queue().tracks().iter().map(WasmTrack::from).collect();
        serde_wasm_bindgen::to_value(&tracks).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = isTrackSelected)]
    pub fn is_track_selected(&self, id: &str) -> bool {
        self.inner.is_track_selected(id)
    }

    // ===== State Queries =====

    /// Everything the player UI renders, as a plain object
    #[wasm_bindgen(js_name = getSnapshot)]
    pub fn get_snapshot(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.snapshot()).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.inner.is_playing()
    }

    #[wasm_bindgen(js_name = isCrossfading)]
    pub fn is_crossfading(&self) -> bool {
        self.inner.is_crossfading()
    }

    #[wasm_bindgen(js_name = getCurrentTime)]
    pub fn get_current_time(&self) -> f64 {
        self.inner.current_time()
    }

    #[wasm_bindgen(js_name = getDuration)]
    pub fn get_duration(&self) -> f64 {
        self.inner.duration()
    }

    #[wasm_bindgen(js_name = getCurrentTrack)]
    pub fn get_current_track(&self) -> JsValue {
        self.inner.current_track().map_or(JsValue::NULL, WasmTrack::to_js)
    }

    // ===== Event Listeners =====

    /// Register state change callback
    #[wasm_bindgen(js_name = onStateChange)]
    pub fn on_state_change(&mut self, callback: Function) {
        self.on_state_change = Some(callback);
    }

    /// Register track change callback
    #[wasm_bindgen(js_name = onTrackChange)]
    pub fn on_track_change(&mut self, callback: Function) {
        self.on_track_change = Some(callback);
    }

    #[wasm_bindgen(js_name = onQueueChange)]
    pub fn on_queue_change(&mut self, callback: Function) {
        self.on_queue_change = Some(callback);
    }

    /// Register crossfade callback (started / progress / completed / aborted)
    #[wasm_bindgen(js_name = onCrossfade)]
    pub fn on_crossfade(&mut self, callback: Function) {
        self.on_crossfade = Some(callback);
    }

    /// Register volume, mute and rate callback
    #[wasm_bindgen(js_name = onVolumeChange)]
    pub fn on_volume_change(&mut self, callback: Function) {
        self.on_volume_change = Some(callback);
    }

    #[wasm_bindgen(js_name = onError)]
    pub fn on_error(&mut self, callback: Function) {
        self.on_error = Some(callback);
    }

    // ===== Internal Event Emitters =====

    fn finish(&mut self, result: crate::Result<()>) -> Result<(), JsValue> {
        self.flush();
        result.map_err(|e| to_js_error(&e))
    }

    fn finish_track(&mut self, result: crate::Result<Track>) -> Result<JsValue, JsValue> {
        self.flush();
        let track = result.map_err(|e| to_js_error(&e))?;
        Ok(WasmTrack::to_js(&track))
    }

    fn flush(&mut self) {
        for event in self.inner.drain_events() {
            let callback = match &event {
                PlaybackEvent::StateChanged { .. } => &self.on_state_change,
                PlaybackEvent::TrackChanged { .. } => &self.on_track_change,
                PlaybackEvent::QueueChanged { .. } => &self.on_queue_change,
                PlaybackEvent::CrossfadeStarted { .. }
                | PlaybackEvent::CrossfadeProgress { .. }
                | PlaybackEvent::CrossfadeCompleted
                | PlaybackEvent::CrossfadeAborted { .. } => &self.on_crossfade,
                PlaybackEvent::VolumeChanged { .. } | PlaybackEvent::PlaybackRateChanged { .. } => {
                    &self.on_volume_change
                }
                PlaybackEvent::Error { .. } => &self.on_error,
            };
            let Some(cb) = callback else {
                continue;
            };
            match serde_wasm_bindgen::to_value(&event) {
                Ok(js_event) => {
                    if let Err(e) = cb.call1(&JsValue::NULL, &js_event) {
                        web_sys::console::error_2(&JsValue::from_str("Playback callback threw"), &e);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to serialize playback event"),
            }
        }
    }
}

fn to_js_error(error: &PlaybackError) -> JsValue {
    JsValue::from_str(&error.to_string())
}
