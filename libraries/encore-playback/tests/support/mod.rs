//! Shared fixtures for the integration tests
//!
//! `FakeBackend` stands in for the browser: every voice it creates records
//! the calls made on it, and tests inject platform events (metadata,
//! progress, ended, errors) by voice index. Index 0 is the idle primary
//! created with the manager; every load or crossfade adds one more.

#![allow(dead_code)]

use encore_playback::{
    EventSink, ManualClock, PlaybackConfig, PlaybackEvent, PlaybackManager, Track, Voice,
    VoiceError, VoiceEvent, VoiceFactory,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ===== Fake voices =====

/// Everything observed on one fake voice
#[derive(Debug, Clone, Default)]
pub struct VoiceState {
    pub locator: Option<String>,
    pub loads: Vec<String>,
    pub plays: usize,
    pub pauses: usize,
    pub seeks: Vec<f64>,
    pub paused: bool,
    pub time: f64,
    pub duration: f64,
    pub volume: Option<f32>,
    pub muted: bool,
    pub rate: Option<f64>,
    pub releases: usize,
    pub dropped: bool,
}

struct VoiceRecord {
    sink: EventSink,
    state: VoiceState,
}

#[derive(Default)]
struct Shared {
    voices: Vec<VoiceRecord>,
    failing_loads: HashSet<String>,
    rejecting_plays: HashSet<String>,
}

/// Voice factory whose voices are driven by the test
#[derive(Clone, Default)]
pub struct FakeBackend {
    shared: Rc<RefCell<Shared>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> Box<dyn VoiceFactory> {
        Box::new(self.clone())
    }

    pub fn voice_count(&self) -> usize {
        self.shared.borrow().voices.len()
    }

    /// Voices that have not been released
    pub fn live_voices(&self) -> usize {
        self.shared
            .borrow()
            .voices
            .iter()
            .filter(|v| v.state.releases == 0)
            .count()
    }

    pub fn voice(&self, index: usize) -> VoiceState {
        self.shared.borrow().voices[index].state.clone()
    }

    /// Most recently created voice
    pub fn latest(&self) -> usize {
        self.voice_count() - 1
    }

    /// Last voice that loaded `locator`
    pub fn index_of(&self, locator: &str) -> Option<usize> {
        self.shared
            .borrow()
            .voices
            .iter()
            .rposition(|v| v.state.locator.as_deref() == Some(locator))
    }

    pub fn fail_loads_of(&self, locator: &str) {
        self.shared.borrow_mut().failing_loads.insert(locator.to_string());
    }

    pub fn reject_plays_of(&self, locator: &str) {
        self.shared
            .borrow_mut()
            .rejecting_plays
            .insert(locator.to_string());
    }

    pub fn allow_plays_of(&self, locator: &str) {
        self.shared.borrow_mut().rejecting_plays.remove(locator);
    }

    // ===== Platform events =====

    pub fn emit(&self, index: usize, event: VoiceEvent) {
        let sink = self.shared.borrow().voices[index].sink.clone();
        sink.emit(event);
    }

    /// Metadata loaded with the given duration
    pub fn ready(&self, index: usize, duration: f64) {
        self.shared.borrow_mut().voices[index].state.duration = duration;
        self.emit(index, VoiceEvent::MetadataReady(duration));
    }

    pub fn progress(&self, index: usize, time: f64) {
        self.shared.borrow_mut().voices[index].state.time = time;
        self.emit(index, VoiceEvent::Progress(time));
    }

    pub fn end(&self, index: usize) {
        self.emit(index, VoiceEvent::Ended);
    }

    pub fn fail(&self, index: usize, code: &str) {
        self.emit(index, VoiceEvent::Error(code.to_string()));
    }

    pub fn reject(&self, index: usize, reason: &str) {
        self.emit(index, VoiceEvent::PlaybackRejected(reason.to_string()));
    }
}

impl VoiceFactory for FakeBackend {
    fn create(&mut self, sink: EventSink) -> Box<dyn Voice> {
        let mut shared = self.shared.borrow_mut();
        let index = shared.voices.len();
        shared.voices.push(VoiceRecord {
            sink,
            state: VoiceState {
                paused: true,
                ..VoiceState::default()
            },
        });
        Box::new(FakeVoice {
            index,
            shared: Rc::clone(&self.shared),
        })
    }
}

struct FakeVoice {
    index: usize,
    shared: Rc<RefCell<Shared>>,
}

impl FakeVoice {
    fn with<R>(&self, f: impl FnOnce(&mut VoiceState) -> R) -> R {
        f(&mut self.shared.borrow_mut().voices[self.index].state)
    }
}

impl Voice for FakeVoice {
    fn load(&mut self, locator: &str) -> Result<(), VoiceError> {
        let failing = self.shared.borrow().failing_loads.contains(locator);
        self.with(|s| {
            s.loads.push(locator.to_string());
            s.locator = Some(locator.to_string());
        });
        if failing {
            return Err(VoiceError::Decode("unsupported stream".to_string()));
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), VoiceError> {
        let locator = self.with(|s| {
            s.plays += 1;
            s.locator.clone()
        });
        let rejected = locator.is_some_and(|l| self.shared.borrow().rejecting_plays.contains(&l));
        if rejected {
            return Err(VoiceError::PlaybackRejected("NotAllowedError".to_string()));
        }
        self.with(|s| s.paused = false);
        Ok(())
    }

    fn pause(&mut self) {
        self.with(|s| {
            s.pauses += 1;
            s.paused = true;
        });
    }

    fn seek(&mut self, seconds: f64) {
        self.with(|s| {
            s.seeks.push(seconds);
            s.time = seconds;
        });
    }

    fn current_time(&self) -> f64 {
        self.with(|s| s.time)
    }

    fn duration(&self) -> f64 {
        self.with(|s| s.duration)
    }

    fn is_paused(&self) -> bool {
        self.with(|s| s.paused)
    }

    fn set_volume(&mut self, level: f32) {
        self.with(|s| s.volume = Some(level));
    }

    fn set_muted(&mut self, muted: bool) {
        self.with(|s| s.muted = muted);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.with(|s| s.rate = Some(rate));
    }

    fn release(&mut self) {
        self.with(|s| s.releases += 1);
    }
}

impl Drop for FakeVoice {
    fn drop(&mut self) {
        self.with(|s| s.dropped = true);
    }
}

// ===== Harness =====

pub fn track(id: &str) -> Track {
    Track::new(
        id,
        locator(id),
        format!("Song {id}"),
        "Test Artist",
        Duration::from_secs(180),
    )
}

pub fn locator(id: &str) -> String {
    format!("https://cdn.test/stream/{id}")
}

pub struct Harness {
    pub manager: PlaybackManager,
    pub backend: FakeBackend,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new(config: PlaybackConfig) -> Self {
        init_tracing();
        let backend = FakeBackend::new();
        let clock = ManualClock::new();
        let manager = PlaybackManager::new(config, backend.factory(), Box::new(clock.clone()));
        Self {
            manager,
            backend,
            clock,
        }
    }

    /// Manager with the given tracks queued
    pub fn with_tracks(config: PlaybackConfig, ids: &[&str]) -> Self {
        let mut harness = Self::new(config);
        for id in ids {
            harness.manager.add_to_queue(track(id));
        }
        harness.manager.drain_events();
        harness
    }

    /// Crossfade enabled with a 10 second window
    pub fn crossfading(ids: &[&str]) -> Self {
        let mut config = PlaybackConfig::default();
        config.crossfade.enabled = true;
        config.crossfade.duration_secs = 10.0;
        Self::with_tracks(config, ids)
    }

    /// Voice currently carrying track `id`
    pub fn voice_for(&self, id: &str) -> usize {
        self.backend
            .index_of(&locator(id))
            .unwrap_or_else(|| panic!("no voice loaded {id}"))
    }

    /// Report metadata for the voice carrying `id` and dispatch it
    pub fn make_ready(&mut self, id: &str, duration: f64) {
        let voice = self.voice_for(id);
        self.backend.ready(voice, duration);
        self.manager.tick();
    }

    /// Play from the queue and let the first track become ready
    pub fn start(&mut self, duration: f64) -> String {
        self.manager.play().expect("play should start");
        let id = self
            .manager
            .current_track()
            .map(|t| t.id.clone())
            .expect("a queue track should be playing");
        self.make_ready(&id, duration);
        id
    }

    pub fn progress(&mut self, id: &str, time: f64) {
        let voice = self.voice_for(id);
        self.backend.progress(voice, time);
        self.manager.tick();
    }

    pub fn advance(&mut self, by: Duration) {
        self.clock.advance(by);
        self.manager.tick();
    }

    pub fn events(&mut self) -> Vec<PlaybackEvent> {
        self.manager.drain_events()
    }

    pub fn current_id(&self) -> Option<String> {
        self.manager.current_track().map(|t| t.id.clone())
    }
}
