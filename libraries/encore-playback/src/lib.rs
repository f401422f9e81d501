//! Encore - Client-side Playback Engine
//!
//! Platform-agnostic playback engine for the Encore music streaming client.
//!
//! This crate provides:
//! - Ordered play queue with a single selected track (circular next/previous)
//! - Transport state machine over one primary playback unit
//! - Crossfade between consecutive queue tracks (two units, volume ramp)
//! - Volume, mute and playback rate (0.5x-2.0x)
//! - Formatted accessors and a serializable snapshot for the UI
//!
//! # Architecture
//!
//! `encore-playback` never touches audio directly. Each playback unit wraps
//! a [`Voice`] supplied by the platform (an `HtmlAudioElement` in the
//! browser, see the `wasm` feature). Voices report through an
//! [`EventSink`]; the shell calls [`PlaybackManager::tick`] on a timer and
//! the manager dispatches every pending event on that one thread.
//!
//! ```text
//! Voice ──EventSink──> channel ──tick()──> PlaybackManager ──> CorePlayer (primary unit)
//!                                                │
//!                                                └──> CrossfadeController (secondary unit)
//! ```
//!
//! # Example
//!
//! ```rust
//! use encore_playback::{
//!     EventSink, ManualClock, PlaybackConfig, PlaybackManager, Track, Voice, VoiceError,
//!     VoiceEvent, VoiceFactory,
//! };
//! use std::time::Duration;
//!
//! // A voice that is ready as soon as it is loaded
//! struct SilentVoice(EventSink);
//!
//! impl Voice for SilentVoice {
//!     fn load(&mut self, _locator: &str) -> Result<(), VoiceError> {
//!         self.0.emit(VoiceEvent::MetadataReady(180.0));
//!         Ok(())
//!     }
//!     fn play(&mut self) -> Result<(), VoiceError> { Ok(()) }
//!     fn pause(&mut self) {}
//!     fn seek(&mut self, _seconds: f64) {}
//!     fn current_time(&self) -> f64 { 0.0 }
//!     fn duration(&self) -> f64 { 180.0 }
//!     fn is_paused(&self) -> bool { true }
//!     fn set_volume(&mut self, _level: f32) {}
//!     fn set_muted(&mut self, _muted: bool) {}
//!     fn set_playback_rate(&mut self, _rate: f64) {}
//!     fn release(&mut self) {}
//! }
//!
//! struct Silent;
//!
//! impl VoiceFactory for Silent {
//!     fn create(&mut self, sink: EventSink) -> Box<dyn Voice> {
//!         Box::new(SilentVoice(sink))
//!     }
//! }
//!
//! let mut manager = PlaybackManager::new(
//!     PlaybackConfig::default(),
//!     Box::new(Silent),
//!     Box::new(ManualClock::new()),
//! );
//!
//! manager.add_to_queue(Track::new(
//!     "song-1",
//!     "https://cdn.example.com/stream/song-1",
//!     "My Song",
//!     "Artist Name",
//!     Duration::from_secs(180),
//! ));
//!
//! manager.play()?;
//! manager.tick();
//!
//! assert!(manager.is_playing());
//! assert_eq!(manager.snapshot().formatted_duration, "3:00");
//! # Ok::<(), encore_playback::PlaybackError>(())
//! ```

mod clock;
mod config;
mod crossfade;
mod error;
mod events;
pub mod facade;
mod manager;
mod player;
mod queue;
pub mod types;
mod unit;
mod voice;
mod volume;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PlaybackConfig;
pub use crossfade::{
    ramp_progress, CrossfadeController, CrossfadeOutcome, CrossfadeSettings, FadeCurve,
};
pub use error::{PlaybackError, Result, VoiceError};
pub use events::PlaybackEvent;
pub use facade::PlayerSnapshot;
pub use manager::PlaybackManager;
pub use player::{CorePlayer, PlayerSignal};
pub use queue::Queue;
pub use types::{PlaybackState, Track};
pub use unit::{PlaybackUnit, UnitState};
pub use voice::{EventSink, UnitEvent, UnitId, Voice, VoiceEvent, VoiceFactory, VoiceHost};
pub use volume::Volume;
