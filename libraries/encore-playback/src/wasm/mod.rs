//! WASM bindings for encore-playback
//!
//! Browser voices over `HtmlAudioElement` plus a JavaScript-facing wrapper
//! around [`crate::PlaybackManager`].

pub mod manager;
pub mod types;
pub mod voice;

pub use manager::WasmPlaybackManager;
pub use types::WasmTrack;
pub use voice::{DateClock, WebVoice, WebVoiceFactory};
