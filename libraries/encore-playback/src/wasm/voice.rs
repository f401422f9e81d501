//! Browser voice backed by `HtmlAudioElement`

use crate::clock::Clock;
use crate::error::VoiceError;
use crate::voice::{EventSink, Voice, VoiceEvent, VoiceFactory};
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlAudioElement};

type Listener = Closure<dyn FnMut(Event)>;

/// One `<audio>` element and its event listeners
pub struct WebVoice {
    element: HtmlAudioElement,
    listeners: Vec<(&'static str, Listener)>,
    on_rejected: Option<Closure<dyn FnMut(JsValue)>>,
}

impl WebVoice {
    pub fn new(sink: EventSink) -> Result<Self, VoiceError> {
        let element = HtmlAudioElement::new().map_err(|e| VoiceError::Platform(describe(&e)))?;
        element.set_preload("auto");

        let rejected_sink = sink.clone();
        let on_rejected = Closure::wrap(Box::new(move |reason: JsValue| {
            // pause() before play() settles rejects with AbortError
            if error_name(&reason).as_deref() == Some("AbortError") {
                return;
            }
            rejected_sink.emit(VoiceEvent::PlaybackRejected(describe(&reason)));
        }) as Box<dyn FnMut(JsValue)>);

        let mut voice = Self {
            element,
            listeners: Vec::new(),
            on_rejected: Some(on_rejected),
        };
        voice.attach(&sink)?;
        Ok(voice)
    }

    fn attach(&mut self, sink: &EventSink) -> Result<(), VoiceError> {
        let el = self.element.clone();
        let s = sink.clone();
        self.listen("timeupdate", move |_| {
            s.emit(VoiceEvent::Progress(el.current_time()));
        })?;

        let el = self.element.clone();
        let s = sink.clone();
        self.listen("loadedmetadata", move |_| {
            s.emit(VoiceEvent::MetadataReady(el.duration()));
        })?;

        let s = sink.clone();
        self.listen("ended", move |_| s.emit(VoiceEvent::Ended))?;

        let el = self.element.clone();
        let s = sink.clone();
        self.listen("error", move |_| {
            let code = el.error().map_or(0, |e| e.code());
            s.emit(VoiceEvent::Error(code.to_string()));
        })?;

        let s = sink.clone();
        self.listen("waiting", move |_| s.emit(VoiceEvent::BufferingStart))?;

        let s = sink.clone();
        self.listen("canplay", move |_| s.emit(VoiceEvent::BufferingEnd))?;

        Ok(())
    }

    fn listen<F>(&mut self, name: &'static str, handler: F) -> Result<(), VoiceError>
    where
        F: FnMut(Event) + 'static,
    {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        self.element
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .map_err(|e| VoiceError::Platform(describe(&e)))?;
        self.listeners.push((name, closure));
        Ok(())
    }

    fn detach(&mut self) {
        for (name, closure) in self.listeners.drain(..) {
            let _ = self
                .element
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
    }
}

impl Voice for WebVoice {
    fn load(&mut self, locator: &str) -> Result<(), VoiceError> {
        self.element.set_src(locator);
        self.element.load();
        Ok(())
    }

    fn play(&mut self) -> Result<(), VoiceError> {
        let promise = self
            .element
            .play()
            .map_err(|e| VoiceError::PlaybackRejected(describe(&e)))?;
        if let Some(on_rejected) = &self.on_rejected {
            let _ = promise.catch(on_rejected);
        }
        Ok(())
    }

    fn pause(&mut self) {
        let _ = self.element.pause();
    }

    fn seek(&mut self, seconds: f64) {
        self.element.set_current_time(seconds);
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn duration(&self) -> f64 {
        let duration = self.element.duration();
        if duration.is_finite() {
            duration
        } else {
            0.0
        }
    }

    fn is_paused(&self) -> bool {
        self.element.paused()
    }

    fn set_volume(&mut self, level: f32) {
        self.element.set_volume(f64::from(level));
    }

    fn set_muted(&mut self, muted: bool) {
        self.element.set_muted(muted);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.element.set_playback_rate(rate);
    }

    fn release(&mut self) {
        let _ = self.element.pause();
        self.detach();
        let _ = self.element.remove_attribute("src");
        self.element.load();
    }
}

impl Drop for WebVoice {
    fn drop(&mut self) {
        self.detach();
        // A pending play() promise may still settle after the element is gone
        if let Some(on_rejected) = self.on_rejected.take() {
            on_rejected.forget();
        }
    }
}

/// Voice used when the browser refused to create an element
struct UnavailableVoice {
    reason: String,
}

impl Voice for UnavailableVoice {
    fn load(&mut self, _locator: &str) -> Result<(), VoiceError> {
        Err(VoiceError::Platform(self.reason.clone()))
    }

    fn play(&mut self) -> Result<(), VoiceError> {
        Err(VoiceError::Platform(self.reason.clone()))
    }

    fn pause(&mut self) {}

    fn seek(&mut self, _seconds: f64) {}

    fn current_time(&self) -> f64 {
        0.0
    }

    fn duration(&self) -> f64 {
        0.0
    }

    fn is_paused(&self) -> bool {
        true
    }

    fn set_volume(&mut self, _level: f32) {}

    fn set_muted(&mut self, _muted: bool) {}

    fn set_playback_rate(&mut self, _rate: f64) {}

    fn release(&mut self) {}
}

/// Creates one `<audio>` element per playback unit
#[derive(Debug, Default)]
pub struct WebVoiceFactory;

impl VoiceFactory for WebVoiceFactory {
    fn create(&mut self, sink: EventSink) -> Box<dyn Voice> {
        match WebVoice::new(sink) {
            Ok(voice) => Box::new(voice),
            Err(e) => {
                tracing::error!(error = %e, "Could not create audio element");
                Box::new(UnavailableVoice {
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Clock backed by `Date.now()`; `Instant` is unavailable on wasm32
#[derive(Debug, Clone, Copy)]
pub struct DateClock {
    origin_ms: f64,
}

impl DateClock {
    pub fn new() -> Self {
        Self {
            origin_ms: js_sys::Date::now(),
        }
    }
}

impl Default for DateClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for DateClock {
    fn now(&self) -> Duration {
        let elapsed = (js_sys::Date::now() - self.origin_ms).max(0.0);
        Duration::from_secs_f64(elapsed / 1000.0)
    }
}

fn error_name(value: &JsValue) -> Option<String> {
    js_sys::Reflect::get(value, &JsValue::from_str("name"))
        .ok()
        .and_then(|name| name.as_string())
}

fn describe(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
