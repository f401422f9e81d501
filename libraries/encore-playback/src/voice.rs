//! Platform audio primitive
//!
//! A [`Voice`] is one decode/output resource (an `<audio>` element in the
//! browser, a scripted fake in tests). Voices report timing and lifecycle
//! through an [`EventSink`]; every event is tagged with the [`UnitId`] of
//! the unit that owns the voice and lands on a single channel drained by
//! the manager. Events whose unit is no longer owned by anyone are dropped
//! there, which is what "detaching" a subscription means here.

use crate::error::VoiceError;
use crate::unit::PlaybackUnit;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::fmt;

/// Identity of a playback unit, unique per [`VoiceHost`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u64);

impl UnitId {
    pub(crate) fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Timing and lifecycle notifications from a voice
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEvent {
    /// Playback position moved (seconds)
    Progress(f64),

    /// Duration metadata is available (seconds). The unit is ready.
    MetadataReady(f64),

    /// Reached the end of the resource
    Ended,

    /// The resource failed; carries the platform error code
    Error(String),

    /// Playback stalled waiting for data
    BufferingStart,

    /// Enough data buffered to continue
    BufferingEnd,

    /// The platform refused a play request after it was issued
    PlaybackRejected(String),
}

/// Event tagged with the unit it came from
#[derive(Debug, Clone, PartialEq)]
pub struct UnitEvent {
    pub unit: UnitId,
    pub event: VoiceEvent,
}

/// Sending half handed to a voice at creation
#[derive(Debug, Clone)]
pub struct EventSink {
    unit: UnitId,
    tx: Sender<UnitEvent>,
}

impl EventSink {
    /// Unit this sink reports for
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Queue an event for the dispatcher
    pub fn emit(&self, event: VoiceEvent) {
        if self
            .tx
            .send(UnitEvent {
                unit: self.unit,
                event,
            })
            .is_err()
        {
            tracing::trace!(unit = %self.unit, "Event channel closed, dropping voice event");
        }
    }
}

/// One platform decode/output resource
///
/// Implementations must not call back into the engine synchronously; all
/// notifications go through the [`EventSink`] they were created with.
pub trait Voice {
    /// Assign a resource and start preparing it
    fn load(&mut self, locator: &str) -> Result<(), VoiceError>;

    /// Request playback. A rejection may also arrive later as
    /// [`VoiceEvent::PlaybackRejected`].
    fn play(&mut self) -> Result<(), VoiceError>;

    fn pause(&mut self);

    /// Jump to a position in seconds (already clamped by the caller)
    fn seek(&mut self, seconds: f64);

    /// Position reported by the platform, in seconds
    fn current_time(&self) -> f64;

    /// Duration reported by the platform, in seconds (0 if unknown)
    fn duration(&self) -> f64;

    fn is_paused(&self) -> bool;

    fn set_volume(&mut self, level: f32);

    fn set_muted(&mut self, muted: bool);

    fn set_playback_rate(&mut self, rate: f64);

    /// Free the underlying resource. Called exactly once per voice.
    fn release(&mut self);
}

/// Creates voices bound to an event sink
pub trait VoiceFactory {
    fn create(&mut self, sink: EventSink) -> Box<dyn Voice>;
}

/// Owns the voice factory and the shared event channel
pub struct VoiceHost {
    factory: Box<dyn VoiceFactory>,
    tx: Sender<UnitEvent>,
    rx: Receiver<UnitEvent>,
    next_id: u64,
}

impl VoiceHost {
    pub fn new(factory: Box<dyn VoiceFactory>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            factory,
            tx,
            rx,
            next_id: 1,
        }
    }

    /// Create a fresh, uninitialized playback unit
    pub fn spawn(&mut self) -> PlaybackUnit {
        let id = UnitId(self.next_id);
        self.next_id += 1;

        let sink = EventSink {
            unit: id,
            tx: self.tx.clone(),
        };
        let voice = self.factory.create(sink);
        tracing::trace!(unit = %id, "Spawned playback unit");

        PlaybackUnit::new(id, voice)
    }

    /// Next pending event, if any
    pub fn try_next_event(&self) -> Option<UnitEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Number of events waiting to be dispatched
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl fmt::Debug for VoiceHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceHost")
            .field("next_id", &self.next_id)
            .field("pending", &self.rx.len())
            .finish_non_exhaustive()
    }
}
