//! Error types for playback management

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlaybackError {
    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// The selected track cannot be removed
    #[error("Track at index {0} is selected and cannot be removed")]
    SelectedTrackLocked(usize),

    /// Seek target was NaN or infinite
    #[error("Invalid seek position: {0}")]
    InvalidSeekPosition(f64),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Failure reported by the platform voice
    #[error(transparent)]
    Voice(#[from] VoiceError),

    /// Configuration could not be loaded or is out of range
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised by a platform voice
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VoiceError {
    /// The platform refused to start playback (e.g. autoplay policy)
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    /// The resource could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The resource format is not supported
    #[error("Unsupported source: {0}")]
    Unsupported(String),

    /// The voice was already released
    #[error("Voice already released")]
    Released,

    /// Any other platform failure
    #[error("Platform error: {0}")]
    Platform(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
