//! Error types for playback

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The audio backend could not be set up
    #[error("Audio backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A backend player could not be created for a source
    #[error("Failed to create player for {uri}: {reason}")]
    PlayerCreation { uri: String, reason: String },

    /// Audio decoding error
    #[error("Decode error: {0}")]
    Decode(String),

    /// Output device error
    #[error("Device error: {0}")]
    Device(String),

    /// The player thread is gone
    #[error("Player thread stopped")]
    ThreadStopped,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaybackError {
    /// Create a player creation error
    pub fn player_creation(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PlayerCreation {
            uri: uri.into(),
            reason: reason.into(),
        }
    }
}

impl From<PlaybackError> for soundboard_core::SoundboardError {
    fn from(err: PlaybackError) -> Self {
        Self::audio(err.to_string())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
