//! Listener and notification types

use std::time::Duration;

/// Observer of one sound player
///
/// Callbacks run on the player thread and must return quickly; hand any
/// I/O to a task.
pub trait SoundPlayerListener: Send + Sync {
    /// A new, positive duration was reported for the sound
    fn on_duration_changed(&self, duration: Duration) {
        let _ = duration;
    }

    /// A play-out of the sound reached its natural end
    fn on_playback_ended(&self) {}
}

/// User-facing playback notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackNotification {
    /// A backend player raised an error
    Error { uri: String, message: String },

    /// A backend player could not be created
    Unavailable { uri: String, message: String },
}

impl PlaybackNotification {
    /// URI of the sound the notification is about
    pub fn uri(&self) -> &str {
        match self {
            Self::Error { uri, .. } | Self::Unavailable { uri, .. } => uri,
        }
    }

    /// Human readable message
    pub fn message(&self) -> &str {
        match self {
            Self::Error { message, .. } | Self::Unavailable { message, .. } => message,
        }
    }
}
