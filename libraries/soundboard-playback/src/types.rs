//! Core types for playback

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// State of one sound player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No backend player allocated
    #[default]
    Created,

    /// Allocated, not playing
    Stopped,

    /// Currently audible
    Playing,

    /// Paused mid-sound, resumes where it left off
    Paused,

    /// The backend reported an error
    Error,
}

impl PlaybackState {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Error => "error",
        }
    }

    /// True while the player holds backend resources
    pub fn is_initialized(&self) -> bool {
        !matches!(self, Self::Created)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// How often the position of a playing sound is sampled
    #[serde(with = "millis")]
    pub position_poll_interval: Duration,

    /// Capacity of the notification broadcast channel
    pub notification_capacity: usize,
}

/// Shortest position poll interval the player thread will use
pub const MIN_POSITION_POLL_INTERVAL: Duration = Duration::from_millis(1);

impl PlaybackConfig {
    /// Poll interval clamped to [`MIN_POSITION_POLL_INTERVAL`]
    pub fn poll_interval(&self) -> Duration {
        self.position_poll_interval.max(MIN_POSITION_POLL_INTERVAL)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            position_poll_interval: Duration::from_millis(100),
            notification_capacity: 32,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_poll_interval_is_clamped() {
        let config = PlaybackConfig {
            position_poll_interval: Duration::ZERO,
            ..PlaybackConfig::default()
        };
        assert_eq!(config.poll_interval(), MIN_POSITION_POLL_INTERVAL);
        assert_eq!(PlaybackConfig::default().poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn default_state_is_created() {
        assert_eq!(PlaybackState::default(), PlaybackState::Created);
        assert!(!PlaybackState::Created.is_initialized());
        assert!(PlaybackState::Error.is_initialized());
    }

    #[test]
    fn default_config_polls_every_100ms() {
        let config = PlaybackConfig::default();
        assert_eq!(config.position_poll_interval, Duration::from_millis(100));
    }
}
