//! Repress mode
//!
//! Decides what pressing a sound does while that sound is already playing.

use serde::{Deserialize, Serialize};

/// Behaviour when a playing sound is pressed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepressMode {
    /// Stop the sound (default)
    #[default]
    Stop,
    /// Start the sound over from the beginning
    Restart,
    /// Start another instance on top of the one already sounding
    Overlap,
    /// Pause the sound
    Pause,
}

impl RepressMode {
    /// All modes, in presentation order
    pub const ALL: [RepressMode; 4] = [Self::Stop, Self::Restart, Self::Overlap, Self::Pause];

    /// Convert to string representation for settings storage
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Overlap => "overlap",
            Self::Pause => "pause",
        }
    }

    /// Parse from string (case-insensitive)
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stop" => Some(Self::Stop),
            "restart" => Some(Self::Restart),
            "overlap" => Some(Self::Overlap),
            "pause" => Some(Self::Pause),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trip() {
        for mode in RepressMode::ALL {
            assert_eq!(RepressMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(RepressMode::from_str("OVERLAP"), Some(RepressMode::Overlap));
        assert_eq!(RepressMode::from_str("loop"), None);
    }

    #[test]
    fn default_is_stop() {
        assert_eq!(RepressMode::default(), RepressMode::Stop);
    }
}
