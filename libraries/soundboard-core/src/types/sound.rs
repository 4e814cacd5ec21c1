/// Sound domain type, ordering and search
use crate::types::{CategoryId, SoundId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;
use std::time::Duration;

/// A playable audio clip belonging to one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sound {
    /// Unique sound identifier
    pub id: SoundId,

    /// Display name
    pub name: String,

    /// Location of the audio file (plain path or `file://` URI)
    pub uri: String,

    /// Clip length, `None` until measured
    pub duration: Option<Duration>,

    /// Volume multiplier (0.0 - 1.0)
    pub volume: f32,

    /// Owning category
    pub category_id: CategoryId,

    /// Content hash used for duplicate detection
    pub checksum: String,

    /// Creation timestamp (millisecond precision)
    pub created_at: DateTime<Utc>,

    /// Number of completed play-outs
    pub play_count: u32,

    /// MIME type of the audio file
    pub mime_type: String,
}

impl Sound {
    /// Create a new sound at full volume with no measured duration
    pub fn new(
        category_id: CategoryId,
        name: impl Into<String>,
        uri: impl Into<String>,
        checksum: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: SoundId::generate(),
            name: name.into(),
            uri: uri.into(),
            duration: None,
            volume: 1.0,
            category_id,
            checksum: checksum.into(),
            created_at: now_millis(),
            play_count: 0,
            mime_type: mime_type.into(),
        }
    }

    /// Set the duration (builder style)
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Local file system path of the audio file
    pub fn file_path(&self) -> PathBuf {
        PathBuf::from(self.uri.strip_prefix("file://").unwrap_or(&self.uri))
    }
}

/// Truncated to millis so values survive a round trip through storage unchanged
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Key used to order sounds within a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SoundSortingKey {
    /// Alphabetical, case-insensitive (default)
    #[default]
    Name,
    /// Clip length
    Length,
    /// Time the sound was added
    CreationTime,
    /// Number of plays
    PlayCount,
}

impl SoundSortingKey {
    /// Convert to string representation for database storage
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Length => "length",
            Self::CreationTime => "creation_time",
            Self::PlayCount => "play_count",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "length" => Some(Self::Length),
            "creation_time" => Some(Self::CreationTime),
            "play_count" => Some(Self::PlayCount),
            _ => None,
        }
    }

    /// Compare two sounds by this key in ascending order
    pub fn compare(&self, a: &Sound, b: &Sound) -> Ordering {
        match self {
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::Length => a.duration.cmp(&b.duration),
            Self::CreationTime => a.created_at.cmp(&b.created_at),
            Self::PlayCount => a.play_count.cmp(&b.play_count),
        }
    }
}

/// Sort sounds in place by `key`, reversing for descending order
pub fn sort_sounds(sounds: &mut [Sound], key: SoundSortingKey, ascending: bool) {
    sounds.sort_by(|a, b| {
        let ordering = key.compare(a, b);
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

/// Keep the sounds whose name contains `term`, ignoring case
///
/// An empty or missing term keeps everything.
pub fn filter_by_search_term<'a, I>(sounds: I, term: Option<&str>) -> Vec<Sound>
where
    I: IntoIterator<Item = &'a Sound>,
{
    let needle = term.map(str::to_lowercase).filter(|t| !t.is_empty());

    sounds
        .into_iter()
        .filter(|sound| match &needle {
            Some(needle) => sound.name.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .cloned()
        .collect()
}
