//! Audio probing with symphonia

use std::fs::File;
use std::path::Path;
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::Hint;

use crate::{ImportError, Result};

/// Supported audio file extensions and their mime types
const SUPPORTED_FORMATS: &[(&str, &str)] = &[
    ("wav", "audio/wav"),
    ("mp3", "audio/mpeg"),
    ("flac", "audio/flac"),
    ("ogg", "audio/ogg"),
    ("opus", "audio/opus"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
];

/// What probing a file reveals
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Length of the default track, if the container states it
    pub duration: Option<Duration>,
    pub mime_type: String,
    /// Title tag, if present and not blank
    pub title: Option<String>,
}

/// Check if a file has a supported audio extension
pub fn is_audio_file(path: &Path) -> bool {
    mime_type_for(path).is_some()
}

/// Mime type for a path, judged by its extension
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    SUPPORTED_FORMATS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// Read an audio file for duration, mime type and title
pub fn read_media_info(path: &Path) -> Result<MediaInfo> {
    if !path.is_file() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    let mime_type = mime_type_for(path)
        .ok_or_else(|| ImportError::UnsupportedFormat(path.display().to_string()))?;

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let mut opened = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| ImportError::Unreadable(format!("{}: {}", path.display(), e)))?;

    let duration = opened.format.default_track().and_then(|track| {
        let params = &track.codec_params;
        let frames = params.n_frames?;
        match (params.time_base, params.sample_rate) {
            (Some(time_base), _) => {
                let time = time_base.calc_time(frames);
                Some(Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac))
            }
            (None, Some(rate)) if rate > 0 => {
                Some(Duration::from_secs_f64(frames as f64 / f64::from(rate)))
            }
            _ => None,
        }
    });

    // Tags may sit in the container or ahead of it (ID3)
    let mut title = opened.format.metadata().current().and_then(title_of);
    if title.is_none() {
        title = opened
            .metadata
            .get()
            .as_ref()
            .and_then(|metadata| metadata.current())
            .and_then(title_of);
    }

    Ok(MediaInfo {
        duration,
        mime_type: mime_type.to_string(),
        title,
    })
}

fn title_of(revision: &MetadataRevision) -> Option<String> {
    revision
        .tags()
        .iter()
        .find(|tag| tag.std_key == Some(StandardTagKey::TrackTitle))
        .map(|tag| tag.value.to_string().trim().to_string())
        .filter(|title| !title.is_empty())
}
