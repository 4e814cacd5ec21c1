//! Import data types

use soundboard_core::{Sound, SoundId};
use std::path::PathBuf;
use std::time::Duration;

/// A file copied into the cache dir, awaiting review
#[derive(Debug, Clone, PartialEq)]
pub struct TempSound {
    /// Id the stored sound will get
    pub id: SoundId,
    pub name: String,
    /// Location of the cached copy
    pub file: PathBuf,
    pub duration: Option<Duration>,
    pub checksum: String,
    /// Content matches an existing sound or an earlier file of the batch
    pub is_duplicate: bool,
    pub mime_type: String,
}

/// A file that could not be prepared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Result of preparing a set of files
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportBatch {
    pub sounds: Vec<TempSound>,
    pub errors: Vec<ImportFailure>,
}

impl ImportBatch {
    /// Number of prepared files flagged as duplicates
    pub fn duplicate_count(&self) -> usize {
        self.sounds.iter().filter(|s| s.is_duplicate).count()
    }

    /// True when nothing was prepared and nothing failed
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty() && self.errors.is_empty()
    }
}

/// Result of an unattended folder import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoImportReport {
    /// Sounds inserted into the store
    pub imported: Vec<Sound>,
    /// Audio files skipped because their content is already stored
    pub skipped: usize,
    pub errors: Vec<ImportFailure>,
}
