//! Soundboard Importer
//!
//! Turns audio files on disk into stored sounds.
//!
//! # Architecture
//!
//! - `checksum`: SHA-256 content hashing used for duplicate detection
//! - `media`: probing duration, mime type and title with symphonia
//! - `importer`: two-phase manual import (prepare into a cache dir, then
//!   commit into the sound dir) and unattended folder import
//! - `cleanup`: removal of files no sound refers to
//!
//! Manual import is two-phase so the user can review duplicates and names
//! before anything is stored:
//!
//! ```rust,no_run
//! use soundboard_importer::SoundImporter;
//! use soundboard_core::CategoryId;
//! use std::collections::HashSet;
//! # async fn example() -> soundboard_importer::Result<()> {
//! let importer = SoundImporter::new("/data/sounds", "/data/cache");
//! let batch = importer
//!     .prepare(vec!["/home/me/airhorn.wav".into()], HashSet::new())
//!     .await;
//! let sounds = batch.into_sounds(&importer, &CategoryId::new("effects"), false, None)?;
//! # Ok(())
//! # }
//! ```

mod error;
mod types;

pub mod checksum;
pub mod cleanup;
pub mod importer;
pub mod media;

pub use checksum::calculate_checksum;
pub use cleanup::clean_orphans;
pub use error::ImportError;
pub use importer::SoundImporter;
pub use media::{is_audio_file, read_media_info, MediaInfo};
pub use types::{AutoImportReport, ImportBatch, ImportFailure, TempSound};

/// Result type for import operations
pub type Result<T> = std::result::Result<T, ImportError>;
