//! Error types for the importer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] soundboard_core::SoundboardError),

    #[error("Could not read audio: {0}")]
    Unreadable(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Import task failed: {0}")]
    Task(String),
}

impl From<ImportError> for soundboard_core::SoundboardError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Storage(inner) => inner,
            ImportError::Io(inner) => Self::Io(inner),
            other => Self::invalid_input(other.to_string()),
        }
    }
}
