/// Application error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] soundboard_core::SoundboardError),

    #[error("Import error: {0}")]
    Import(#[from] soundboard_importer::ImportError),

    #[error("Playback error: {0}")]
    Playback(#[from] soundboard_playback::PlaybackError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<soundboard_storage::StorageError> for AppError {
    fn from(err: soundboard_storage::StorageError) -> Self {
        AppError::Store(err.into())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
