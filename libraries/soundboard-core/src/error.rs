/// Core error types for the soundboard
use thiserror::Error;

/// Result type alias using `SoundboardError`
pub type Result<T> = std::result::Result<T, SoundboardError>;

/// Core error type shared across soundboard crates
#[derive(Error, Debug)]
pub enum SoundboardError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Audio playback errors
    #[error("Audio error: {0}")]
    Audio(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Database errors (for storage implementations)
    #[error("Database error: {0}")]
    Database(String),
}

impl SoundboardError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an audio error
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_entity_and_id() {
        let err = SoundboardError::not_found("Sound", "abc");
        assert_eq!(err.to_string(), "Sound not found: abc");
    }

    #[test]
    fn io_errors_convert_transparently() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SoundboardError = io.into();
        assert!(matches!(err, SoundboardError::Io(_)));
        assert_eq!(err.to_string(), "denied");
    }
}
