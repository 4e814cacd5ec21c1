/// Soundboard configuration
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use soundboard_core::RepressMode;
use soundboard_playback::PlaybackConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "soundboard.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SoundboardConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub playback: PlaybackSettings,

    #[serde(default)]
    pub undo: UndoSettings,

    #[serde(default)]
    pub import: ImportSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Where imported sound files live
    #[serde(default = "default_sound_dir")]
    pub sound_dir: PathBuf,

    /// Scratch space for files under review
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaybackSettings {
    /// What pressing a playing sound does
    #[serde(default)]
    pub repress_mode: RepressMode,

    #[serde(default = "default_position_poll_interval_ms")]
    pub position_poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UndoSettings {
    #[serde(default = "default_max_states")]
    pub max_states: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ImportSettings {
    #[serde(default)]
    pub auto_import: bool,

    #[serde(default)]
    pub auto_import_directory: Option<PathBuf>,

    /// Falls back to the first category when unset or unknown
    #[serde(default)]
    pub auto_import_category_id: Option<String>,
}

impl SoundboardConfig {
    /// Load configuration from file and environment
    ///
    /// Reads `path`, or `soundboard.toml` in the working directory if it
    /// exists, then applies `SOUNDBOARD_<SECTION>__<KEY>` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with SOUNDBOARD_)
        settings = settings.add_source(
            config::Environment::with_prefix("SOUNDBOARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.trim().is_empty() {
            return Err(AppError::Config("Database URL is required".to_string()));
        }

        if self.playback.position_poll_interval_ms == 0 {
            return Err(AppError::Config(
                "Position poll interval must be positive".to_string(),
            ));
        }

        if self.undo.max_states == 0 {
            return Err(AppError::Config(
                "Undo history needs room for at least one state".to_string(),
            ));
        }

        if self.import.auto_import && self.import.auto_import_directory.is_none() {
            return Err(AppError::Config(
                "Auto import is enabled but no directory is set \
                 (set SOUNDBOARD_IMPORT__AUTO_IMPORT_DIRECTORY)"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Player settings derived from this configuration
    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            position_poll_interval: Duration::from_millis(self.playback.position_poll_interval_ms),
            ..PlaybackConfig::default()
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            sound_dir: default_sound_dir(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            repress_mode: RepressMode::default(),
            position_poll_interval_ms: default_position_poll_interval_ms(),
        }
    }
}

impl Default for UndoSettings {
    fn default() -> Self {
        Self {
            max_states: default_max_states(),
        }
    }
}

// Default values
fn default_database_url() -> String {
    "sqlite://./data/soundboard.db".to_string()
}

fn default_sound_dir() -> PathBuf {
    PathBuf::from("./data/sounds")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./data/cache")
}

fn default_position_poll_interval_ms() -> u64 {
    100
}

fn default_max_states() -> usize {
    soundboard_undo::MAX_UNDO_STATES
}
