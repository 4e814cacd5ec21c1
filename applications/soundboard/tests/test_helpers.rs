//! Fixtures for soundboard service tests
//!
//! `TestBoard` opens the service the way the binary does, on a real SQLite
//! file under a temp dir.

#![allow(dead_code)]

use soundboard::{Soundboard, SoundboardConfig};
use soundboard_core::testing::MemoryStore;
use soundboard_core::{Category, RepressMode, Sound};
use soundboard_importer::SoundImporter;
use soundboard_playback::testing::FakeBackend;
use soundboard_playback::{PlaybackConfig, PlayerRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestBoard {
    pub soundboard: Soundboard,
    pub config: SoundboardConfig,
    pub temp: TempDir,
}

impl TestBoard {
    pub async fn new() -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let config = config_in(temp.path());
        let soundboard = Soundboard::open(&config).await.expect("Failed to open soundboard");

        Self {
            soundboard,
            config,
            temp,
        }
    }

    /// Open the same database again, as a restarted app would
    pub async fn reopen(&self) -> Soundboard {
        Soundboard::open(&self.config)
            .await
            .expect("Failed to reopen soundboard")
    }

    pub async fn default_category(&self) -> Category {
        self.soundboard
            .categories()
            .await
            .unwrap()
            .into_iter()
            .next()
            .expect("no categories")
    }

    /// Directory for source files outside the soundboard's own dirs
    pub fn source_dir(&self) -> PathBuf {
        let dir = self.temp.path().join("source");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn names(categories: &[Category]) -> Vec<&str> {
        categories.iter().map(|c| c.name.as_str()).collect()
    }
}

pub fn config_in(dir: &Path) -> SoundboardConfig {
    let mut config = SoundboardConfig::default();
    config.storage.database_url = format!("sqlite://{}", dir.join("soundboard.db").display());
    config.storage.sound_dir = dir.join("sounds");
    config.storage.cache_dir = dir.join("cache");
    config
}

/// Service over an in-memory store with fake audio output
pub struct PlayingBoard {
    pub soundboard: Soundboard,
    pub store: Arc<MemoryStore>,
    pub backend: FakeBackend,
    pub sound: Sound,
    _temp: TempDir,
}

impl PlayingBoard {
    pub async fn new(mode: RepressMode) -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let store = Arc::new(MemoryStore::new());
        let backend = FakeBackend::new();
        let thread_backend = backend.clone();
        let registry = PlayerRegistry::new(store.clone(), PlaybackConfig::default(), move || {
            Ok(thread_backend)
        })
        .expect("Failed to start registry");

        let importer = SoundImporter::new(temp.path().join("sounds"), temp.path().join("cache"));
        let soundboard = Soundboard::new(store.clone(), importer, 10)
            .await
            .unwrap()
            .with_players(registry)
            .with_repress_mode(mode);

        let category = soundboard.create_category("Effects", 0xFF00_00FF).await.unwrap();
        let sound = Sound::new(category.id, "Airhorn", "/sounds/airhorn.wav", "abc123", "audio/wav");
        soundboard.add_sounds(&[sound.clone()]).await.unwrap();

        Self {
            soundboard,
            store,
            backend,
            sound,
            _temp: temp,
        }
    }
}

/// Write a short silent mono 16-bit WAV whose content depends on `seed`
pub fn write_wav(path: &Path, seed: u8) {
    const RATE: u32 = 8000;
    let frames: u32 = 800;
    let data_len = frames * 2;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&RATE.to_le_bytes());
    bytes.extend_from_slice(&(RATE * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.extend(std::iter::repeat([seed, 0]).take(frames as usize).flatten());

    std::fs::write(path, bytes).expect("Failed to write wav");
}
