//! Test helpers and fixtures for storage integration tests
//!
//! These helpers create test databases using REAL SQLite files (NOT in-memory)
//! so migrations, foreign keys and cascades behave as in production.

#![allow(dead_code)]

use soundboard_core::types::{Category, CategoryId, Sound};
use soundboard_core::SoundboardStore;
use soundboard_storage::LocalStore;
use tempfile::TempDir;

/// Test database wrapper that cleans up on drop
pub struct TestDb {
    pub store: LocalStore,
    _temp_dir: TempDir,
}

impl TestDb {
    /// Create a new test database with migrations applied
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let store = LocalStore::open(&db_url)
            .await
            .expect("Failed to open store");

        Self {
            store,
            _temp_dir: temp_dir,
        }
    }
}

/// Test fixture: insert a category at `position`
pub async fn create_test_category(store: &LocalStore, name: &str, position: i32) -> Category {
    let category = Category::new(name, 0xFF00_FF00, position);
    store
        .insert_category(&category)
        .await
        .expect("Failed to create test category");
    category
}

/// Test fixture: insert a sound into `category_id`
pub async fn create_test_sound(
    store: &LocalStore,
    category_id: &CategoryId,
    name: &str,
    checksum: &str,
) -> Sound {
    let sound = Sound::new(
        category_id.clone(),
        name,
        format!("/sounds/{name}.wav"),
        checksum,
        "audio/wav",
    );
    store
        .insert_sounds(std::slice::from_ref(&sound))
        .await
        .expect("Failed to create test sound");
    sound
}
