//! Storage contract for categories and sounds

use crate::error::Result;
use crate::types::{Category, CategoryId, Sound, SoundId};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;

/// One step of an ordered, atomically applied write batch
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOperation {
    /// Insert (or replace by id) categories
    InsertCategories(Vec<Category>),
    /// Update existing categories by id
    UpdateCategories(Vec<Category>),
    /// Delete categories (their sounds cascade)
    DeleteCategories(Vec<CategoryId>),
    /// Insert (or replace by id) sounds
    InsertSounds(Vec<Sound>),
    /// Update existing sounds by id
    UpdateSounds(Vec<Sound>),
    /// Delete sounds
    DeleteSounds(Vec<SoundId>),
}

impl StoreOperation {
    /// Number of rows the operation touches
    pub fn len(&self) -> usize {
        match self {
            Self::InsertCategories(c) | Self::UpdateCategories(c) => c.len(),
            Self::DeleteCategories(ids) => ids.len(),
            Self::InsertSounds(s) | Self::UpdateSounds(s) => s.len(),
            Self::DeleteSounds(ids) => ids.len(),
        }
    }

    /// True when the operation touches no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Persistent category and sound storage
///
/// Inserts replace any existing row with the same id. Lookups by id report
/// misses as `Ok(None)`. Deleting a category deletes its sounds.
#[async_trait]
pub trait SoundboardStore: Send + Sync {
    // ========================================================================
    // Categories
    // ========================================================================

    /// All categories ordered by position
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Get category by ID
    async fn get_category(&self, id: &CategoryId) -> Result<Option<Category>>;

    /// Insert categories, replacing rows with the same id
    async fn insert_categories(&self, categories: &[Category]) -> Result<()>;

    /// Update categories by id
    async fn update_categories(&self, categories: &[Category]) -> Result<()>;

    /// Delete categories together with their sounds
    async fn delete_categories(&self, ids: &[CategoryId]) -> Result<()>;

    /// Highest category position, `None` when there are no categories
    async fn highest_category_position(&self) -> Result<Option<i32>>;

    /// Nearest category with a position strictly greater than `position`
    async fn next_category(&self, position: i32) -> Result<Option<Category>>;

    /// Nearest category with a position strictly less than `position`
    async fn previous_category(&self, position: i32) -> Result<Option<Category>>;

    /// Collapse or expand a category
    async fn set_collapsed(&self, id: &CategoryId, collapsed: bool) -> Result<()>;

    // ========================================================================
    // Sounds
    // ========================================================================

    /// All sounds, grouped by category position
    async fn list_sounds(&self) -> Result<Vec<Sound>>;

    /// Get sound by ID
    async fn get_sound(&self, id: &SoundId) -> Result<Option<Sound>>;

    /// Sounds belonging to one category
    async fn sounds_by_category(&self, id: &CategoryId) -> Result<Vec<Sound>>;

    /// Checksums of every stored sound
    async fn list_checksums(&self) -> Result<Vec<String>>;

    /// Insert sounds, replacing rows with the same id
    async fn insert_sounds(&self, sounds: &[Sound]) -> Result<()>;

    /// Update sounds by id
    async fn update_sounds(&self, sounds: &[Sound]) -> Result<()>;

    /// Delete sounds
    async fn delete_sounds(&self, ids: &[SoundId]) -> Result<()>;

    /// Add one to a sound's play count
    async fn increase_play_count(&self, id: &SoundId) -> Result<()>;

    /// Store the measured duration of a sound
    async fn update_duration(&self, id: &SoundId, duration: Duration) -> Result<()>;

    /// Zero every play count
    async fn reset_all_play_counts(&self) -> Result<()>;

    // ========================================================================
    // Batches and change notification
    // ========================================================================

    /// Apply operations in order, all or nothing
    async fn apply(&self, operations: &[StoreOperation]) -> Result<()>;

    /// Revision counter bumped after every committed write
    fn subscribe_changes(&self) -> watch::Receiver<u64>;

    /// Convenience wrapper around `insert_categories`
    async fn insert_category(&self, category: &Category) -> Result<()> {
        self.insert_categories(std::slice::from_ref(category)).await
    }

    /// Convenience wrapper around `update_categories`
    async fn update_category(&self, category: &Category) -> Result<()> {
        self.update_categories(std::slice::from_ref(category)).await
    }

    /// Convenience wrapper around `update_sounds`
    async fn update_sound(&self, sound: &Sound) -> Result<()> {
        self.update_sounds(std::slice::from_ref(sound)).await
    }
}
