//! In-memory `SoundboardStore`
//!
//! Honours the same contract as the SQLite store (replace-on-insert, cascade
//! delete, foreign key check on sound writes, atomic batches) and records
//! every applied batch so callers can inspect write ordering.

use crate::error::{Result, SoundboardError};
use crate::storage::{SoundboardStore, StoreOperation};
use crate::types::{Category, CategoryId, Sound, SoundId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    sounds: BTreeMap<SoundId, Sound>,
}

impl Tables {
    fn apply(&mut self, operation: &StoreOperation) -> Result<()> {
        match operation {
            StoreOperation::InsertCategories(categories) => {
                for category in categories {
                    self.categories.insert(category.id.clone(), category.clone());
                }
            }
            StoreOperation::UpdateCategories(categories) => {
                for category in categories {
                    if let Some(existing) = self.categories.get_mut(&category.id) {
                        *existing = category.clone();
                    }
                }
            }
            StoreOperation::DeleteCategories(ids) => {
                for id in ids {
                    self.categories.remove(id);
                    self.sounds.retain(|_, sound| &sound.category_id != id);
                }
            }
            StoreOperation::InsertSounds(sounds) => {
                for sound in sounds {
                    self.check_category(sound)?;
                    self.sounds.insert(sound.id.clone(), sound.clone());
                }
            }
            StoreOperation::UpdateSounds(sounds) => {
                for sound in sounds {
                    if self.sounds.contains_key(&sound.id) {
                        self.check_category(sound)?;
                        self.sounds.insert(sound.id.clone(), sound.clone());
                    }
                }
            }
            StoreOperation::DeleteSounds(ids) => {
                for id in ids {
                    self.sounds.remove(id);
                }
            }
        }
        Ok(())
    }

    fn check_category(&self, sound: &Sound) -> Result<()> {
        if self.categories.contains_key(&sound.category_id) {
            Ok(())
        } else {
            Err(SoundboardError::storage(format!(
                "FOREIGN KEY constraint failed: sound {} references missing category {}",
                sound.id, sound.category_id
            )))
        }
    }

    fn sorted_categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self.categories.values().cloned().collect();
        categories.sort_by_key(|c| c.position);
        categories
    }
}

/// Mutex-backed store for tests and headless use
pub struct MemoryStore {
    tables: Mutex<Tables>,
    batches: Mutex<Vec<Vec<StoreOperation>>>,
    fail_next_apply: AtomicBool,
    changes: watch::Sender<u64>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            batches: Mutex::new(Vec::new()),
            fail_next_apply: AtomicBool::new(false),
            changes: watch::channel(0).0,
        }
    }

    /// Every batch passed to `apply`, in call order
    pub fn applied_batches(&self) -> Vec<Vec<StoreOperation>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make the next `apply` fail after its first operation, leaving the store untouched
    pub fn fail_next_apply(&self) {
        self.fail_next_apply.store(true, Ordering::SeqCst);
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, operation: StoreOperation) -> Result<()> {
        self.tables().apply(&operation)?;
        self.changes.send_modify(|revision| *revision += 1);
        Ok(())
    }

    fn modify_sound(&self, id: &SoundId, f: impl FnOnce(&mut Sound)) {
        let modified = {
            let mut tables = self.tables();
            tables.sounds.get_mut(id).map(f).is_some()
        };
        if modified {
            self.changes.send_modify(|revision| *revision += 1);
        }
    }
}

#[async_trait]
impl SoundboardStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.tables().sorted_categories())
    }

    async fn get_category(&self, id: &CategoryId) -> Result<Option<Category>> {
        Ok(self.tables().categories.get(id).cloned())
    }

    async fn insert_categories(&self, categories: &[Category]) -> Result<()> {
        self.write(StoreOperation::InsertCategories(categories.to_vec()))
    }

    async fn update_categories(&self, categories: &[Category]) -> Result<()> {
        self.write(StoreOperation::UpdateCategories(categories.to_vec()))
    }

    async fn delete_categories(&self, ids: &[CategoryId]) -> Result<()> {
        self.write(StoreOperation::DeleteCategories(ids.to_vec()))
    }

    async fn highest_category_position(&self) -> Result<Option<i32>> {
        Ok(self.tables().categories.values().map(|c| c.position).max())
    }

    async fn next_category(&self, position: i32) -> Result<Option<Category>> {
        Ok(self
            .tables()
            .sorted_categories()
            .into_iter()
            .find(|c| c.position > position))
    }

    async fn previous_category(&self, position: i32) -> Result<Option<Category>> {
        Ok(self
            .tables()
            .sorted_categories()
            .into_iter()
            .rev()
            .find(|c| c.position < position))
    }

    async fn set_collapsed(&self, id: &CategoryId, collapsed: bool) -> Result<()> {
        let modified = {
            let mut tables = self.tables();
            tables
                .categories
                .get_mut(id)
                .map(|c| c.collapsed = collapsed)
                .is_some()
        };
        if modified {
            self.changes.send_modify(|revision| *revision += 1);
        }
        Ok(())
    }

    async fn list_sounds(&self) -> Result<Vec<Sound>> {
        let tables = self.tables();
        let mut sounds = Vec::with_capacity(tables.sounds.len());
        for category in tables.sorted_categories() {
            sounds.extend(
                tables
                    .sounds
                    .values()
                    .filter(|s| s.category_id == category.id)
                    .cloned(),
            );
        }
        Ok(sounds)
    }

    async fn get_sound(&self, id: &SoundId) -> Result<Option<Sound>> {
        Ok(self.tables().sounds.get(id).cloned())
    }

    async fn sounds_by_category(&self, id: &CategoryId) -> Result<Vec<Sound>> {
        Ok(self
            .tables()
            .sounds
            .values()
            .filter(|s| &s.category_id == id)
            .cloned()
            .collect())
    }

    async fn list_checksums(&self) -> Result<Vec<String>> {
        Ok(self
            .tables()
            .sounds
            .values()
            .map(|s| s.checksum.clone())
            .collect())
    }

    async fn insert_sounds(&self, sounds: &[Sound]) -> Result<()> {
        self.write(StoreOperation::InsertSounds(sounds.to_vec()))
    }

    async fn update_sounds(&self, sounds: &[Sound]) -> Result<()> {
        self.write(StoreOperation::UpdateSounds(sounds.to_vec()))
    }

    async fn delete_sounds(&self, ids: &[SoundId]) -> Result<()> {
        self.write(StoreOperation::DeleteSounds(ids.to_vec()))
    }

    async fn increase_play_count(&self, id: &SoundId) -> Result<()> {
        self.modify_sound(id, |sound| sound.play_count += 1);
        Ok(())
    }

    async fn update_duration(&self, id: &SoundId, duration: Duration) -> Result<()> {
        self.modify_sound(id, |sound| sound.duration = Some(duration));
        Ok(())
    }

    async fn reset_all_play_counts(&self) -> Result<()> {
        {
            let mut tables = self.tables();
            for sound in tables.sounds.values_mut() {
                sound.play_count = 0;
            }
        }
        self.changes.send_modify(|revision| *revision += 1);
        Ok(())
    }

    async fn apply(&self, operations: &[StoreOperation]) -> Result<()> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(operations.to_vec());

        let mut tables = self.tables();
        let mut staged = tables.clone();
        for (index, operation) in operations.iter().enumerate() {
            if index == 1 && self.fail_next_apply.swap(false, Ordering::SeqCst) {
                return Err(SoundboardError::storage("simulated failure"));
            }
            staged.apply(operation)?;
        }
        *tables = staged;
        drop(tables);

        self.changes.send_modify(|revision| *revision += 1);
        Ok(())
    }

    fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deleting_category_cascades_to_sounds() {
        let store = MemoryStore::new();
        let category = Category::new("A", 0, 0);
        let sound = Sound::new(category.id.clone(), "s", "/s.wav", "x", "audio/wav");
        store.insert_category(&category).await.unwrap();
        store.insert_sounds(&[sound]).await.unwrap();

        store.delete_categories(&[category.id.clone()]).await.unwrap();

        assert!(store.list_sounds().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sound_without_category_is_rejected() {
        let store = MemoryStore::new();
        let sound = Sound::new(CategoryId::new("missing"), "s", "/s.wav", "x", "audio/wav");
        assert!(store.insert_sounds(&[sound]).await.is_err());
    }

    #[tokio::test]
    async fn failed_apply_leaves_tables_untouched() {
        let store = MemoryStore::new();
        let a = Category::new("A", 0, 0);
        let b = Category::new("B", 0, 1);
        store.fail_next_apply();

        let result = store
            .apply(&[
                StoreOperation::InsertCategories(vec![a]),
                StoreOperation::InsertCategories(vec![b]),
            ])
            .await;

        assert!(result.is_err());
        assert!(store.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_bump_revision() {
        let store = MemoryStore::new();
        let changes = store.subscribe_changes();
        store.insert_category(&Category::new("A", 0, 0)).await.unwrap();
        assert_eq!(*changes.borrow(), 1);
    }
}
