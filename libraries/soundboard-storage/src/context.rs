use crate::{categories, feeds, sounds};
use async_trait::async_trait;
use soundboard_core::error::Result;
use soundboard_core::storage::{SoundboardStore, StoreOperation};
use soundboard_core::types::{Category, CategoryId, Sound, SoundId};
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::sync::watch;

/// Local storage using `SQLite`
pub struct LocalStore {
    pool: SqlitePool,
    changes: watch::Sender<u64>,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            changes: watch::channel(0).0,
        }
    }

    /// Connect, apply migrations and wrap the pool
    pub async fn open(database_url: &str) -> crate::Result<Self> {
        let pool = crate::create_pool(database_url).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Categories ordered by position, republished after every change
    pub async fn watch_categories(&self) -> crate::Result<watch::Receiver<Vec<Category>>> {
        let changes = self.changes.subscribe();
        let initial = categories::get_all(&self.pool).await?;
        Ok(feeds::spawn(self.pool.clone(), changes, initial, |pool| async move {
            categories::get_all(&pool).await
        }))
    }

    /// All sounds, republished after every change
    pub async fn watch_sounds(&self) -> crate::Result<watch::Receiver<Vec<Sound>>> {
        let changes = self.changes.subscribe();
        let initial = sounds::get_all(&self.pool).await?;
        Ok(feeds::spawn(self.pool.clone(), changes, initial, |pool| async move {
            sounds::get_all(&pool).await
        }))
    }

    /// One sound, `None` once it has been deleted
    pub async fn watch_sound(&self, id: SoundId) -> crate::Result<watch::Receiver<Option<Sound>>> {
        let changes = self.changes.subscribe();
        let initial = sounds::get_by_id(&self.pool, &id).await?;
        Ok(feeds::spawn(self.pool.clone(), changes, initial, move |pool| {
            let id = id.clone();
            async move { sounds::get_by_id(&pool, &id).await }
        }))
    }

    async fn execute(&self, operations: &[StoreOperation]) -> crate::Result<()> {
        let mut tx = self.pool.begin().await?;

        for operation in operations {
            match operation {
                StoreOperation::InsertCategories(items) => {
                    for category in items {
                        categories::upsert(&mut tx, category).await?;
                    }
                }
                StoreOperation::UpdateCategories(items) => {
                    for category in items {
                        categories::update(&mut tx, category).await?;
                    }
                }
                StoreOperation::DeleteCategories(ids) => {
                    for id in ids {
                        categories::delete(&mut tx, id).await?;
                    }
                }
                StoreOperation::InsertSounds(items) => {
                    for sound in items {
                        sounds::upsert(&mut tx, sound).await?;
                    }
                }
                StoreOperation::UpdateSounds(items) => {
                    for sound in items {
                        sounds::update(&mut tx, sound).await?;
                    }
                }
                StoreOperation::DeleteSounds(ids) => {
                    for id in ids {
                        sounds::delete(&mut tx, id).await?;
                    }
                }
            }
        }

        tx.commit().await?;
        self.notify();

        Ok(())
    }

    fn notify(&self) {
        self.changes.send_modify(|revision| *revision += 1);
    }
}

#[async_trait]
impl SoundboardStore for LocalStore {
    // Categories
    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(categories::get_all(&self.pool).await?)
    }

    async fn get_category(&self, id: &CategoryId) -> Result<Option<Category>> {
        Ok(categories::get_by_id(&self.pool, id).await?)
    }

    async fn insert_categories(&self, items: &[Category]) -> Result<()> {
        Ok(self
            .execute(&[StoreOperation::InsertCategories(items.to_vec())])
            .await?)
    }

    async fn update_categories(&self, items: &[Category]) -> Result<()> {
        Ok(self
            .execute(&[StoreOperation::UpdateCategories(items.to_vec())])
            .await?)
    }

    async fn delete_categories(&self, ids: &[CategoryId]) -> Result<()> {
        Ok(self
            .execute(&[StoreOperation::DeleteCategories(ids.to_vec())])
            .await?)
    }

    async fn highest_category_position(&self) -> Result<Option<i32>> {
        Ok(categories::get_highest_position(&self.pool).await?)
    }

    async fn next_category(&self, position: i32) -> Result<Option<Category>> {
        Ok(categories::get_next(&self.pool, position).await?)
    }

    async fn previous_category(&self, position: i32) -> Result<Option<Category>> {
        Ok(categories::get_previous(&self.pool, position).await?)
    }

    async fn set_collapsed(&self, id: &CategoryId, collapsed: bool) -> Result<()> {
        if categories::set_collapsed(&self.pool, id, collapsed).await? {
            self.notify();
        }
        Ok(())
    }

    // Sounds
    async fn list_sounds(&self) -> Result<Vec<Sound>> {
        Ok(sounds::get_all(&self.pool).await?)
    }

    async fn get_sound(&self, id: &SoundId) -> Result<Option<Sound>> {
        Ok(sounds::get_by_id(&self.pool, id).await?)
    }

    async fn sounds_by_category(&self, id: &CategoryId) -> Result<Vec<Sound>> {
        Ok(sounds::get_by_category(&self.pool, id).await?)
    }

    async fn list_checksums(&self) -> Result<Vec<String>> {
        Ok(sounds::get_checksums(&self.pool).await?)
    }

    async fn insert_sounds(&self, items: &[Sound]) -> Result<()> {
        Ok(self
            .execute(&[StoreOperation::InsertSounds(items.to_vec())])
            .await?)
    }

    async fn update_sounds(&self, items: &[Sound]) -> Result<()> {
        Ok(self
            .execute(&[StoreOperation::UpdateSounds(items.to_vec())])
            .await?)
    }

    async fn delete_sounds(&self, ids: &[SoundId]) -> Result<()> {
        Ok(self
            .execute(&[StoreOperation::DeleteSounds(ids.to_vec())])
            .await?)
    }

    async fn increase_play_count(&self, id: &SoundId) -> Result<()> {
        if sounds::increase_play_count(&self.pool, id).await? {
            self.notify();
        }
        Ok(())
    }

    async fn update_duration(&self, id: &SoundId, duration: Duration) -> Result<()> {
        if sounds::update_duration(&self.pool, id, duration).await? {
            self.notify();
        }
        Ok(())
    }

    async fn reset_all_play_counts(&self) -> Result<()> {
        if sounds::reset_play_counts(&self.pool).await? > 0 {
            self.notify();
        }
        Ok(())
    }

    // Batches
    async fn apply(&self, operations: &[StoreOperation]) -> Result<()> {
        Ok(self.execute(operations).await?)
    }

    fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}
