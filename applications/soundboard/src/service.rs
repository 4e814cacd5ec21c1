//! Soundboard service
//!
//! Every mutating action writes to the store first and records an undo
//! checkpoint only once the write succeeded. Collapsing a category is view
//! state and is never checkpointed.

use crate::config::SoundboardConfig;
use crate::error::{AppError, Result};
use soundboard_core::{
    Category, CategoryId, RepressMode, Sound, SoundId, SoundboardStore, StoreOperation,
    DEFAULT_CATEGORY_COLOR,
};
use soundboard_importer::{clean_orphans, AutoImportReport, ImportBatch, ImportError, SoundImporter};
use soundboard_playback::{PlaybackError, PlayerRegistry, SoundPlayer};
use soundboard_storage::LocalStore;
use soundboard_undo::UndoManager;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name of the category created in an empty store
pub const DEFAULT_CATEGORY_NAME: &str = "Default";

pub struct Soundboard {
    store: Arc<dyn SoundboardStore>,
    undo: UndoManager,
    importer: SoundImporter,
    players: Option<PlayerRegistry>,
    repress_mode: RepressMode,
}

impl Soundboard {
    /// Build the service and record the current store as the first undo state
    pub async fn new(
        store: Arc<dyn SoundboardStore>,
        importer: SoundImporter,
        undo_capacity: usize,
    ) -> Result<Self> {
        let undo = UndoManager::with_capacity(Arc::clone(&store), undo_capacity);
        undo.push_state().await?;

        Ok(Self {
            store,
            undo,
            importer,
            players: None,
            repress_mode: RepressMode::default(),
        })
    }

    /// Open the configured database, creating the default category if needed
    ///
    /// With `import.auto_import` set, new files in the configured folder are
    /// imported and unreferenced files cleaned before returning. A failed
    /// auto import is logged and does not prevent opening.
    pub async fn open(config: &SoundboardConfig) -> Result<Self> {
        let store: Arc<dyn SoundboardStore> =
            Arc::new(LocalStore::open(&config.storage.database_url).await?);
        ensure_default_category(store.as_ref()).await?;

        let importer = SoundImporter::new(&config.storage.sound_dir, &config.storage.cache_dir);
        let soundboard = Self::new(store, importer, config.undo.max_states)
            .await?
            .with_repress_mode(config.playback.repress_mode);

        if config.import.auto_import {
            if let Some(dir) = &config.import.auto_import_directory {
                let category = config
                    .import
                    .auto_import_category_id
                    .clone()
                    .map(CategoryId::new);
                if let Err(e) = soundboard.auto_import(dir, category.as_ref()).await {
                    warn!(dir = %dir.display(), error = %e, "Auto import on open failed");
                }
                soundboard.clean().await?;
            }
        }

        info!(database_url = %config.storage.database_url, "Soundboard opened");
        Ok(soundboard)
    }

    /// Attach a player registry so sounds can be played
    #[must_use]
    pub fn with_players(mut self, players: PlayerRegistry) -> Self {
        self.players = Some(players);
        self
    }

    #[must_use]
    pub fn with_repress_mode(mut self, mode: RepressMode) -> Self {
        self.repress_mode = mode;
        self
    }

    pub fn store(&self) -> &Arc<dyn SoundboardStore> {
        &self.store
    }

    pub fn importer(&self) -> &SoundImporter {
        &self.importer
    }

    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo
    }

    pub fn players(&self) -> Option<&PlayerRegistry> {
        self.players.as_ref()
    }

    pub fn repress_mode(&self) -> RepressMode {
        self.repress_mode
    }

    async fn checkpoint(&self) -> Result<()> {
        self.undo.push_state().await?;
        Ok(())
    }

    // ========================================================================
    // Categories
    // ========================================================================

    pub async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    async fn require_category(&self, id: &CategoryId) -> Result<Category> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("category {id}")))
    }

    /// Create a category after the last one
    pub async fn create_category(&self, name: &str, background_color: u32) -> Result<Category> {
        let position = self
            .store
            .highest_category_position()
            .await?
            .map_or(0, |highest| highest + 1);
        let category = Category::new(name, background_color, position);

        self.store.insert_category(&category).await?;
        self.checkpoint().await?;

        info!(id = %category.id, name, position, "Created category");
        Ok(category)
    }

    pub async fn update_category(&self, category: &Category) -> Result<()> {
        self.store.update_category(category).await?;
        self.checkpoint().await
    }

    /// Delete a category and its sounds
    ///
    /// Players of the deleted sounds are released once they finish. Audio
    /// files stay on disk until [`Soundboard::clean`] so undo can restore
    /// the sounds.
    pub async fn delete_category(&self, id: &CategoryId) -> Result<()> {
        let category = self.require_category(id).await?;
        let sounds = self.store.sounds_by_category(id).await?;

        self.release_players(&sounds);
        self.store
            .apply(&[
                StoreOperation::DeleteSounds(sounds.iter().map(|s| s.id.clone()).collect()),
                StoreOperation::DeleteCategories(vec![category.id.clone()]),
            ])
            .await?;
        self.checkpoint().await?;

        info!(id = %category.id, sounds = sounds.len(), "Deleted category");
        Ok(())
    }

    /// Swap positions with the previous category
    ///
    /// Returns `false` when the category is first or unknown.
    pub async fn move_category_up(&self, id: &CategoryId) -> Result<bool> {
        let Some(category) = self.store.get_category(id).await? else {
            return Ok(false);
        };
        match self.store.previous_category(category.position).await? {
            Some(previous) => self.swap_positions(category, previous).await,
            None => Ok(false),
        }
    }

    /// Swap positions with the next category
    ///
    /// Returns `false` when the category is last or unknown.
    pub async fn move_category_down(&self, id: &CategoryId) -> Result<bool> {
        let Some(category) = self.store.get_category(id).await? else {
            return Ok(false);
        };
        match self.store.next_category(category.position).await? {
            Some(next) => self.swap_positions(category, next).await,
            None => Ok(false),
        }
    }

    async fn swap_positions(&self, mut a: Category, mut b: Category) -> Result<bool> {
        std::mem::swap(&mut a.position, &mut b.position);
        self.store.update_categories(&[a, b]).await?;
        self.checkpoint().await?;
        Ok(true)
    }

    pub async fn set_category_collapsed(&self, id: &CategoryId, collapsed: bool) -> Result<()> {
        self.store.set_collapsed(id, collapsed).await?;
        Ok(())
    }

    // ========================================================================
    // Sounds
    // ========================================================================

    pub async fn sounds(&self) -> Result<Vec<Sound>> {
        Ok(self.store.list_sounds().await?)
    }

    pub async fn sound(&self, id: &SoundId) -> Result<Sound> {
        self.store
            .get_sound(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("sound {id}")))
    }

    pub async fn add_sounds(&self, sounds: &[Sound]) -> Result<()> {
        if sounds.is_empty() {
            return Ok(());
        }
        self.store.insert_sounds(sounds).await?;
        self.checkpoint().await?;

        info!(count = sounds.len(), "Added sounds");
        Ok(())
    }

    pub async fn update_sounds(&self, sounds: &[Sound]) -> Result<()> {
        if sounds.is_empty() {
            return Ok(());
        }
        self.store.update_sounds(sounds).await?;
        self.checkpoint().await
    }

    pub async fn delete_sounds(&self, ids: &[SoundId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut sounds = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(sound) = self.store.get_sound(id).await? {
                sounds.push(sound);
            }
        }
        self.release_players(&sounds);

        self.store.delete_sounds(ids).await?;
        self.checkpoint().await?;

        info!(count = ids.len(), "Deleted sounds");
        Ok(())
    }

    pub async fn reset_play_counts(&self) -> Result<()> {
        self.store.reset_all_play_counts().await?;
        self.checkpoint().await
    }

    fn release_players(&self, sounds: &[Sound]) {
        if let Some(players) = &self.players {
            for sound in sounds {
                players.release_when_finished(&sound.uri);
            }
        }
    }

    // ========================================================================
    // Import
    // ========================================================================

    /// Copy files into the cache for review, flagging duplicates
    pub async fn prepare_import(&self, paths: Vec<PathBuf>) -> Result<ImportBatch> {
        let existing: HashSet<String> = self.store.list_checksums().await?.into_iter().collect();
        Ok(self.importer.prepare(paths, existing).await)
    }

    /// Store the sounds of a reviewed batch in `category_id`
    pub async fn commit_import(
        &self,
        batch: ImportBatch,
        category_id: &CategoryId,
        include_duplicates: bool,
        name_override: Option<String>,
    ) -> Result<Vec<Sound>> {
        self.require_category(category_id).await?;

        let importer = self.importer.clone();
        let category = category_id.clone();
        let sounds = tokio::task::spawn_blocking(move || {
            batch.into_sounds(&importer, &category, include_duplicates, name_override.as_deref())
        })
        .await
        .map_err(|e| ImportError::Task(e.to_string()))??;

        self.add_sounds(&sounds).await?;
        Ok(sounds)
    }

    /// Import new audio files from `dir`
    ///
    /// Uses `category_id` when it names a stored category, otherwise the
    /// first category.
    pub async fn auto_import(&self, dir: &Path, category_id: Option<&CategoryId>) -> Result<AutoImportReport> {
        let category = match category_id {
            Some(id) => self.store.get_category(id).await?,
            None => None,
        };
        let category = match category {
            Some(category) => category,
            None => self
                .store
                .list_categories()
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| AppError::NotFound("any category to import into".to_string()))?,
        };

        let report = self
            .importer
            .auto_import(self.store.as_ref(), dir, &category.id)
            .await?;
        for failure in &report.errors {
            warn!(path = %failure.path.display(), error = %failure.message, "Auto import failed for file");
        }
        if !report.imported.is_empty() {
            self.checkpoint().await?;
        }

        info!(
            imported = report.imported.len(),
            skipped = report.skipped,
            category = %category.id,
            "Auto import finished"
        );
        Ok(report)
    }

    /// Delete unreferenced sound files and empty the cache
    pub async fn clean(&self) -> Result<usize> {
        let removed = clean_orphans(
            self.store.as_ref(),
            self.importer.sound_dir(),
            self.importer.cache_dir(),
        )
        .await?;
        info!(removed, "Cleaned sound files");
        Ok(removed)
    }

    // ========================================================================
    // History
    // ========================================================================

    pub async fn undo(&self) -> Result<bool> {
        Ok(self.undo.undo().await?)
    }

    pub async fn redo(&self) -> Result<bool> {
        Ok(self.undo.redo().await?)
    }

    pub async fn can_undo(&self) -> bool {
        self.undo.can_undo().await
    }

    pub async fn can_redo(&self) -> bool {
        self.undo.can_redo().await
    }

    // ========================================================================
    // Playback
    // ========================================================================

    fn registry(&self) -> Result<&PlayerRegistry> {
        self.players
            .as_ref()
            .ok_or_else(|| PlaybackError::BackendUnavailable("no player registry attached".to_string()).into())
    }

    /// Press a sound's button with the configured repress mode
    ///
    /// Initializes the player on first use.
    pub fn press_sound(&self, sound: &Sound) -> Result<Arc<SoundPlayer>> {
        let player = self.registry()?.get_sound_player(sound);
        debug!(sound = %sound.id, mode = %self.repress_mode.as_str(), "Press");
        player.initialize();
        player.press(self.repress_mode);
        Ok(player)
    }

    pub fn stop_all(&self) {
        if let Some(players) = &self.players {
            players.stop_all_players();
        }
    }
}

/// Insert the default category when the store has none
///
/// Returns whether a category was created.
pub async fn ensure_default_category(store: &dyn SoundboardStore) -> Result<bool> {
    if !store.list_categories().await?.is_empty() {
        return Ok(false);
    }

    let category = Category::new(DEFAULT_CATEGORY_NAME, DEFAULT_CATEGORY_COLOR, 0);
    store.insert_category(&category).await?;
    info!(id = %category.id, "Created default category");
    Ok(true)
}
