//! Store snapshots and the diff between them

use soundboard_core::diff::{index_by_id, EntityDiff};
use soundboard_core::{Category, CategoryId, Result, Sound, SoundId, SoundboardStore, StoreOperation};
use std::collections::BTreeMap;

/// Immutable capture of every category and sound
///
/// Equality is set based: two states are equal when they hold the same
/// entities, regardless of the order they were read in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndoState {
    categories: BTreeMap<CategoryId, Category>,
    sounds: BTreeMap<SoundId, Sound>,
}

impl UndoState {
    pub fn new(
        categories: impl IntoIterator<Item = Category>,
        sounds: impl IntoIterator<Item = Sound>,
    ) -> Self {
        Self {
            categories: index_by_id(categories),
            sounds: index_by_id(sounds),
        }
    }

    /// Read the current contents of `store`
    pub async fn capture(store: &dyn SoundboardStore) -> Result<Self> {
        let categories = store.list_categories().await?;
        let sounds = store.list_sounds().await?;
        Ok(Self::new(categories, sounds))
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn sounds(&self) -> impl Iterator<Item = &Sound> {
        self.sounds.values()
    }
}

/// What has to change to turn one state into another
#[derive(Debug, Clone, PartialEq)]
pub struct StateDiff {
    pub categories: EntityDiff<Category>,
    pub sounds: EntityDiff<Sound>,
}

impl StateDiff {
    /// Changes that turn `source` into `target`
    pub fn between(source: &UndoState, target: &UndoState) -> Self {
        Self {
            categories: EntityDiff::between(&source.categories, &target.categories),
            sounds: EntityDiff::between(&source.sounds, &target.sounds),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.sounds.is_empty()
    }

    /// The diff as a foreign-key safe write batch
    ///
    /// Categories are inserted before any sound that may reference them, and
    /// sounds are deleted before their category. Empty steps are skipped.
    pub fn into_operations(self) -> Vec<StoreOperation> {
        let deleted_sounds = self.sounds.deleted_ids();
        let deleted_categories = self.categories.deleted_ids();

        let steps = [
            StoreOperation::InsertCategories(self.categories.new),
            StoreOperation::UpdateCategories(self.categories.changed),
            StoreOperation::InsertSounds(self.sounds.new),
            StoreOperation::DeleteSounds(deleted_sounds),
            StoreOperation::UpdateSounds(self.sounds.changed),
            StoreOperation::DeleteCategories(deleted_categories),
        ];

        steps.into_iter().filter(|step| !step.is_empty()).collect()
    }
}
