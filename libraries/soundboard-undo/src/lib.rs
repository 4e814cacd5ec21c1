//! Soundboard - Undo/Redo
//!
//! Linear undo history over the category and sound tables.
//!
//! Every successful mutation is followed by [`UndoManager::push_state`], which
//! captures the whole store as an immutable [`UndoState`]. Undo and redo diff
//! the live store against a neighbouring snapshot and write the difference
//! back as one ordered, atomic batch:
//!
//! 1. insert new categories
//! 2. update changed categories
//! 3. insert new sounds
//! 4. delete removed sounds
//! 5. update changed sounds
//! 6. delete removed categories
//!
//! # Example
//!
//! ```rust
//! use soundboard_core::testing::MemoryStore;
//! use soundboard_core::{Category, SoundboardStore};
//! use soundboard_undo::UndoManager;
//! use std::sync::Arc;
//!
//! # async fn example() -> soundboard_core::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let undo = UndoManager::new(store.clone());
//! undo.push_state().await?;
//!
//! store.insert_category(&Category::new("Effects", 0, 0)).await?;
//! undo.push_state().await?;
//!
//! undo.undo().await?;
//! assert!(store.list_categories().await?.is_empty());
//! # Ok(())
//! # }
//! ```

mod manager;
mod state;

pub use manager::{UndoAvailability, UndoManager, MAX_UNDO_STATES};
pub use state::{StateDiff, UndoState};
