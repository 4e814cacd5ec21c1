//! Undo history and its cursor

use crate::state::{StateDiff, UndoState};
use soundboard_core::{Result, SoundboardStore};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::debug;

/// Default number of snapshots kept in the history
pub const MAX_UNDO_STATES: usize = 50;

/// Whether undo/redo currently have anything to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UndoAvailability {
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Default)]
struct History {
    states: VecDeque<Arc<UndoState>>,
    /// `None` until the first state is pushed
    cursor: Option<usize>,
}

impl History {
    fn current(&self) -> Option<&Arc<UndoState>> {
        self.cursor.and_then(|index| self.states.get(index))
    }

    fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|index| index > 0)
    }

    fn can_redo(&self) -> bool {
        self.cursor
            .is_some_and(|index| index + 1 < self.states.len())
    }

    fn push(&mut self, state: Arc<UndoState>, capacity: usize) {
        // Anything after the cursor is redo history made obsolete by this push
        self.states.truncate(self.cursor.map_or(0, |index| index + 1));
        self.states.push_back(state);
        while self.states.len() > capacity {
            self.states.pop_front();
        }
        self.cursor = Some(self.states.len() - 1);
    }

    fn availability(&self) -> UndoAvailability {
        UndoAvailability {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }
}

/// Snapshot based undo/redo over a [`SoundboardStore`]
///
/// `push_state`, `undo` and `redo` are serialized by one lock, so the cursor
/// and the snapshot list always change together.
pub struct UndoManager {
    store: Arc<dyn SoundboardStore>,
    history: Mutex<History>,
    capacity: usize,
    availability: watch::Sender<UndoAvailability>,
}

impl UndoManager {
    /// Create an empty history holding up to [`MAX_UNDO_STATES`] snapshots
    pub fn new(store: Arc<dyn SoundboardStore>) -> Self {
        Self::with_capacity(store, MAX_UNDO_STATES)
    }

    /// Create an empty history holding up to `capacity` snapshots (at least one)
    pub fn with_capacity(store: Arc<dyn SoundboardStore>, capacity: usize) -> Self {
        Self {
            store,
            history: Mutex::new(History::default()),
            capacity: capacity.max(1),
            availability: watch::channel(UndoAvailability::default()).0,
        }
    }

    /// Snapshot the store as the new current state
    ///
    /// Returns `false` when the store equals the current snapshot, in which
    /// case the history is left untouched.
    pub async fn push_state(&self) -> Result<bool> {
        let mut history = self.history.lock().await;
        let state = UndoState::capture(self.store.as_ref()).await?;

        if history.current().is_some_and(|current| **current == state) {
            debug!("Store unchanged, not pushing undo state");
            return Ok(false);
        }

        history.push(Arc::new(state), self.capacity);
        debug!(
            states = history.states.len(),
            cursor = ?history.cursor,
            "Pushed undo state"
        );
        self.publish(&history);
        Ok(true)
    }

    /// Restore the previous snapshot, returns `false` when there is none
    pub async fn undo(&self) -> Result<bool> {
        let mut history = self.history.lock().await;
        let Some(index) = history.cursor.filter(|_| history.can_undo()) else {
            return Ok(false);
        };

        let target = Arc::clone(&history.states[index - 1]);
        self.apply_state(&target).await?;
        history.cursor = Some(index - 1);

        debug!(cursor = index - 1, "Undo");
        self.publish(&history);
        Ok(true)
    }

    /// Restore the next snapshot, returns `false` when there is none
    pub async fn redo(&self) -> Result<bool> {
        let mut history = self.history.lock().await;
        let Some(index) = history.cursor.filter(|_| history.can_redo()) else {
            return Ok(false);
        };

        let target = Arc::clone(&history.states[index + 1]);
        self.apply_state(&target).await?;
        history.cursor = Some(index + 1);

        debug!(cursor = index + 1, "Redo");
        self.publish(&history);
        Ok(true)
    }

    pub async fn can_undo(&self) -> bool {
        self.history.lock().await.can_undo()
    }

    pub async fn can_redo(&self) -> bool {
        self.history.lock().await.can_redo()
    }

    /// Follow undo/redo availability
    pub fn subscribe(&self) -> watch::Receiver<UndoAvailability> {
        self.availability.subscribe()
    }

    /// Cursor into the history, `None` before the first push
    pub async fn cursor(&self) -> Option<usize> {
        self.history.lock().await.cursor
    }

    /// Snapshots currently held, oldest first
    pub async fn states(&self) -> Vec<Arc<UndoState>> {
        self.history.lock().await.states.iter().cloned().collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Write the difference between the live store and `target` as one batch
    async fn apply_state(&self, target: &UndoState) -> Result<()> {
        let live = UndoState::capture(self.store.as_ref()).await?;
        let diff = StateDiff::between(&live, target);

        if diff.is_empty() {
            return Ok(());
        }

        debug!(
            new_categories = diff.categories.new.len(),
            changed_categories = diff.categories.changed.len(),
            deleted_categories = diff.categories.deleted.len(),
            new_sounds = diff.sounds.new.len(),
            changed_sounds = diff.sounds.changed.len(),
            deleted_sounds = diff.sounds.deleted.len(),
            "Applying undo state"
        );

        self.store.apply(&diff.into_operations()).await
    }

    fn publish(&self, history: &History) {
        self.availability.send_replace(history.availability());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(n: usize) -> Arc<UndoState> {
        let categories = (0..n).map(|i| soundboard_core::Category::new(i.to_string(), 0, i as i32));
        Arc::new(UndoState::new(categories, vec![]))
    }

    #[test]
    fn push_truncates_redo_history() {
        let mut history = History::default();
        for n in 0..4 {
            history.push(state(n), 10);
        }
        history.cursor = Some(1);

        history.push(state(9), 10);

        assert_eq!(history.states.len(), 3);
        assert_eq!(history.cursor, Some(2));
        assert!(!history.can_redo());
    }

    #[test]
    fn push_drops_oldest_beyond_capacity() {
        let mut history = History::default();
        let first = state(0);
        history.push(Arc::clone(&first), 3);
        for n in 1..5 {
            history.push(state(n), 3);
        }

        assert_eq!(history.states.len(), 3);
        assert_eq!(history.cursor, Some(2));
        assert!(!history.states.iter().any(|s| Arc::ptr_eq(s, &first)));
    }

    #[test]
    fn empty_history_cannot_move() {
        let history = History::default();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.current().is_none());
    }
}
