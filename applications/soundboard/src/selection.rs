//! Search and multi-selection state

use soundboard_core::{filter_by_search_term, Sound, SoundId};
use std::collections::BTreeSet;

/// Search term plus the set of selected sounds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoundSelection {
    search_term: Option<String>,
    selected: BTreeSet<SoundId>,
    anchor: Option<SoundId>,
}

impl SoundSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search_term.as_deref()
    }

    /// Set or clear the search term; blank terms clear it
    pub fn set_search_term(&mut self, term: Option<&str>) {
        self.search_term = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
    }

    /// Sounds matching the search term, in input order
    pub fn visible<'a>(&self, sounds: impl IntoIterator<Item = &'a Sound>) -> Vec<Sound> {
        filter_by_search_term(sounds, self.search_term())
    }

    pub fn select(&mut self, id: SoundId) {
        self.anchor = Some(id.clone());
        self.selected.insert(id);
    }

    pub fn deselect(&mut self, id: &SoundId) {
        self.selected.remove(id);
        if self.anchor.as_ref() == Some(id) {
            self.anchor = None;
        }
    }

    /// Flip the selection of `id`; returns whether it is now selected
    pub fn toggle(&mut self, id: SoundId) -> bool {
        if self.selected.contains(&id) {
            self.deselect(&id);
            false
        } else {
            self.select(id);
            true
        }
    }

    /// Select every visible sound
    pub fn select_all_visible<'a>(&mut self, sounds: impl IntoIterator<Item = &'a Sound>) {
        for sound in self.visible(sounds) {
            self.selected.insert(sound.id);
        }
    }

    /// Select `target` and everything between it and the last selected sound
    ///
    /// `visible` is the on-screen order of sounds. Without an earlier
    /// selection only `target` is selected.
    pub fn select_until(&mut self, visible: &[SoundId], target: SoundId) {
        let anchor = self.anchor.as_ref().and_then(|a| visible.iter().position(|id| id == a));
        let end = visible.iter().position(|id| *id == target);

        if let (Some(anchor), Some(end)) = (anchor, end) {
            let (from, to) = if anchor <= end { (anchor, end) } else { (end, anchor) };
            self.selected.extend(visible[from..=to].iter().cloned());
        }
        self.select(target);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    pub fn is_selected(&self, id: &SoundId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = &SoundId> {
        self.selected.iter()
    }

    /// Selected sounds that are currently visible
    pub fn selected_sounds<'a>(&self, sounds: impl IntoIterator<Item = &'a Sound>) -> Vec<Sound> {
        self.visible(sounds)
            .into_iter()
            .filter(|s| self.selected.contains(&s.id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundboard_core::CategoryId;

    fn sound(name: &str) -> Sound {
        Sound::new(CategoryId::new("c"), name, format!("/s/{name}.wav"), name, "audio/wav")
    }

    #[test]
    fn test_toggle() {
        let mut selection = SoundSelection::new();
        let id = SoundId::new("a");

        assert!(selection.toggle(id.clone()));
        assert!(selection.is_selected(&id));
        assert!(!selection.toggle(id.clone()));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_blank_search_term_clears() {
        let mut selection = SoundSelection::new();
        selection.set_search_term(Some("  horn "));
        assert_eq!(selection.search_term(), Some("horn"));

        selection.set_search_term(Some("   "));
        assert_eq!(selection.search_term(), None);
    }

    #[test]
    fn test_selected_sounds_respect_search() {
        let sounds = vec![sound("Airhorn"), sound("Gong"), sound("Horn solo")];
        let mut selection = SoundSelection::new();
        selection.select_all_visible(&sounds);
        assert_eq!(selection.len(), 3);

        selection.set_search_term(Some("HORN"));
        let names: Vec<_> = selection
            .selected_sounds(&sounds)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Airhorn", "Horn solo"]);
    }

    #[test]
    fn test_select_all_visible_only_selects_matches() {
        let sounds = vec![sound("Airhorn"), sound("Gong")];
        let mut selection = SoundSelection::new();
        selection.set_search_term(Some("gong"));
        selection.select_all_visible(&sounds);

        assert_eq!(selection.len(), 1);
        assert!(selection.is_selected(&sounds[1].id));
    }

    #[test]
    fn test_select_until_selects_range_both_directions() {
        let ids: Vec<SoundId> = ["a", "b", "c", "d", "e"].into_iter().map(SoundId::new).collect();

        let mut selection = SoundSelection::new();
        selection.select(ids[1].clone());
        selection.select_until(&ids, ids[3].clone());
        assert_eq!(selection.selected_ids().cloned().collect::<Vec<_>>(), ids[1..=3].to_vec());

        let mut selection = SoundSelection::new();
        selection.select(ids[4].clone());
        selection.select_until(&ids, ids[2].clone());
        assert_eq!(selection.selected_ids().cloned().collect::<Vec<_>>(), ids[2..=4].to_vec());
    }

    #[test]
    fn test_select_until_without_anchor() {
        let ids: Vec<SoundId> = ["a", "b", "c"].into_iter().map(SoundId::new).collect();
        let mut selection = SoundSelection::new();
        selection.select_until(&ids, ids[2].clone());

        assert_eq!(selection.len(), 1);
        assert!(selection.is_selected(&ids[2]));
    }
}
