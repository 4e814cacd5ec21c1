/// Category domain type
use crate::types::{CategoryId, SoundSortingKey};
use serde::{Deserialize, Serialize};

/// Background colour given to categories created without an explicit one (ARGB)
pub const DEFAULT_CATEGORY_COLOR: u32 = 0xFF3F_51B5;

/// A named, ordered group of sounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique category identifier
    pub id: CategoryId,

    /// Display name
    pub name: String,

    /// Background colour as packed ARGB
    pub background_color: u32,

    /// Whether the category's sounds are hidden in the grid
    pub collapsed: bool,

    /// Sort position among categories (lower comes first)
    pub position: i32,

    /// Key used to order the category's sounds
    pub sorting_key: SoundSortingKey,

    /// Sort direction for `sorting_key`
    pub sort_ascending: bool,
}

impl Category {
    /// Create a new, expanded category sorted by name
    pub fn new(name: impl Into<String>, background_color: u32, position: i32) -> Self {
        Self {
            id: CategoryId::generate(),
            name: name.into(),
            background_color,
            collapsed: false,
            position,
            sorting_key: SoundSortingKey::Name,
            sort_ascending: true,
        }
    }
}
