mod category;
mod ids;
mod repress;
mod sound;

pub use category::{Category, DEFAULT_CATEGORY_COLOR};
pub use ids::{CategoryId, SoundId};
pub use repress::RepressMode;
pub use sound::{filter_by_search_term, sort_sounds, Sound, SoundSortingKey};
