//! Soundboard Core
//!
//! Platform-agnostic domain types, traits, and error handling shared by every
//! soundboard crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Category`, `Sound`, their ids, `SoundSortingKey`, `RepressMode`
//! - **Storage Contract**: the `SoundboardStore` trait and batched `StoreOperation`s
//! - **Diffing**: id-keyed `EntityDiff` used by undo/redo
//! - **Error Handling**: unified `SoundboardError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use soundboard_core::types::{Category, Sound};
//!
//! let category = Category::new("Effects", 0xFF3F51B5, 0);
//! let sound = Sound::new(category.id.clone(), "Airhorn", "/sounds/airhorn.wav", "abc123", "audio/wav");
//!
//! assert_eq!(sound.category_id, category.id);
//! assert_eq!(sound.play_count, 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod diff;
pub mod error;
pub mod storage;
pub mod testing;
pub mod types;

pub use diff::{EntityDiff, Identified};
pub use error::{Result, SoundboardError};
pub use storage::{SoundboardStore, StoreOperation};
pub use types::{
    filter_by_search_term, sort_sounds, Category, CategoryId, RepressMode, Sound, SoundId,
    SoundSortingKey, DEFAULT_CATEGORY_COLOR,
};
