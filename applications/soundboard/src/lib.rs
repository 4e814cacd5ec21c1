//! Soundboard
//!
//! Application layer over the soundboard libraries: the [`Soundboard`]
//! service performs user actions and records an undo checkpoint after each
//! one, [`SoundSelection`] holds search and selection state, and
//! [`SoundboardConfig`] loads settings from file and environment.

pub mod config;
pub mod error;
pub mod selection;
pub mod service;

pub use config::SoundboardConfig;
pub use error::{AppError, Result};
pub use selection::SoundSelection;
pub use service::Soundboard;
