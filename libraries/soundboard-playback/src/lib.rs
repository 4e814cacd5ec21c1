//! Soundboard - Playback
//!
//! One logical player per sound, driven from a single player thread.
//!
//! This crate provides:
//! - [`SoundPlayer`]: the per-sound engine handle (play, pause, stop, restart,
//!   overlapping play-outs, volume, deferred release)
//! - [`PlayerRegistry`]: lazily creates one engine per sound URI and keeps the
//!   store in sync with what the backend reports (duration, play count, volume)
//! - [`AudioBackend`]/[`BackendPlayer`]: the seam to the platform audio player
//!
//! # Architecture
//!
//! Backend players are not thread safe. Every backend handle lives on one
//! dedicated thread that owns all engines; handles only post messages to it.
//! Backend callbacks are delivered into the same inbox, so engine state is
//! only ever touched from that thread.
//!
//! ```text
//! SoundPlayer ──Command──┐
//! poller task ──Sample───┼──► player thread ──► BackendPlayer
//! BackendPlayer ─Event───┘         │
//!                                  └──► watch channels (state, position, duration)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use soundboard_core::testing::MemoryStore;
//! use soundboard_core::{RepressMode, Sound, CategoryId};
//! use soundboard_playback::testing::FakeBackend;
//! use soundboard_playback::{PlaybackConfig, PlayerRegistry};
//! use std::sync::Arc;
//!
//! # async fn example() -> soundboard_playback::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let registry = PlayerRegistry::new(store, PlaybackConfig::default(), || Ok(FakeBackend::new()))?;
//!
//! let sound = Sound::new(CategoryId::new("c"), "Airhorn", "/sounds/airhorn.wav", "abc", "audio/wav");
//! let player = registry.get_sound_player(&sound);
//! player.initialize();
//! player.press(RepressMode::Overlap);
//! # Ok(())
//! # }
//! ```

pub mod backend;
#[cfg(feature = "desktop")]
pub mod desktop;
pub mod error;
pub mod events;
pub mod testing;
pub mod types;

mod engine;
mod player;
mod registry;
mod thread;

pub use backend::{AudioBackend, BackendEvent, BackendListener, BackendPlayer, BackendState, PlayerKey};
pub use error::{PlaybackError, Result};
pub use events::{PlaybackNotification, SoundPlayerListener};
pub use player::SoundPlayer;
pub use registry::PlayerRegistry;
pub use types::{PlaybackConfig, PlaybackState, MIN_POSITION_POLL_INTERVAL};
