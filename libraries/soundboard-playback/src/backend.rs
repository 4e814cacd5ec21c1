//! Platform audio player seam
//!
//! A [`BackendPlayer`] is a single-source media player in the style of a
//! platform media player: it is prepared, told to play or pause, seeks, and
//! reports what happened through a [`BackendListener`]. Backend players are
//! created and driven from the player thread only, so neither trait requires
//! `Send`.

use crate::error::Result;
use crossbeam_channel::Sender;
use std::time::Duration;

use crate::thread::Message;

/// Identifies one backend player instance for event routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerKey(pub(crate) u64);

impl PlayerKey {
    /// Raw key value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

/// Media state reported by a backend player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BackendState {
    /// Not prepared, or stopped
    #[default]
    Idle,

    /// Preparing, or seeking before data is available
    Buffering,

    /// Ready to play immediately
    Ready,

    /// Reached the end of the source
    Ended,
}

/// Something a backend player reports
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Audible playback started or stopped
    IsPlayingChanged(bool),

    /// Media state transition
    StateChanged(BackendState),

    /// An error was raised (`Some`) or cleared (`None`)
    Error(Option<String>),

    /// The duration of the source became known
    DurationKnown(Duration),
}

/// Callback sink handed to a backend player on creation
///
/// Events are tagged with the player's key and queued for the player thread.
/// Emitting never blocks and never fails; events for a player that has since
/// been released are dropped by the router.
#[derive(Debug, Clone)]
pub struct BackendListener {
    key: PlayerKey,
    messages: Sender<Message>,
}

impl BackendListener {
    pub(crate) fn new(key: PlayerKey, messages: Sender<Message>) -> Self {
        Self { key, messages }
    }

    /// Key of the player this listener belongs to
    pub fn key(&self) -> PlayerKey {
        self.key
    }

    /// Report an event
    pub fn emit(&self, event: BackendEvent) {
        let _ = self.messages.send(Message::Backend {
            key: self.key,
            event,
        });
    }
}

/// Factory for backend players
pub trait AudioBackend {
    /// Create a player for `uri`
    ///
    /// The player starts idle. It must not report events before one of its
    /// methods is called.
    ///
    /// # Errors
    /// Returns an error if the source cannot be opened at all
    fn create_player(
        &mut self,
        uri: &str,
        volume: f32,
        listener: BackendListener,
    ) -> Result<Box<dyn BackendPlayer>>;
}

/// A single-source media player
pub trait BackendPlayer {
    /// Start loading the source; reports `Ready` (or an error) when done
    fn prepare(&mut self);

    /// Set play-when-ready; starts audible playback once ready
    fn play(&mut self);

    /// Clear play-when-ready
    fn pause(&mut self);

    /// Stop and return to idle, keeping the position
    fn stop(&mut self);

    /// Seek within the source
    fn seek_to(&mut self, position: Duration);

    /// Set output volume (0.0 to 1.0)
    fn set_volume(&mut self, volume: f32);

    /// Free all resources; no events follow
    fn release(&mut self);

    /// Whether audio is currently audible
    fn is_playing(&self) -> bool;

    /// Whether playback starts as soon as the source is ready
    fn play_when_ready(&self) -> bool;

    /// Current media state
    fn state(&self) -> BackendState;

    /// Current position
    fn position(&self) -> Duration;
}
