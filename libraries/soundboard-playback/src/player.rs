//! Sound player handle

use crossbeam_channel::Sender;
use soundboard_core::RepressMode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};

use crate::engine::PlayerStatus;
use crate::events::SoundPlayerListener;
use crate::thread::{Barrier, Command, Message, PlayerId};
use crate::types::PlaybackState;

/// Handle to the playback engine of one sound
///
/// All methods return immediately; the work happens on the player thread in
/// the order the calls were made. Use [`SoundPlayer::flush`] to wait until
/// everything posted so far has been handled.
///
/// Commands other than [`initialize`](Self::initialize) and
/// [`add_listener`](Self::add_listener) do nothing while the player is in
/// [`PlaybackState::Created`].
#[derive(Debug)]
pub struct SoundPlayer {
    id: PlayerId,
    uri: String,
    messages: Sender<Message>,
    status: Arc<PlayerStatus>,
}

impl SoundPlayer {
    pub(crate) fn new(
        id: PlayerId,
        uri: impl Into<String>,
        messages: Sender<Message>,
        status: Arc<PlayerStatus>,
    ) -> Self {
        Self {
            id,
            uri: uri.into(),
            messages,
            status,
        }
    }

    /// URI of the sound this player plays
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Allocate the backend player if needed and start position sampling
    pub fn initialize(&self) {
        self.send(Command::Initialize);
    }

    /// Start playback, resuming if paused and rewinding otherwise
    pub fn play(&self) {
        self.send(Command::Play);
    }

    /// Start an additional, overlapping play-out if already playing
    ///
    /// The earlier play-out continues until it ends or is stopped, then its
    /// backend player is released.
    pub fn play_parallel(&self) {
        self.send(Command::PlayParallel);
    }

    /// Pause the current play-out and stop any overlapping ones
    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    /// Stop every play-out of this sound
    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    /// Rewind to the start and make sure it plays
    pub fn restart(&self) {
        self.send(Command::Restart);
    }

    /// Handle a press of the sound's button
    ///
    /// Plays when not playing; otherwise applies `mode`.
    pub fn press(&self, mode: RepressMode) {
        self.send(Command::Press(mode));
    }

    /// Set the volume of every play-out (0.0 to 1.0)
    pub fn set_volume(&self, volume: f32) {
        self.send(Command::SetVolume(volume.clamp(0.0, 1.0)));
    }

    /// Release backend resources now, or once the current play-out stops
    pub fn release_when_finished(&self) {
        self.send(Command::ReleaseWhenFinished);
    }

    /// Register a listener; registering the same listener twice has no effect
    pub fn add_listener(&self, listener: Arc<dyn SoundPlayerListener>) {
        self.send(Command::AddListener(listener));
    }

    /// Current state
    pub fn playback_state(&self) -> PlaybackState {
        *self.status.state.borrow()
    }

    /// Subscribe to state changes
    pub fn subscribe_state(&self) -> watch::Receiver<PlaybackState> {
        self.status.state.subscribe()
    }

    /// Last sampled position
    pub fn position(&self) -> Duration {
        *self.status.position.borrow()
    }

    /// Subscribe to position samples
    pub fn subscribe_position(&self) -> watch::Receiver<Duration> {
        self.status.position.subscribe()
    }

    /// Known duration, zero if unknown
    pub fn duration(&self) -> Duration {
        *self.status.duration.borrow()
    }

    /// Position as a fraction of the duration, 0.0 when the duration is unknown
    pub fn progress(&self) -> f32 {
        let duration = self.duration();
        if duration.is_zero() {
            return 0.0;
        }
        (self.position().as_secs_f64() / duration.as_secs_f64()) as f32
    }

    /// Wait until the player thread has handled everything posted so far
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.messages.send(Message::Barrier(Barrier::new(done))).is_ok() {
            let _ = wait.await;
        }
    }

    fn send(&self, command: Command) {
        if self.messages.send(Message::Command(self.id, command)).is_err() {
            tracing::warn!("Player thread gone, dropping command for {}", self.uri);
        }
    }
}
