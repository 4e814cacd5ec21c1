//! Scriptable in-memory backend
//!
//! [`FakeBackend`] behaves like a media player without producing sound:
//! preparing a source makes it ready at once, and a play-out lasts until the
//! test calls [`FakeBackend::finish`]. Events are reported in the order a
//! platform media player reports them (state change before the playing
//! flag).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::backend::{
    AudioBackend, BackendEvent, BackendListener, BackendPlayer, BackendState, PlayerKey,
};
use crate::error::{PlaybackError, Result};

/// Snapshot of one fake backend player
#[derive(Debug, Clone, PartialEq)]
pub struct FakePlayerInfo {
    pub key: PlayerKey,
    pub uri: String,
    pub state: BackendState,
    pub playing: bool,
    pub play_when_ready: bool,
    pub position: Duration,
    pub volume: f32,
    pub released: bool,
}

#[derive(Default)]
struct Shared {
    players: Vec<FakePlayerInfo>,
    listeners: HashMap<PlayerKey, BackendListener>,
    durations: HashMap<String, Duration>,
    prepare_errors: HashMap<String, String>,
    unavailable: HashSet<String>,
}

impl Shared {
    fn player_mut(&mut self, key: PlayerKey) -> Option<&mut FakePlayerInfo> {
        self.players.iter_mut().find(|p| p.key == key)
    }
}

/// In-memory [`AudioBackend`]
///
/// Clones share state, so a test keeps one clone to drive and inspect the
/// players while the player thread owns another.
#[derive(Clone, Default)]
pub struct FakeBackend {
    shared: Arc<Mutex<Shared>>,
}

impl std::fmt::Debug for FakeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeBackend")
            .field("players", &self.lock().players.len())
            .finish()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration reported when a source for `uri` is prepared
    pub fn set_duration(&self, uri: &str, duration: Duration) {
        self.lock().durations.insert(uri.to_string(), duration);
    }

    /// Make preparing `uri` fail with `message`
    pub fn fail_prepare(&self, uri: &str, message: &str) {
        self.lock()
            .prepare_errors
            .insert(uri.to_string(), message.to_string());
    }

    /// Make creating a player for `uri` fail
    pub fn make_unavailable(&self, uri: &str) {
        self.lock().unavailable.insert(uri.to_string());
    }

    /// Every player created so far, released ones included
    pub fn players(&self) -> Vec<FakePlayerInfo> {
        self.lock().players.clone()
    }

    /// Players for `uri` that have not been released
    pub fn live_players(&self, uri: &str) -> Vec<FakePlayerInfo> {
        self.lock()
            .players
            .iter()
            .filter(|p| p.uri == uri && !p.released)
            .cloned()
            .collect()
    }

    /// Number of released players for `uri`
    pub fn released_count(&self, uri: &str) -> usize {
        self.lock()
            .players
            .iter()
            .filter(|p| p.uri == uri && p.released)
            .count()
    }

    /// Move the position of a player
    pub fn set_position(&self, key: PlayerKey, position: Duration) {
        if let Some(player) = self.lock().player_mut(key) {
            player.position = position;
        }
    }

    /// Let a playing player reach the end of its source; no effect otherwise
    pub fn finish(&self, key: PlayerKey) {
        let mut events = Vec::new();
        let listener = {
            let mut shared = self.lock();
            let duration = shared.players.iter().find(|p| p.key == key).and_then(|p| {
                shared.durations.get(&p.uri).copied()
            });
            let Some(player) = shared.player_mut(key) else {
                return;
            };
            if player.released || !player.playing {
                return;
            }

            player.state = BackendState::Ended;
            player.playing = false;
            if let Some(duration) = duration {
                player.position = duration;
            }
            events.push(BackendEvent::StateChanged(BackendState::Ended));
            events.push(BackendEvent::IsPlayingChanged(false));
            shared.listeners.get(&key).cloned()
        };

        emit(listener, events);
    }

    /// Raise a playback error on a player
    pub fn raise_error(&self, key: PlayerKey, message: &str) {
        let listener = {
            let mut shared = self.lock();
            let Some(player) = shared.player_mut(key) else {
                return;
            };
            player.state = BackendState::Idle;
            player.playing = false;
            shared.listeners.get(&key).cloned()
        };

        emit(listener, vec![BackendEvent::Error(Some(message.to_string()))]);
    }

    /// Clear a previously raised error
    pub fn clear_error(&self, key: PlayerKey) {
        let listener = self.lock().listeners.get(&key).cloned();
        emit(listener, vec![BackendEvent::Error(None)]);
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn emit(listener: Option<BackendListener>, events: Vec<BackendEvent>) {
    if let Some(listener) = listener {
        for event in events {
            listener.emit(event);
        }
    }
}

impl AudioBackend for FakeBackend {
    fn create_player(
        &mut self,
        uri: &str,
        volume: f32,
        listener: BackendListener,
    ) -> Result<Box<dyn BackendPlayer>> {
        let mut shared = self.lock();
        if shared.unavailable.contains(uri) {
            return Err(PlaybackError::player_creation(uri, "source unavailable"));
        }

        let key = listener.key();
        shared.players.push(FakePlayerInfo {
            key,
            uri: uri.to_string(),
            state: BackendState::Idle,
            playing: false,
            play_when_ready: false,
            position: Duration::ZERO,
            volume,
            released: false,
        });
        shared.listeners.insert(key, listener);

        Ok(Box::new(FakePlayer {
            key,
            backend: self.clone(),
        }))
    }
}

struct FakePlayer {
    key: PlayerKey,
    backend: FakeBackend,
}

impl FakePlayer {
    /// Mutate this player's record, then report the collected events
    fn update(&self, f: impl FnOnce(&mut FakePlayerInfo, &Shared, &mut Vec<BackendEvent>)) {
        let mut events = Vec::new();
        let listener = {
            let mut guard = self.backend.lock();
            let shared = &mut *guard;
            let Some(index) = shared.players.iter().position(|p| p.key == self.key) else {
                return;
            };
            let mut player = shared.players[index].clone();
            if player.released {
                return;
            }
            f(&mut player, shared, &mut events);
            shared.players[index] = player;
            shared.listeners.get(&self.key).cloned()
        };

        emit(listener, events);
    }

    fn read<T>(&self, f: impl FnOnce(&FakePlayerInfo) -> T) -> Option<T> {
        self.backend
            .lock()
            .players
            .iter()
            .find(|p| p.key == self.key)
            .map(f)
    }
}

fn start_if_ready(player: &mut FakePlayerInfo, events: &mut Vec<BackendEvent>) {
    if player.state == BackendState::Ready && player.play_when_ready && !player.playing {
        player.playing = true;
        events.push(BackendEvent::IsPlayingChanged(true));
    }
}

impl BackendPlayer for FakePlayer {
    fn prepare(&mut self) {
        self.update(|player, shared, events| {
            if player.state != BackendState::Idle {
                return;
            }
            if let Some(message) = shared.prepare_errors.get(&player.uri) {
                events.push(BackendEvent::Error(Some(message.clone())));
                return;
            }

            player.state = BackendState::Ready;
            events.push(BackendEvent::StateChanged(BackendState::Ready));
            if let Some(duration) = shared.durations.get(&player.uri) {
                events.push(BackendEvent::DurationKnown(*duration));
            }
            start_if_ready(player, events);
        });
    }

    fn play(&mut self) {
        self.update(|player, _, events| {
            player.play_when_ready = true;
            start_if_ready(player, events);
        });
    }

    fn pause(&mut self) {
        self.update(|player, _, events| {
            player.play_when_ready = false;
            if player.playing {
                player.playing = false;
                events.push(BackendEvent::IsPlayingChanged(false));
            }
        });
    }

    fn stop(&mut self) {
        self.update(|player, _, events| {
            if player.state != BackendState::Idle {
                player.state = BackendState::Idle;
                events.push(BackendEvent::StateChanged(BackendState::Idle));
            }
            if player.playing {
                player.playing = false;
                events.push(BackendEvent::IsPlayingChanged(false));
            }
        });
    }

    fn seek_to(&mut self, position: Duration) {
        self.update(|player, _, events| {
            player.position = position;
            if player.state == BackendState::Ended {
                player.state = BackendState::Ready;
                events.push(BackendEvent::StateChanged(BackendState::Ready));
                start_if_ready(player, events);
            }
        });
    }

    fn set_volume(&mut self, volume: f32) {
        self.update(|player, _, _| player.volume = volume);
    }

    fn release(&mut self) {
        let mut shared = self.backend.lock();
        shared.listeners.remove(&self.key);
        if let Some(player) = shared.player_mut(self.key) {
            player.released = true;
            player.playing = false;
            player.state = BackendState::Idle;
        }
    }

    fn is_playing(&self) -> bool {
        self.read(|p| p.playing).unwrap_or(false)
    }

    fn play_when_ready(&self) -> bool {
        self.read(|p| p.play_when_ready).unwrap_or(false)
    }

    fn state(&self) -> BackendState {
        self.read(|p| p.state).unwrap_or_default()
    }

    fn position(&self) -> Duration {
        self.read(|p| p.position).unwrap_or_default()
    }
}
