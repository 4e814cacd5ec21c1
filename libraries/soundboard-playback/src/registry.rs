//! Player registry
//!
//! Maps sound URIs to their players and keeps the store in sync with what
//! the players observe.

use soundboard_core::{Sound, SoundId, SoundboardStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::backend::AudioBackend;
use crate::engine::{EngineSpec, PlayerStatus};
use crate::error::Result;
use crate::events::{PlaybackNotification, SoundPlayerListener};
use crate::player::SoundPlayer;
use crate::thread::{PlayerId, PlayerThread};
use crate::types::PlaybackConfig;

/// Lazily created players, one per sound URI
///
/// Every player created here:
/// - persists a newly reported duration to its sound
/// - increments the sound's play count when a play-out ends naturally
/// - follows later volume changes of its sound in the store
pub struct PlayerRegistry {
    store: Arc<dyn SoundboardStore>,
    players: Mutex<HashMap<String, Arc<SoundPlayer>>>,
    next_id: AtomicU64,
    notifications: broadcast::Sender<PlaybackNotification>,
    runtime: Handle,
    thread: PlayerThread,
}

impl PlayerRegistry {
    /// Start the player thread with the backend built by `factory`
    ///
    /// Must be called from within a tokio runtime. The factory runs on the
    /// player thread.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be created
    pub fn new<B, F>(
        store: Arc<dyn SoundboardStore>,
        config: PlaybackConfig,
        factory: F,
    ) -> Result<Self>
    where
        B: AudioBackend + 'static,
        F: FnOnce() -> Result<B> + Send + 'static,
    {
        let runtime = Handle::current();
        let (notifications, _) = broadcast::channel(config.notification_capacity.max(1));
        let thread = PlayerThread::spawn(factory, &config, runtime.clone(), notifications.clone())?;

        Ok(Self {
            store,
            players: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            notifications,
            runtime,
            thread,
        })
    }

    /// Get the player for `sound`, creating it on first use
    ///
    /// Players are keyed by URI, so sounds sharing a file share a player.
    pub fn get_sound_player(&self, sound: &Sound) -> Arc<SoundPlayer> {
        let mut players = self.lock();
        if let Some(player) = players.get(&sound.uri) {
            return Arc::clone(player);
        }

        let id = PlayerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let status = Arc::new(PlayerStatus::new(sound.duration.unwrap_or_default()));
        self.thread.register(EngineSpec {
            id,
            uri: sound.uri.clone(),
            volume: sound.volume,
            status: Arc::clone(&status),
        });

        let player = Arc::new(SoundPlayer::new(id, &sound.uri, self.thread.sender(), status));
        player.add_listener(Arc::new(StoreSync {
            store: Arc::clone(&self.store),
            sound_id: sound.id.clone(),
            runtime: self.runtime.clone(),
        }));
        self.follow_volume(&player, sound);

        tracing::debug!("Created player for {}", sound.uri);
        players.insert(sound.uri.clone(), Arc::clone(&player));
        player
    }

    /// Player for `uri`, if one was created
    pub fn player(&self, uri: &str) -> Option<Arc<SoundPlayer>> {
        self.lock().get(uri).cloned()
    }

    /// Stop every player
    pub fn stop_all_players(&self) {
        let snapshot: Vec<_> = self.lock().values().cloned().collect();
        for player in snapshot {
            player.stop();
        }
    }

    /// Release the player for `uri` once it is no longer playing
    pub fn release_when_finished(&self, uri: &str) {
        if let Some(player) = self.player(uri) {
            player.release_when_finished();
        }
    }

    /// Subscribe to playback notifications
    pub fn notifications(&self) -> broadcast::Receiver<PlaybackNotification> {
        self.notifications.subscribe()
    }

    /// Number of players created so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no players have been created yet
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<SoundPlayer>>> {
        self.players.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn follow_volume(&self, player: &Arc<SoundPlayer>, sound: &Sound) {
        let store = Arc::clone(&self.store);
        let player: Weak<SoundPlayer> = Arc::downgrade(player);
        let sound_id = sound.id.clone();
        let mut volume = sound.volume;
        let mut changes = store.subscribe_changes();

        self.runtime.spawn(async move {
            while changes.changed().await.is_ok() {
                let Some(player) = player.upgrade() else {
                    break;
                };
                match store.get_sound(&sound_id).await {
                    Ok(Some(sound)) if sound.volume != volume => {
                        volume = sound.volume;
                        player.set_volume(volume);
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Failed to read volume of {}: {}", sound_id, e),
                }
            }
        });
    }
}

impl std::fmt::Debug for PlayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerRegistry")
            .field("players", &self.len())
            .finish_non_exhaustive()
    }
}

/// Writes what a player observes back to its sound
struct StoreSync {
    store: Arc<dyn SoundboardStore>,
    sound_id: SoundId,
    runtime: Handle,
}

impl SoundPlayerListener for StoreSync {
    fn on_duration_changed(&self, duration: Duration) {
        let store = Arc::clone(&self.store);
        let id = self.sound_id.clone();
        self.runtime.spawn(async move {
            if let Err(e) = store.update_duration(&id, duration).await {
                tracing::warn!("Failed to store duration of {}: {}", id, e);
            }
        });
    }

    fn on_playback_ended(&self) {
        let store = Arc::clone(&self.store);
        let id = self.sound_id.clone();
        self.runtime.spawn(async move {
            if let Err(e) = store.increase_play_count(&id).await {
                tracing::warn!("Failed to count play of {}: {}", id, e);
            }
        });
    }
}
