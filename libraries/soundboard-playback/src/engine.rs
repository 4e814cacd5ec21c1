//! Per-sound playback engine
//!
//! Lives on the player thread. Holds the active backend player plus any
//! retiring players still sounding out an earlier overlapping press.

use crossbeam_channel::Sender;
use soundboard_core::RepressMode;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;

use crate::backend::{
    AudioBackend, BackendEvent, BackendListener, BackendPlayer, BackendState, PlayerKey,
};
use crate::error::Result;
use crate::events::{PlaybackNotification, SoundPlayerListener};
use crate::thread::{Command, Message, PlayerId};
use crate::types::PlaybackState;

/// Observable state of one sound player, shared with its handle
#[derive(Debug)]
pub(crate) struct PlayerStatus {
    pub state: watch::Sender<PlaybackState>,
    pub position: watch::Sender<Duration>,
    pub duration: watch::Sender<Duration>,
}

impl PlayerStatus {
    pub fn new(duration: Duration) -> Self {
        Self {
            state: watch::channel(PlaybackState::Created).0,
            position: watch::channel(Duration::ZERO).0,
            duration: watch::channel(duration).0,
        }
    }
}

/// Everything needed to build an engine on the player thread
pub(crate) struct EngineSpec {
    pub id: PlayerId,
    pub uri: String,
    pub volume: f32,
    pub status: Arc<PlayerStatus>,
}

/// Backend plus the bookkeeping shared by all engines
pub(crate) struct Players {
    backend: Box<dyn AudioBackend>,
    routes: HashMap<PlayerKey, PlayerId>,
    next_key: u64,
    messages: Sender<Message>,
    notifications: broadcast::Sender<PlaybackNotification>,
    runtime: Handle,
    poll_interval: Duration,
}

impl Players {
    pub fn new(
        backend: Box<dyn AudioBackend>,
        messages: Sender<Message>,
        notifications: broadcast::Sender<PlaybackNotification>,
        runtime: Handle,
        poll_interval: Duration,
    ) -> Self {
        Self {
            backend,
            routes: HashMap::new(),
            next_key: 1,
            messages,
            notifications,
            runtime,
            poll_interval,
        }
    }

    /// Queue a message behind everything already in the inbox
    pub fn post(&self, message: Message) {
        let _ = self.messages.send(message);
    }

    pub fn route(&self, key: PlayerKey) -> Option<PlayerId> {
        self.routes.get(&key).copied()
    }

    fn create(&mut self, id: PlayerId, uri: &str, volume: f32) -> Result<Slot> {
        let key = PlayerKey(self.next_key);
        self.next_key += 1;

        let listener = BackendListener::new(key, self.messages.clone());
        let player = self.backend.create_player(uri, volume, listener)?;
        self.routes.insert(key, id);
        tracing::trace!("Created {} for {}", key, uri);

        Ok(Slot { key, player })
    }

    fn retire(&mut self, mut slot: Slot) {
        self.routes.remove(&slot.key);
        slot.player.release();
    }

    fn notify(&self, notification: PlaybackNotification) {
        // No subscribers is fine
        let _ = self.notifications.send(notification);
    }

    /// Sample the position of `id` every poll interval while it is playing
    fn spawn_poller(&self, id: PlayerId, mut state: watch::Receiver<PlaybackState>) -> AbortHandle {
        let messages = self.messages.clone();
        let period = self.poll_interval;

        self.runtime
            .spawn(async move {
                loop {
                    while *state.borrow_and_update() != PlaybackState::Playing {
                        if state.changed().await.is_err() {
                            return;
                        }
                    }

                    let mut ticker = tokio::time::interval(period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                    loop {
                        tokio::select! {
                            _ = ticker.tick() => {
                                let sample = Message::Command(id, Command::SamplePosition);
                                if messages.send(sample).is_err() {
                                    return;
                                }
                            }
                            changed = state.changed() => {
                                if changed.is_err() {
                                    return;
                                }
                                if *state.borrow_and_update() != PlaybackState::Playing {
                                    break;
                                }
                            }
                        }
                    }
                }
            })
            .abort_handle()
    }
}

struct Slot {
    key: PlayerKey,
    player: Box<dyn BackendPlayer>,
}

pub(crate) struct Engine {
    id: PlayerId,
    uri: String,
    volume: f32,
    duration: Duration,
    state: PlaybackState,
    active: Option<Slot>,
    retiring: Vec<Slot>,
    listeners: Vec<Arc<dyn SoundPlayerListener>>,
    release_when_finished: bool,
    poller: Option<AbortHandle>,
    status: Arc<PlayerStatus>,
}

impl Engine {
    pub fn new(spec: EngineSpec) -> Self {
        let duration = *spec.status.duration.borrow();
        Self {
            id: spec.id,
            uri: spec.uri,
            volume: spec.volume,
            duration,
            state: PlaybackState::Created,
            active: None,
            retiring: Vec::new(),
            listeners: Vec::new(),
            release_when_finished: false,
            poller: None,
            status: spec.status,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn handle(&mut self, command: Command, players: &mut Players) {
        match command {
            Command::Initialize => self.initialize(players),
            Command::Play => self.play(),
            Command::PlayParallel => self.play_parallel(players),
            Command::Pause => self.pause(),
            Command::Stop => self.stop(),
            Command::Restart => self.restart(),
            Command::Press(mode) => self.press(mode, players),
            Command::SetVolume(volume) => self.set_volume(volume),
            Command::ReleaseWhenFinished => self.release_when_finished(players),
            Command::SamplePosition => self.sample_position(),
            Command::AddListener(listener) => {
                if !self.listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
                    self.listeners.push(listener);
                }
            }
        }
    }

    pub fn on_backend_event(&mut self, key: PlayerKey, event: BackendEvent, players: &mut Players) {
        if self.active.as_ref().is_some_and(|slot| slot.key == key) {
            self.on_active_event(event, players);
        } else if let Some(index) = self.retiring.iter().position(|slot| slot.key == key) {
            self.on_retiring_event(index, event, players);
        }
    }

    fn initialize(&mut self, players: &mut Players) {
        if self.active.is_none() {
            match players.create(self.id, &self.uri, self.volume) {
                Ok(slot) => {
                    self.active = Some(slot);
                    self.set_state(PlaybackState::Stopped);
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize player for {}: {}", self.uri, e);
                    players.notify(PlaybackNotification::Unavailable {
                        uri: self.uri.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if self.poller.as_ref().map_or(true, AbortHandle::is_finished) {
            self.poller = Some(players.spawn_poller(self.id, self.status.state.subscribe()));
        }
    }

    fn play(&mut self) {
        let paused = self.state == PlaybackState::Paused;
        let Some(slot) = self.active.as_mut() else {
            return;
        };

        if slot.player.state() == BackendState::Idle {
            slot.player.prepare();
        }
        if !paused && slot.player.position() > Duration::ZERO {
            slot.player.seek_to(Duration::ZERO);
        }
        slot.player.play();
    }

    fn play_parallel(&mut self, players: &mut Players) {
        let Some(slot) = self.active.as_ref() else {
            return;
        };
        if !slot.player.is_playing() {
            self.play();
            return;
        }

        match players.create(self.id, &self.uri, self.volume) {
            Ok(mut fresh) => {
                fresh.player.play();
                fresh.player.prepare();
                if let Some(previous) = self.active.replace(fresh) {
                    self.retiring.push(previous);
                }
                tracing::trace!("{} now has {} retiring players", self.uri, self.retiring.len());
            }
            Err(e) => {
                tracing::warn!("Failed to create overlapping player for {}: {}", self.uri, e);
                players.notify(PlaybackNotification::Unavailable {
                    uri: self.uri.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    fn pause(&mut self) {
        if let Some(slot) = self.active.as_mut() {
            slot.player.pause();
        }
        for slot in &mut self.retiring {
            slot.player.stop();
        }
    }

    fn stop(&mut self) {
        if let Some(slot) = self.active.as_mut() {
            slot.player.stop();
        }
        for slot in &mut self.retiring {
            slot.player.stop();
        }
    }

    fn restart(&mut self) {
        let Some(slot) = self.active.as_mut() else {
            return;
        };

        if slot.player.state() == BackendState::Idle {
            slot.player.prepare();
        }
        slot.player.seek_to(Duration::ZERO);
        if !slot.player.is_playing() {
            slot.player.play();
        }
    }

    fn press(&mut self, mode: RepressMode, players: &mut Players) {
        if self.state != PlaybackState::Playing {
            self.play();
            return;
        }

        match mode {
            RepressMode::Stop => self.stop(),
            RepressMode::Restart => self.restart(),
            RepressMode::Overlap => self.play_parallel(players),
            RepressMode::Pause => self.pause(),
        }
    }

    fn set_volume(&mut self, volume: f32) {
        if volume == self.volume {
            return;
        }

        self.volume = volume;
        if let Some(slot) = self.active.as_mut() {
            slot.player.set_volume(volume);
        }
        for slot in &mut self.retiring {
            slot.player.set_volume(volume);
        }
    }

    fn release_when_finished(&mut self, players: &mut Players) {
        let Some(slot) = self.active.as_ref() else {
            return;
        };

        if slot.player.is_playing() {
            self.release_when_finished = true;
        } else {
            self.release(players);
        }
    }

    pub fn release(&mut self, players: &mut Players) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        if let Some(slot) = self.active.take() {
            players.retire(slot);
        }
        for slot in self.retiring.drain(..) {
            players.retire(slot);
        }

        self.release_when_finished = false;
        self.status.position.send_replace(Duration::ZERO);
        self.set_state(PlaybackState::Created);
        tracing::debug!("Released player for {}", self.uri);
    }

    fn sample_position(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        if let Some(slot) = &self.active {
            self.status.position.send_replace(slot.player.position());
        }
    }

    fn on_active_event(&mut self, event: BackendEvent, players: &mut Players) {
        match event {
            BackendEvent::IsPlayingChanged(is_playing) => {
                let Some(slot) = &self.active else {
                    return;
                };
                let state = if is_playing {
                    PlaybackState::Playing
                } else if slot.player.state() == BackendState::Ready && !slot.player.play_when_ready()
                {
                    PlaybackState::Paused
                } else {
                    PlaybackState::Stopped
                };
                self.set_state(state);

                if self.release_when_finished {
                    self.release(players);
                }
            }
            BackendEvent::StateChanged(BackendState::Ended) => {
                for listener in &self.listeners {
                    listener.on_playback_ended();
                }
            }
            BackendEvent::StateChanged(_) => {}
            BackendEvent::Error(Some(message)) => {
                tracing::warn!("Playback error for {}: {}", self.uri, message);
                players.notify(PlaybackNotification::Error {
                    uri: self.uri.clone(),
                    message,
                });
                self.set_state(PlaybackState::Error);
            }
            BackendEvent::Error(None) => {
                if self.state == PlaybackState::Error {
                    self.set_state(PlaybackState::Stopped);
                }
            }
            BackendEvent::DurationKnown(duration) => {
                if duration > Duration::ZERO && duration != self.duration {
                    self.duration = duration;
                    self.status.duration.send_replace(duration);
                    for listener in &self.listeners {
                        listener.on_duration_changed(duration);
                    }
                }
            }
        }
    }

    fn on_retiring_event(&mut self, index: usize, event: BackendEvent, players: &mut Players) {
        let BackendEvent::StateChanged(state @ (BackendState::Ended | BackendState::Idle)) = event
        else {
            return;
        };

        if state == BackendState::Ended {
            for listener in &self.listeners {
                listener.on_playback_ended();
            }
        }
        let slot = self.retiring.remove(index);
        players.retire(slot);
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            tracing::trace!("{}: {} -> {}", self.uri, self.state, state);
            self.state = state;
            self.status.state.send_replace(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use crossbeam_channel::{unbounded, Receiver};

    fn setup() -> (Engine, Players, Receiver<Message>, Arc<PlayerStatus>) {
        let (messages, inbox) = unbounded();
        let (notifications, _) = broadcast::channel(4);
        let players = Players::new(
            Box::new(FakeBackend::new()),
            messages,
            notifications,
            Handle::current(),
            Duration::from_millis(5),
        );
        let status = Arc::new(PlayerStatus::new(Duration::ZERO));
        let engine = Engine::new(EngineSpec {
            id: PlayerId(1),
            uri: "/sounds/gong.wav".to_string(),
            volume: 1.0,
            status: Arc::clone(&status),
        });
        (engine, players, inbox, status)
    }

    /// Feed queued backend events back in, returning how many position samples were queued
    fn pump(engine: &mut Engine, players: &mut Players, inbox: &Receiver<Message>) -> usize {
        let mut samples = 0;
        for message in inbox.try_iter() {
            match message {
                Message::Backend { key, event } => engine.on_backend_event(key, event, players),
                Message::Command(_, Command::SamplePosition) => samples += 1,
                _ => {}
            }
        }
        samples
    }

    #[tokio::test]
    async fn release_stops_the_position_poller() {
        let (mut engine, mut players, inbox, status) = setup();

        engine.handle(Command::Initialize, &mut players);
        engine.handle(Command::Play, &mut players);
        pump(&mut engine, &mut players, &inbox);
        assert_eq!(engine.state, PlaybackState::Playing);
        assert_eq!(status.state.receiver_count(), 1);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(pump(&mut engine, &mut players, &inbox) > 0);

        engine.release(&mut players);
        for _ in 0..100 {
            if status.state.receiver_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(status.state.receiver_count(), 0);

        pump(&mut engine, &mut players, &inbox);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(pump(&mut engine, &mut players, &inbox), 0);
    }

    #[tokio::test]
    async fn initialize_keeps_a_single_poller() {
        let (mut engine, mut players, _inbox, status) = setup();

        engine.handle(Command::Initialize, &mut players);
        engine.handle(Command::Initialize, &mut players);
        assert_eq!(status.state.receiver_count(), 1);
    }
}
