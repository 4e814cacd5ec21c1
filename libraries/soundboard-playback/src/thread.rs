//! The player thread
//!
//! Owns the backend and every engine. Commands from handles, position
//! samples from poller tasks, and backend callbacks all arrive through one
//! unbounded inbox and are handled strictly in order.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, oneshot};

use crate::backend::{AudioBackend, BackendEvent, PlayerKey};
use crate::engine::{Engine, EngineSpec, Players};
use crate::error::{PlaybackError, Result};
use crate::events::{PlaybackNotification, SoundPlayerListener};
use crate::types::PlaybackConfig;

/// Identifies one logical sound player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PlayerId(pub u64);

/// Messages handled by the player thread
pub(crate) enum Message {
    Register(EngineSpec),
    Command(PlayerId, Command),
    Backend { key: PlayerKey, event: BackendEvent },
    Barrier(Barrier),
    Shutdown,
}

/// Completion signal for a flush
///
/// `seen` holds the handled-message count when the barrier was last
/// requeued. It completes once it reaches an empty inbox, or once a full
/// pass through the inbox handled nothing but other barriers.
pub(crate) struct Barrier {
    done: oneshot::Sender<()>,
    seen: Option<u64>,
}

impl Barrier {
    pub fn new(done: oneshot::Sender<()>) -> Self {
        Self { done, seen: None }
    }

    fn complete(self) {
        let _ = self.done.send(());
    }
}

/// Engine commands
pub(crate) enum Command {
    Initialize,
    Play,
    PlayParallel,
    Pause,
    Stop,
    Restart,
    Press(soundboard_core::RepressMode),
    SetVolume(f32),
    ReleaseWhenFinished,
    SamplePosition,
    AddListener(Arc<dyn SoundPlayerListener>),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialize => f.write_str("Initialize"),
            Self::Play => f.write_str("Play"),
            Self::PlayParallel => f.write_str("PlayParallel"),
            Self::Pause => f.write_str("Pause"),
            Self::Stop => f.write_str("Stop"),
            Self::Restart => f.write_str("Restart"),
            Self::Press(mode) => write!(f, "Press({mode:?})"),
            Self::SetVolume(volume) => write!(f, "SetVolume({volume})"),
            Self::ReleaseWhenFinished => f.write_str("ReleaseWhenFinished"),
            Self::SamplePosition => f.write_str("SamplePosition"),
            Self::AddListener(_) => f.write_str("AddListener"),
        }
    }
}

/// Handle to the running player thread
pub(crate) struct PlayerThread {
    messages: Sender<Message>,
    thread: Option<JoinHandle<()>>,
}

impl PlayerThread {
    /// Start the thread and build the backend on it
    ///
    /// # Errors
    /// Returns the factory's error if the backend cannot be created
    pub fn spawn<B, F>(
        factory: F,
        config: &PlaybackConfig,
        runtime: Handle,
        notifications: broadcast::Sender<PlaybackNotification>,
    ) -> Result<Self>
    where
        B: AudioBackend + 'static,
        F: FnOnce() -> Result<B> + Send + 'static,
    {
        let (messages, inbox) = unbounded();
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);
        let players_tx = messages.clone();
        let poll_interval = config.poll_interval();

        let thread = std::thread::Builder::new()
            .name("soundboard-player".into())
            .spawn(move || {
                let backend = match factory() {
                    Ok(backend) => {
                        let _ = ready_tx.send(Ok(()));
                        backend
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let players = Players::new(
                    Box::new(backend),
                    players_tx,
                    notifications,
                    runtime,
                    poll_interval,
                );
                Worker::new(players).run(&inbox);
            })?;

        ready_rx.recv().map_err(|_| PlaybackError::ThreadStopped)??;
        tracing::debug!("Player thread started");

        Ok(Self {
            messages,
            thread: Some(thread),
        })
    }

    pub fn sender(&self) -> Sender<Message> {
        self.messages.clone()
    }

    pub fn register(&self, spec: EngineSpec) {
        let _ = self.messages.send(Message::Register(spec));
    }
}

impl Drop for PlayerThread {
    fn drop(&mut self) {
        let _ = self.messages.send(Message::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Player thread panicked");
            }
        }
    }
}

/// Engine table plus shared backend context
pub(crate) struct Worker {
    engines: HashMap<PlayerId, Engine>,
    players: Players,
    handled: u64,
}

impl Worker {
    pub fn new(players: Players) -> Self {
        Self {
            engines: HashMap::new(),
            players,
            handled: 0,
        }
    }

    fn run(mut self, inbox: &Receiver<Message>) {
        while let Ok(message) = inbox.recv() {
            match message {
                // Requeue while work keeps arriving behind it, so events
                // caused by earlier commands are handled too
                Message::Barrier(mut barrier) => {
                    if inbox.is_empty() || barrier.seen == Some(self.handled) {
                        barrier.complete();
                    } else {
                        barrier.seen = Some(self.handled);
                        self.players.post(Message::Barrier(barrier));
                    }
                }
                Message::Shutdown => break,
                message => {
                    self.handled += 1;
                    self.handle(message);
                }
            }
        }

        for engine in self.engines.values_mut() {
            engine.release(&mut self.players);
        }
        tracing::debug!("Player thread stopped");
    }

    pub fn handle(&mut self, message: Message) {
        match message {
            Message::Register(spec) => {
                let engine = Engine::new(spec);
                self.engines.insert(engine.id(), engine);
            }
            Message::Command(id, command) => match self.engines.get_mut(&id) {
                Some(engine) => engine.handle(command, &mut self.players),
                None => tracing::warn!("Command {:?} for unknown player {:?}", command, id),
            },
            Message::Backend { key, event } => {
                // Released players have no route; their late events are dropped
                let Some(id) = self.players.route(key) else {
                    return;
                };
                if let Some(engine) = self.engines.get_mut(&id) {
                    engine.on_backend_event(key, event, &mut self.players);
                }
            }
            Message::Barrier(barrier) => barrier.complete(),
            Message::Shutdown => {}
        }
    }
}
