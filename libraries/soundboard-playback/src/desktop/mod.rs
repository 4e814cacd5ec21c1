//! cpal output backend
//!
//! One cpal output stream mixes every prepared voice. Sources are decoded
//! in full by symphonia when a player is prepared; soundboard clips are
//! short enough to keep in memory.
//!
//! The stream is owned by [`CpalBackend`], which lives on the player thread.

mod decode;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::backend::{AudioBackend, BackendEvent, BackendListener, BackendPlayer, BackendState};
use crate::error::{PlaybackError, Result};

type Voices = Arc<Mutex<Vec<Arc<Voice>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn encode_state(state: BackendState) -> u8 {
    match state {
        BackendState::Idle => 0,
        BackendState::Buffering => 1,
        BackendState::Ready => 2,
        BackendState::Ended => 3,
    }
}

fn decode_state(raw: u8) -> BackendState {
    match raw {
        1 => BackendState::Buffering,
        2 => BackendState::Ready,
        3 => BackendState::Ended,
        _ => BackendState::Idle,
    }
}

/// One source being mixed into the output
struct Voice {
    listener: BackendListener,
    samples: Mutex<Arc<Vec<f32>>>,
    cursor: AtomicUsize,
    playing: AtomicBool,
    state: AtomicU8,
    volume: AtomicU32,
}

impl Voice {
    fn set_state(&self, state: BackendState) {
        self.state.store(encode_state(state), Ordering::Release);
    }

    fn state(&self) -> BackendState {
        decode_state(self.state.load(Ordering::Acquire))
    }
}

/// [`AudioBackend`] playing through the default cpal output device
pub struct CpalBackend {
    voices: Voices,
    sample_rate: u32,
    channels: usize,
    _stream: Stream,
}

impl CpalBackend {
    /// Open the default output device
    ///
    /// # Errors
    /// Returns an error if no device is available or the stream cannot start
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| PlaybackError::Device("No output device found".to_string()))?;
        let config = device
            .default_output_config()
            .map_err(|e| PlaybackError::Device(e.to_string()))?;

        let sample_rate = config.sample_rate();
        let sample_format = config.sample_format();
        let config: StreamConfig = config.config();
        let channels = usize::from(config.channels);

        let voices: Voices = Arc::new(Mutex::new(Vec::new()));
        let mixer_voices = Arc::clone(&voices);
        let stream = match sample_format {
            SampleFormat::I8 => build_stream::<i8>(&device, &config, mixer_voices),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer_voices),
            SampleFormat::I32 => build_stream::<i32>(&device, &config, mixer_voices),
            SampleFormat::I64 => build_stream::<i64>(&device, &config, mixer_voices),
            SampleFormat::U8 => build_stream::<u8>(&device, &config, mixer_voices),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer_voices),
            SampleFormat::U32 => build_stream::<u32>(&device, &config, mixer_voices),
            SampleFormat::U64 => build_stream::<u64>(&device, &config, mixer_voices),
            SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer_voices),
            SampleFormat::F64 => build_stream::<f64>(&device, &config, mixer_voices),
            format => {
                return Err(PlaybackError::Device(format!(
                    "Unsupported sample format: {format}"
                )))
            }
        }
        .map_err(|e| PlaybackError::Device(e.to_string()))?;
        stream
            .play()
            .map_err(|e| PlaybackError::Device(e.to_string()))?;

        tracing::info!(
            "Opened audio output: {} Hz, {} channels, {}",
            sample_rate,
            channels,
            sample_format
        );

        Ok(Self {
            voices,
            sample_rate,
            channels,
            _stream: stream,
        })
    }
}

impl AudioBackend for CpalBackend {
    fn create_player(
        &mut self,
        uri: &str,
        volume: f32,
        listener: BackendListener,
    ) -> Result<Box<dyn BackendPlayer>> {
        let path = PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri));
        let voice = Arc::new(Voice {
            listener,
            samples: Mutex::new(Arc::new(Vec::new())),
            cursor: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            state: AtomicU8::new(encode_state(BackendState::Idle)),
            volume: AtomicU32::new(volume.to_bits()),
        });
        lock(&self.voices).push(Arc::clone(&voice));

        Ok(Box::new(CpalPlayer {
            path,
            voice,
            voices: Arc::clone(&self.voices),
            sample_rate: self.sample_rate,
            channels: self.channels,
            play_when_ready: false,
        }))
    }
}

struct CpalPlayer {
    path: PathBuf,
    voice: Arc<Voice>,
    voices: Voices,
    sample_rate: u32,
    channels: usize,
    play_when_ready: bool,
}

impl CpalPlayer {
    fn emit(&self, event: BackendEvent) {
        self.voice.listener.emit(event);
    }

    fn start_if_ready(&self) {
        if self.voice.state() == BackendState::Ready
            && self.play_when_ready
            && !self.voice.playing.swap(true, Ordering::AcqRel)
        {
            self.emit(BackendEvent::IsPlayingChanged(true));
        }
    }

    fn halt(&self) {
        if self.voice.playing.swap(false, Ordering::AcqRel) {
            self.emit(BackendEvent::IsPlayingChanged(false));
        }
    }
}

impl BackendPlayer for CpalPlayer {
    fn prepare(&mut self) {
        if self.voice.state() != BackendState::Idle {
            return;
        }

        self.voice.set_state(BackendState::Buffering);
        match decode::decode_file(&self.path, self.sample_rate, self.channels) {
            Ok(decoded) => {
                *lock(&self.voice.samples) = Arc::new(decoded.samples);
                self.voice.set_state(BackendState::Ready);
                self.emit(BackendEvent::StateChanged(BackendState::Ready));
                self.emit(BackendEvent::DurationKnown(decoded.duration));
                self.start_if_ready();
            }
            Err(e) => {
                self.voice.set_state(BackendState::Idle);
                self.emit(BackendEvent::Error(Some(e.to_string())));
            }
        }
    }

    fn play(&mut self) {
        self.play_when_ready = true;
        self.start_if_ready();
    }

    fn pause(&mut self) {
        self.play_when_ready = false;
        self.halt();
    }

    fn stop(&mut self) {
        if self.voice.state() != BackendState::Idle {
            self.voice.set_state(BackendState::Idle);
            self.emit(BackendEvent::StateChanged(BackendState::Idle));
        }
        self.halt();
    }

    fn seek_to(&mut self, position: Duration) {
        let frame = (position.as_secs_f64() * f64::from(self.sample_rate)) as usize;
        self.voice
            .cursor
            .store(frame * self.channels, Ordering::Release);

        if self.voice.state() == BackendState::Ended {
            self.voice.set_state(BackendState::Ready);
            self.emit(BackendEvent::StateChanged(BackendState::Ready));
            self.start_if_ready();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.voice.volume.store(volume.to_bits(), Ordering::Relaxed);
    }

    fn release(&mut self) {
        self.voice.playing.store(false, Ordering::Release);
        lock(&self.voices).retain(|v| !Arc::ptr_eq(v, &self.voice));
    }

    fn is_playing(&self) -> bool {
        self.voice.playing.load(Ordering::Acquire)
    }

    fn play_when_ready(&self) -> bool {
        self.play_when_ready
    }

    fn state(&self) -> BackendState {
        self.voice.state()
    }

    fn position(&self) -> Duration {
        let frame = self.voice.cursor.load(Ordering::Acquire) / self.channels.max(1);
        Duration::from_secs_f64(frame as f64 / f64::from(self.sample_rate))
    }
}

/// Build an output stream in the device's native sample format
///
/// Voices are mixed as `f32` into a scratch buffer, then converted.
fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    voices: Voices,
) -> std::result::Result<Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.resize(data.len(), 0.0);
            mix(&mut scratch, &voices);
            write_samples(data, &scratch);
        },
        |err| tracing::error!("Audio stream error: {}", err),
        None,
    )
}

fn write_samples<T>(output: &mut [T], mixed: &[f32])
where
    T: Sample + FromSample<f32>,
{
    for (out, &sample) in output.iter_mut().zip(mixed) {
        *out = T::from_sample(sample);
    }
}

/// Output callback: sum every playing voice
fn mix(output: &mut [f32], voices: &Voices) {
    output.fill(0.0);

    for voice in lock(voices).iter() {
        if !voice.playing.load(Ordering::Acquire) {
            continue;
        }

        let samples = Arc::clone(&*lock(&voice.samples));
        let volume = f32::from_bits(voice.volume.load(Ordering::Relaxed));
        let mut cursor = voice.cursor.load(Ordering::Acquire);

        for out in output.iter_mut() {
            let Some(sample) = samples.get(cursor) else {
                break;
            };
            *out += sample * volume;
            cursor += 1;
        }
        voice.cursor.store(cursor, Ordering::Release);

        if cursor >= samples.len() && voice.playing.swap(false, Ordering::AcqRel) {
            voice.set_state(BackendState::Ended);
            voice
                .listener
                .emit(BackendEvent::StateChanged(BackendState::Ended));
            voice.listener.emit(BackendEvent::IsPlayingChanged(false));
        }
    }

    for out in output.iter_mut() {
        *out = out.clamp(-1.0, 1.0);
    }
}
