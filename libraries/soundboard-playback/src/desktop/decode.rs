//! Whole-file decoding into the output format

use std::fs::File;
use std::path::Path;
use std::time::Duration;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{PlaybackError, Result};

/// Decoded sound, interleaved at the output rate and channel count
pub(crate) struct DecodedSound {
    pub samples: Vec<f32>,
    pub duration: Duration,
}

/// Decode `path` and convert it to `channels` channels at `sample_rate`
pub(crate) fn decode_file(path: &Path, sample_rate: u32, channels: usize) -> Result<DecodedSound> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let opened = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PlaybackError::Decode(format!("Failed to open file: {}", e)))?;
    let mut format = opened.format;

    let track = format
        .default_track()
        .ok_or_else(|| PlaybackError::Decode("No audio track found".to_string()))?;
    let track_id = track.id;
    let source_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| PlaybackError::Decode("Unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PlaybackError::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut source_channels = 0;
    let mut interleaved = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(PlaybackError::Decode(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                source_channels = spec.channels.count();
                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buffer.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!("Skipping corrupt packet in {}: {}", path.display(), e);
            }
            Err(e) => return Err(PlaybackError::Decode(e.to_string())),
        }
    }

    if source_channels == 0 {
        return Err(PlaybackError::Decode("No audio decoded".to_string()));
    }

    let frames = interleaved.len() / source_channels;
    let duration = Duration::from_secs_f64(frames as f64 / f64::from(source_rate));
    let remixed = remix(&interleaved, source_channels, channels);
    let samples = resample(&remixed, channels, source_rate, sample_rate)?;

    Ok(DecodedSound { samples, duration })
}

/// Map channel counts; mono is duplicated, extra channels are dropped
fn remix(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to {
        return samples.to_vec();
    }

    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in samples.chunks_exact(from) {
        for channel in 0..to {
            out.push(if from == 1 { frame[0] } else { frame[channel.min(from - 1)] });
        }
    }
    out
}

/// Frames fed to the resampler per call
const RESAMPLE_CHUNK: usize = 1024;

/// Convert interleaved `samples` from rate `from` to rate `to`
fn resample(samples: &[f32], channels: usize, from: u32, to: u32) -> Result<Vec<f32>> {
    if from == to || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = f64::from(to) / f64::from(from);
    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        2.0, // max_resample_ratio_relative
        PolynomialDegree::Linear,
        RESAMPLE_CHUNK,
        channels,
    )
    .map_err(|e| PlaybackError::Decode(format!("Failed to create resampler: {}", e)))?;

    let frames = samples.len() / channels;
    let planar: Vec<Vec<f32>> = (0..channels)
        .map(|channel| samples.iter().skip(channel).step_by(channels).copied().collect())
        .collect();
    let expected = (frames as f64 * ratio).round() as usize;
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + RESAMPLE_CHUNK); channels];

    let mut position = 0;
    while position < frames {
        let needed = resampler.input_frames_next();
        let end = (position + needed).min(frames);
        let chunk: Vec<&[f32]> = planar.iter().map(|c| &c[position..end]).collect();

        let resampled = if end - position == needed {
            resampler.process(&chunk, None)
        } else {
            resampler.process_partial(Some(chunk.as_slice()), None)
        }
        .map_err(|e| PlaybackError::Decode(format!("Resampling failed: {}", e)))?;

        for (out, channel) in output.iter_mut().zip(resampled) {
            out.extend(channel);
        }
        position = end;
    }

    // Drain what the resampler still holds back
    let delay = resampler.output_delay();
    let tail = resampler
        .process_partial::<Vec<f32>>(None, None)
        .map_err(|e| PlaybackError::Decode(format!("Resampling failed: {}", e)))?;
    for (out, channel) in output.iter_mut().zip(tail) {
        out.extend(channel);
    }

    let mut interleaved = Vec::with_capacity(expected * channels);
    for frame in delay..delay + expected {
        for channel in &output {
            interleaved.push(channel.get(frame).copied().unwrap_or(0.0));
        }
    }
    Ok(interleaved)
}
