//! Audio file decoding
//!
//! Decodes a recording into a mono [`AudioBuffer`] via symphonia. The engine
//! analyzes a single channel, so interleaved multi-channel sources are
//! reduced to channel 0 here (the left channel, matching what the waveform
//! and spectrogram display downstream).

use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use crate::types::AudioBuffer;

/// Errors that can occur while decoding an audio file
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to open audio file: {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("No audio track found in {0}")]
    NoAudioTrack(PathBuf),

    #[error("Unknown sample rate in {0}")]
    UnknownSampleRate(PathBuf),

    #[error("No samples decoded from {0}")]
    EmptyStream(PathBuf),
}

/// Decode an audio file into a mono buffer.
///
/// Packet errors after a successful start are logged and tolerated (a
/// truncated tail should not make the whole recording unannotatable);
/// a stream that yields no samples at all is an error.
pub fn decode_audio_file(path: &Path) -> Result<AudioBuffer, DecodeError> {
    let file = File::open(path).map_err(|e| DecodeError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Hint the probe with the file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    let mut format = probed.format;

    // First decodable audio track
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::NoAudioTrack(path.to_path_buf()))?;

    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::UnknownSampleRate(path.to_path_buf()))?;

    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1)
        .max(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("Error reading packet from {:?}: {}", path, e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!("Error decoding packet from {:?}: {}", path, e);
                continue;
            }
        };

        // Initialize sample buffer on first decode
        if sample_buf.is_none() {
            let spec = *decoded.spec();
            let duration = decoded.capacity() as u64;
            sample_buf = Some(SampleBuffer::new(duration, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            // Keep channel 0 of each interleaved frame
            samples.extend(buf.samples().iter().step_by(channels));
        }
    }

    if samples.is_empty() {
        return Err(DecodeError::EmptyStream(path.to_path_buf()));
    }

    log::debug!(
        "Decoded {:?}: {} samples @ {} Hz ({:.2}s)",
        path,
        samples.len(),
        sample_rate,
        samples.len() as f64 / sample_rate as f64
    );

    Ok(AudioBuffer::new(samples, sample_rate, path))
}
