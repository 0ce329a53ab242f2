//! Audio decoding using Symphonia

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::downmix_into;

fn decoding_error(context: &str, err: SymphoniaError) -> AnalysisError {
    AnalysisError::DecodingError(format!("{}: {}", context, err))
}

/// Decode an audio file to mono PCM samples
///
/// Multichannel streams are averaged down to one channel. Corrupted packets
/// are skipped with a warning.
///
/// # Arguments
///
/// * `path` - Path to audio file (WAV, FLAC, MP3, AAC, ALAC, ...)
///
/// # Returns
///
/// Tuple of (mono samples, sample_rate)
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` if the file cannot be opened, has no
/// audio track, or uses an unsupported codec.
pub fn decode_audio<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32), AnalysisError> {
    let path = path.as_ref();
    log::debug!("Decoding audio file: {}", path.display());

    let src = File::open(path).map_err(|e| {
        AnalysisError::DecodingError(format!("Cannot open {}: {}", path.display(), e))
    })?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decoding_error("Unrecognised format", e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::DecodingError("No supported audio tracks found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AnalysisError::DecodingError("Track has no sample rate".to_string()))?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decoding_error("Unsupported codec", e))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut interleaved: Option<SampleBuffer<f32>> = None;
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decoding_error("Read failed", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let channels = spec.channels.count();
                let needed = decoded.capacity() * channels;
                if interleaved.as_ref().map_or(true, |buf| buf.capacity() < needed) {
                    interleaved = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = interleaved.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    downmix_into(buf.samples(), channels, &mut samples);
                }
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                // Corrupted packet; keep going
                skipped_packets += 1;
                log::warn!("Skipping undecodable packet: {}", msg);
            }
            Err(e) => return Err(decoding_error("Decode failed", e)),
        }
    }

    if skipped_packets > 0 {
        log::warn!("{} packets skipped in {}", skipped_packets, path.display());
    }

    log::debug!(
        "Decoded {} samples at {} Hz ({:.2}s)",
        samples.len(),
        sample_rate,
        samples.len() as f32 / sample_rate as f32
    );

    Ok((samples, sample_rate))
}
