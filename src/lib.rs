//! # chordscan
//!
//! Frame-by-frame chord recognition for mono audio. Each analysis frame is
//! labelled with one of 12 major triads, 12 minor triads or no-chord, along
//! with a cosine-similarity confidence.
//!
//! ## Features
//!
//! - **Spectrogram**: Tukey-windowed STFT magnitude with per-frame DC removal
//! - **Harmonic suppression**: Keeps spectral energy only where a harmonic series is present
//! - **Chromagram**: Folds a MIDI note range onto 12 pitch classes
//! - **Chord matching**: Cosine similarity against a 25-template bank
//! - **Streaming**: Block-wise analysis publishing the latest result to a single-slot mailbox
//!
//! ## Quick Start
//!
//! ```no_run
//! use chordscan::{detect_chords, AnalysisConfig};
//!
//! // Mono f32 samples in [-1.0, 1.0]
//! let samples: Vec<f32> = vec![0.0; 44100 * 5];
//! let analysis = detect_chords(&samples, 44100, AnalysisConfig::default())?;
//!
//! for segment in analysis.segments() {
//!     println!("{:.2}s  {}", segment.start, segment.chord);
//! }
//! # Ok::<(), chordscan::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Audio Input → STFT → Harmonic Suppression → Chromagram → Chord Matching → Output
//! ```
//!
//! For live input, [`streaming::StreamingAdapter`] runs the same pipeline on
//! fixed-size blocks and publishes to a [`streaming::LatestMailbox`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod streaming;

// Re-export main types
pub use analysis::metadata::AnalysisMetadata;
pub use analysis::pipeline::ChordPipeline;
pub use analysis::result::{Chord, ChordAnalysis, ChordDetection, ChordSegment};
pub use config::AnalysisConfig;
pub use error::AnalysisError;

/// Main analysis function
///
/// Runs the full chord recognition pipeline over a mono buffer.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz (typically 44100 or 48000)
/// * `config` - Analysis configuration parameters
///
/// # Returns
///
/// `ChordAnalysis` with frame times, chromagram, chordgram and per-frame detections
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for empty input, a zero sample rate,
/// a buffer shorter than one window, or a malformed configuration.
///
/// # Example
///
/// ```no_run
/// use chordscan::{detect_chords, AnalysisConfig};
///
/// let samples = vec![0.0f32; 44100 * 3];
/// let analysis = detect_chords(&samples, 44100, AnalysisConfig::default())?;
/// println!("{} frames", analysis.detections.len());
/// # Ok::<(), chordscan::AnalysisError>(())
/// ```
pub fn detect_chords(
    samples: &[f32],
    sample_rate: u32,
    config: AnalysisConfig,
) -> Result<ChordAnalysis, AnalysisError> {
    log::debug!("Starting chord analysis: {} samples at {} Hz", samples.len(), sample_rate);

    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput("Empty audio samples".to_string()));
    }

    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }

    let pipeline = ChordPipeline::new(sample_rate, config)?;
    let analysis = pipeline.analyze(samples)?;

    log::debug!(
        "Chord analysis finished: {} frames in {:.1} ms",
        analysis.detections.len(),
        analysis.metadata.processing_time_ms
    );

    Ok(analysis)
}
