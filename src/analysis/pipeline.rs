//! Chord analysis pipeline
//!
//! Wires the four stages together for a fixed sample rate and configuration:
//!
//! ```text
//! samples → STFT magnitude → harmonic suppression → chromagram → chord matching
//! ```
//!
//! Everything that depends only on the configuration (FFT plan, window,
//! harmonic and octave lookup tables, template bank) is computed once in
//! [`ChordPipeline::new`]. Analysing a buffer never mutates the pipeline, so
//! the same input always produces bit-identical output.

use std::time::Instant;

use super::metadata::AnalysisMetadata;
use super::result::ChordAnalysis;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::chord::{ChordMatcher, ChordTemplateBank, TemplateWeights};
use crate::features::chroma::{Chromagram, ChromagramBuilder};
use crate::features::spectral::{HarmonicSuppressor, Spectrogram, StftEngine};

/// Prepared chord recognition pipeline for one sample rate
#[derive(Debug)]
pub struct ChordPipeline {
    config: AnalysisConfig,
    stft: StftEngine,
    suppressor: Option<HarmonicSuppressor>,
    chroma: ChromagramBuilder,
    matcher: ChordMatcher,
}

impl ChordPipeline {
    /// Validate `config` and precompute all stage tables
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for a malformed configuration or
    /// a zero sample rate, and `AnalysisError::ComputationDegenerate` if the
    /// note range leaves a pitch class without bins.
    pub fn new(sample_rate: u32, config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;

        let stft = StftEngine::new(sample_rate, config.window_size, config.overlap)?;
        let suppressor = if config.harmonic_suppression {
            Some(HarmonicSuppressor::from_config(stft.frequencies(), &config)?)
        } else {
            None
        };
        let chroma = ChromagramBuilder::from_config(stft.frequencies(), &config)?;
        let matcher = if config.templates == TemplateWeights::default() {
            ChordMatcher::standard()
        } else {
            ChordMatcher::new(ChordTemplateBank::new(&config.templates)?)
        };

        log::debug!(
            "Chord pipeline ready: {} Hz, window={}, hop={}, harmonic suppression={}",
            sample_rate,
            config.window_size,
            config.hop_size(),
            config.harmonic_suppression
        );

        Ok(Self {
            config,
            stft,
            suppressor,
            chroma,
            matcher,
        })
    }

    /// Configuration this pipeline was built from
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.stft.sample_rate()
    }

    /// Frequency axis shared by all stages
    pub fn frequencies(&self) -> &[f32] {
        self.stft.frequencies()
    }

    /// Template matcher in use
    pub fn matcher(&self) -> &ChordMatcher {
        &self.matcher
    }

    /// Stage 1: magnitude spectrogram
    pub fn spectrogram(&self, samples: &[f32]) -> Result<Spectrogram, AnalysisError> {
        self.stft.compute(samples)
    }

    /// Stages 2 and 3: optional harmonic suppression, then octave folding
    pub fn chromagram(&self, spectrogram: &Spectrogram) -> Result<Chromagram, AnalysisError> {
        match &self.suppressor {
            Some(suppressor) => {
                let filtered = suppressor.apply(&spectrogram.magnitudes)?;
                self.chroma.build(&filtered)
            }
            None => self.chroma.build(&spectrogram.magnitudes),
        }
    }

    /// Run all four stages over `samples`
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `samples` is empty or shorter
    /// than one analysis window.
    pub fn analyze(&self, samples: &[f32]) -> Result<ChordAnalysis, AnalysisError> {
        let start_time = Instant::now();

        let spectrogram = self.spectrogram(samples)?;
        let chromagram = self.chromagram(&spectrogram)?;
        let (chordgram, detections) = self.matcher.match_chromagram(&chromagram);

        let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
        let frames = detections.len();

        Ok(ChordAnalysis {
            frequencies: spectrogram.frequencies,
            times: spectrogram.times,
            chromagram,
            chordgram,
            detections,
            metadata: AnalysisMetadata {
                duration_seconds: samples.len() as f32 / self.sample_rate() as f32,
                sample_rate: self.sample_rate(),
                processing_time_ms,
                window_size: self.config.window_size,
                hop_size: self.config.hop_size(),
                frames,
                harmonic_suppression: self.suppressor.is_some(),
                ..Default::default()
            },
        })
    }
}
