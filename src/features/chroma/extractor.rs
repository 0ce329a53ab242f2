//! Chromagram construction
//!
//! Converts a magnitude spectrogram into 12-element pitch-class profiles.
//!
//! For each pitch class, every octave occurrence inside
//! `[first_note, last_note]` is mapped to the closest frequency bin of its
//! equal-tempered frequency, and the pitch class energy of a frame is the
//! arithmetic mean of the magnitudes at those bins.
//!
//! # Example
//!
//! ```no_run
//! use chordscan::AnalysisConfig;
//! use chordscan::features::chroma::compute_chromagram;
//! use chordscan::features::spectral::compute_spectrogram;
//!
//! let samples = vec![0.0f32; 44100];
//! let config = AnalysisConfig::default();
//! let spec = compute_spectrogram(&samples, 44100, config.window_size, config.overlap)?;
//! let chroma = compute_chromagram(&spec.magnitudes, &spec.frequencies, &config)?;
//! assert_eq!(chroma.as_matrix().rows(), 12);
//! # Ok::<(), chordscan::AnalysisError>(())
//! ```

use serde::{Deserialize, Serialize};

use super::pitch::{midi_to_hz, pitch_class_name, NUM_PITCH_CLASSES};
use crate::config::{AnalysisConfig, MAX_MIDI_NOTE};
use crate::error::AnalysisError;
use crate::features::spectral::{closest_bin, validate_axis, SpectralMatrix};

/// Octaves scanned per pitch class (C-1 through B8)
const OCTAVES: u8 = 10;

/// Pitch-class energy over time: 12 rows (C..B) by frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ChromagramParts")]
pub struct Chromagram {
    values: SpectralMatrix,
}

#[derive(Deserialize)]
struct ChromagramParts {
    values: SpectralMatrix,
}

impl TryFrom<ChromagramParts> for Chromagram {
    type Error = AnalysisError;

    fn try_from(parts: ChromagramParts) -> Result<Self, Self::Error> {
        Self::from_matrix(parts.values)
    }
}

impl Chromagram {
    /// Wrap a 12-row matrix
    pub fn from_matrix(values: SpectralMatrix) -> Result<Self, AnalysisError> {
        if values.rows() != NUM_PITCH_CLASSES {
            return Err(AnalysisError::InvalidInput(format!(
                "Chromagram must have {} rows, got {}",
                NUM_PITCH_CLASSES,
                values.rows()
            )));
        }
        Ok(Self { values })
    }

    /// Build a chromagram from per-frame 12-element vectors
    pub fn from_frames(frames: &[[f32; NUM_PITCH_CLASSES]]) -> Self {
        let mut values = SpectralMatrix::zeros(NUM_PITCH_CLASSES, frames.len());
        for (frame_idx, frame) in frames.iter().enumerate() {
            for (pc, &v) in frame.iter().enumerate() {
                values.set(pc, frame_idx, v);
            }
        }
        Self { values }
    }

    /// Number of time frames
    pub fn frames(&self) -> usize {
        self.values.cols()
    }

    /// The 12-element profile of one frame
    pub fn column(&self, frame: usize) -> [f32; NUM_PITCH_CLASSES] {
        let mut out = [0.0f32; NUM_PITCH_CLASSES];
        for (pc, slot) in out.iter_mut().enumerate() {
            *slot = self.values.get(pc, frame);
        }
        out
    }

    /// Aggregate energy of one frame (sum over pitch classes)
    pub fn energy(&self, frame: usize) -> f32 {
        (0..NUM_PITCH_CLASSES)
            .map(|pc| self.values.get(pc, frame))
            .sum()
    }

    /// Energy of one pitch class over time
    pub fn row(&self, pitch_class: usize) -> &[f32] {
        self.values.row(pitch_class)
    }

    /// Underlying 12 x frames matrix
    pub fn as_matrix(&self) -> &SpectralMatrix {
        &self.values
    }
}

/// Precomputed octave-folding table for one frequency axis
#[derive(Debug, Clone)]
pub struct ChromagramBuilder {
    n_bins: usize,
    pitch_bins: Vec<Vec<usize>>,
}

impl ChromagramBuilder {
    /// Map every pitch-class occurrence in `[first_note, last_note]` to a bin
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the axis is empty or unsorted, the note range is
    ///   inverted or the reference pitch is not positive
    /// - `ComputationDegenerate` if some pitch class has no occurrence in range
    pub fn new(
        frequencies: &[f32],
        first_note: u8,
        last_note: u8,
        reference_pitch_hz: f32,
    ) -> Result<Self, AnalysisError> {
        validate_axis(frequencies)?;

        if first_note >= last_note {
            return Err(AnalysisError::InvalidInput(format!(
                "first_note ({}) must be below last_note ({})",
                first_note, last_note
            )));
        }

        if !(reference_pitch_hz.is_finite() && reference_pitch_hz > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Reference pitch must be positive, got {}",
                reference_pitch_hz
            )));
        }

        let mut pitch_bins = Vec::with_capacity(NUM_PITCH_CLASSES);
        for pc in 0..NUM_PITCH_CLASSES as u8 {
            let mut bins = Vec::new();
            for octave in 0..OCTAVES {
                let midi = pc + octave * 12;
                if midi > MAX_MIDI_NOTE || midi > last_note {
                    break;
                }
                if midi < first_note {
                    continue;
                }
                bins.push(closest_bin(frequencies, midi_to_hz(midi, reference_pitch_hz)));
            }

            if bins.is_empty() {
                return Err(AnalysisError::ComputationDegenerate(format!(
                    "Pitch class {} has no occurrence between MIDI {} and {}",
                    pitch_class_name(pc as usize),
                    first_note,
                    last_note
                )));
            }
            pitch_bins.push(bins);
        }

        log::debug!(
            "Chromagram builder: notes {}..={}, A4={:.1} Hz, {} bins",
            first_note,
            last_note,
            reference_pitch_hz,
            frequencies.len()
        );

        Ok(Self {
            n_bins: frequencies.len(),
            pitch_bins,
        })
    }

    /// Build from the chroma section of an [`AnalysisConfig`]
    pub fn from_config(frequencies: &[f32], config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        Self::new(
            frequencies,
            config.first_note,
            config.last_note,
            config.reference_pitch_hz,
        )
    }

    /// Bins averaged for a pitch class
    pub fn pitch_bins(&self, pitch_class: usize) -> &[usize] {
        &self.pitch_bins[pitch_class]
    }

    /// Fold `magnitudes` into a chromagram
    pub fn build(&self, magnitudes: &SpectralMatrix) -> Result<Chromagram, AnalysisError> {
        if magnitudes.rows() != self.n_bins {
            return Err(AnalysisError::InvalidInput(format!(
                "Spectrogram has {} bins, chromagram builder expects {}",
                magnitudes.rows(),
                self.n_bins
            )));
        }

        let mut values = SpectralMatrix::zeros(NUM_PITCH_CLASSES, magnitudes.cols());

        for (pc, bins) in self.pitch_bins.iter().enumerate() {
            let out = values.row_mut(pc);
            for &bin in bins {
                for (o, &m) in out.iter_mut().zip(magnitudes.row(bin)) {
                    *o += m;
                }
            }
            let count = bins.len() as f32;
            for o in out.iter_mut() {
                *o /= count;
            }
        }

        Ok(Chromagram { values })
    }
}

/// One-shot chromagram using the config's note range
pub fn compute_chromagram(
    magnitudes: &SpectralMatrix,
    frequencies: &[f32],
    config: &AnalysisConfig,
) -> Result<Chromagram, AnalysisError> {
    ChromagramBuilder::from_config(frequencies, config)?.build(magnitudes)
}
