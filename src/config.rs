//! Configuration parameters for chord analysis

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::features::chord::templates::TemplateWeights;

/// Highest MIDI note reachable by the chroma octave scan (10 octaves from C-1)
pub const MAX_MIDI_NOTE: u8 = 119;

/// Largest accepted `harmonic_count`
pub const MAX_HARMONIC_COUNT: usize = 32;

/// Analysis configuration parameters
///
/// Every field has a default, so a partial JSON document deserializes into a
/// complete configuration. Call [`AnalysisConfig::validate`] before use; the
/// pipeline constructors do this for you.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // STFT parameters
    /// Analysis window size in samples (default: 8192)
    pub window_size: usize,

    /// Overlap between consecutive windows in samples (default: 4096)
    pub overlap: usize,

    // Harmonic content extraction
    /// Run harmonic suppression before folding into the chromagram (default: true)
    pub harmonic_suppression: bool,

    /// Lowest candidate fundamental in Hz (default: 60.0)
    pub fmin: f32,

    /// Highest candidate fundamental in Hz (default: 2000.0)
    pub fmax: f32,

    /// Number of terms in the harmonic decay model (default: 4)
    /// Harmonics `1..harmonic_count` are inspected for each candidate bin
    pub harmonic_count: usize,

    /// Expected amplitude ratio between consecutive harmonics (default: 0.8)
    pub decay_ratio: f32,

    // Chromagram
    /// Lowest MIDI note folded into the chromagram (default: 36, C2)
    pub first_note: u8,

    /// Highest MIDI note folded into the chromagram (default: 83, B5)
    pub last_note: u8,

    /// Frequency of A4 (MIDI 69) in Hz (default: 440.0)
    pub reference_pitch_hz: f32,

    // Chord templates
    /// Template weights for the 25-entry chord bank
    pub templates: TemplateWeights,

    // Real-time listener
    /// Minimum summed chroma energy for a live detection to be reported (default: 0.01)
    pub activity_threshold: f32,

    /// Capture block size in samples (default: 8192, one analysis window)
    pub block_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: 8192,
            overlap: 4096,
            harmonic_suppression: true,
            fmin: 60.0,
            fmax: 2000.0,
            harmonic_count: 4,
            decay_ratio: 0.8,
            first_note: 36,
            last_note: 83,
            reference_pitch_hz: 440.0,
            templates: TemplateWeights::default(),
            activity_threshold: 0.01,
            block_size: 8192,
        }
    }
}

impl AnalysisConfig {
    /// Distance in samples between the starts of consecutive windows
    pub fn hop_size(&self) -> usize {
        self.window_size.saturating_sub(self.overlap)
    }

    /// Check every parameter, reporting the first violation
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.window_size < 2 {
            return Err(AnalysisError::InvalidInput(format!(
                "Window size must be >= 2, got {}",
                self.window_size
            )));
        }

        if self.overlap >= self.window_size {
            return Err(AnalysisError::InvalidInput(format!(
                "Overlap ({}) must be smaller than window size ({})",
                self.overlap, self.window_size
            )));
        }

        if !self.fmin.is_finite() || !self.fmax.is_finite() || self.fmin < 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid frequency range: fmin={}, fmax={}",
                self.fmin, self.fmax
            )));
        }

        if self.fmin >= self.fmax {
            return Err(AnalysisError::InvalidInput(format!(
                "fmin ({}) must be below fmax ({})",
                self.fmin, self.fmax
            )));
        }

        if !(2..=MAX_HARMONIC_COUNT).contains(&self.harmonic_count) {
            return Err(AnalysisError::InvalidInput(format!(
                "Harmonic count must be in 2..={}, got {}",
                MAX_HARMONIC_COUNT, self.harmonic_count
            )));
        }

        if !(self.decay_ratio > 0.0 && self.decay_ratio <= 1.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Decay ratio must be in (0, 1], got {}",
                self.decay_ratio
            )));
        }

        if self.first_note >= self.last_note {
            return Err(AnalysisError::InvalidInput(format!(
                "first_note ({}) must be below last_note ({})",
                self.first_note, self.last_note
            )));
        }

        if self.last_note > MAX_MIDI_NOTE {
            return Err(AnalysisError::InvalidInput(format!(
                "last_note ({}) exceeds MIDI {}",
                self.last_note, MAX_MIDI_NOTE
            )));
        }

        // Every pitch class needs at least one occurrence in the note range
        if self.last_note - self.first_note < 11 {
            return Err(AnalysisError::InvalidInput(format!(
                "Note range {}..={} spans less than an octave",
                self.first_note, self.last_note
            )));
        }

        if !(self.reference_pitch_hz.is_finite() && self.reference_pitch_hz > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Reference pitch must be positive, got {}",
                self.reference_pitch_hz
            )));
        }

        if !(self.activity_threshold.is_finite() && self.activity_threshold >= 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Activity threshold must be >= 0, got {}",
                self.activity_threshold
            )));
        }

        if self.block_size < self.window_size {
            return Err(AnalysisError::InvalidInput(format!(
                "Block size ({}) must hold at least one window ({})",
                self.block_size, self.window_size
            )));
        }

        self.templates.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hop_size(), 4096);
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let config = AnalysisConfig {
            fmin: 500.0,
            fmax: 100.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidInput(_))));

        let config = AnalysisConfig {
            first_note: 60,
            last_note: 48,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_sub_octave_note_range() {
        let config = AnalysisConfig {
            first_note: 60,
            last_note: 70,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            first_note: 60,
            last_note: 71,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_window_parameters() {
        let config = AnalysisConfig {
            overlap: 8192,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            block_size: 1024,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            decay_ratio: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            harmonic_count: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_harmonic_count_is_capped() {
        let config = AnalysisConfig {
            harmonic_count: MAX_HARMONIC_COUNT,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "harmonic_count": 18446744073709551615 }"#).unwrap();
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "window_size": 4096, "overlap": 0 }"#).unwrap();
        assert_eq!(config.window_size, 4096);
        assert_eq!(config.overlap, 0);
        assert_eq!(config.fmax, 2000.0);
        assert_eq!(config.templates, TemplateWeights::default());
    }
}
