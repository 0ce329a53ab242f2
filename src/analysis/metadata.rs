//! Analysis metadata structures

use serde::{Deserialize, Serialize};

/// Analysis metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Audio duration in seconds
    pub duration_seconds: f32,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,

    /// STFT window size in samples
    pub window_size: usize,

    /// STFT hop size in samples
    pub hop_size: usize,

    /// Number of analysed frames
    pub frames: usize,

    /// Whether harmonic suppression fed the chromagram
    pub harmonic_suppression: bool,
}

impl AnalysisMetadata {
    /// Hop size expressed in seconds (0 when the sample rate is unknown)
    pub fn hop_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.hop_size as f32 / self.sample_rate as f32
        }
    }
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            duration_seconds: 0.0,
            sample_rate: 0,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            window_size: 0,
            hop_size: 0,
            frames: 0,
            harmonic_suppression: false,
        }
    }
}
