//! Short-time Fourier magnitude spectrogram
//!
//! Splits the signal into overlapping frames and computes a one-sided
//! magnitude spectrum per frame.
//!
//! # Algorithm
//!
//! 1. Frame the signal: `window_size` samples, stride `window_size - overlap`
//! 2. Remove the frame mean (constant detrend)
//! 3. Apply a periodic Tukey window (25% taper, flat in the middle)
//! 4. FFT and keep bins `0..=window_size/2`
//! 5. Magnitude scaled by `1 / sum(window)` ("spectrum" scaling, so a sinusoid
//!    of amplitude `A` centred on a bin peaks near `A / 2`)
//!
//! A trailing partial frame is dropped, never zero-padded, so block
//! boundaries in streaming use contribute no padding bias.
//!
//! # Example
//!
//! ```no_run
//! use chordscan::features::spectral::stft::compute_spectrogram;
//!
//! let samples = vec![0.0f32; 44100];
//! let spec = compute_spectrogram(&samples, 44100, 8192, 4096)?;
//! println!("{} bins x {} frames", spec.magnitudes.rows(), spec.magnitudes.cols());
//! # Ok::<(), chordscan::AnalysisError>(())
//! ```

use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::SpectralMatrix;
use crate::error::AnalysisError;

/// Fraction of the analysis window inside the cosine tapers
pub const TUKEY_ALPHA: f64 = 0.25;

/// Magnitude spectrogram with its axes
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    /// Bin centre frequencies in Hz (ascending)
    pub frequencies: Vec<f32>,

    /// Frame centre times in seconds (ascending)
    pub times: Vec<f32>,

    /// Magnitudes, `frequencies.len()` rows by `times.len()` columns
    pub magnitudes: SpectralMatrix,
}

/// Reusable STFT front end for a fixed sample rate and window
///
/// The FFT plan, the window and the frequency axis are computed once; each
/// call to [`StftEngine::compute`] only allocates its output and one frame
/// buffer.
pub struct StftEngine {
    sample_rate: u32,
    window_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    scale: f32,
    frequencies: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for StftEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StftEngine")
            .field("sample_rate", &self.sample_rate)
            .field("window_size", &self.window_size)
            .field("hop_size", &self.hop_size)
            .finish()
    }
}

impl StftEngine {
    /// Plan an STFT for the given sample rate, window size and overlap
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the sample rate is zero, the
    /// window has fewer than 2 samples, or the overlap is not smaller than
    /// the window.
    pub fn new(sample_rate: u32, window_size: usize, overlap: usize) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Sample rate must be > 0".to_string(),
            ));
        }

        if window_size < 2 {
            return Err(AnalysisError::InvalidInput(format!(
                "Window size must be >= 2, got {}",
                window_size
            )));
        }

        if overlap >= window_size {
            return Err(AnalysisError::InvalidInput(format!(
                "Overlap ({}) must be smaller than window size ({})",
                overlap, window_size
            )));
        }

        let window = tukey_window(window_size, TUKEY_ALPHA);
        let window_sum: f32 = window.iter().sum();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(window_size);

        Ok(Self {
            sample_rate,
            window_size,
            hop_size: window_size - overlap,
            window,
            scale: 1.0 / window_sum,
            frequencies: frequency_axis(sample_rate, window_size),
            fft,
        })
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Window size in samples
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Stride between frames in samples
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Bin centre frequencies in Hz
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Number of complete frames that fit in `n_samples`
    pub fn frame_count(&self, n_samples: usize) -> usize {
        if n_samples < self.window_size {
            0
        } else {
            (n_samples - self.window_size) / self.hop_size + 1
        }
    }

    /// Compute the magnitude spectrogram of `samples`
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `samples` is empty or shorter
    /// than one window.
    pub fn compute(&self, samples: &[f32]) -> Result<Spectrogram, AnalysisError> {
        if samples.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "Empty audio samples".to_string(),
            ));
        }

        if samples.len() < self.window_size {
            return Err(AnalysisError::InvalidInput(format!(
                "Window size ({}) exceeds sample count ({})",
                self.window_size,
                samples.len()
            )));
        }

        let n_frames = self.frame_count(samples.len());
        let n_bins = self.frequencies.len();

        log::debug!(
            "Computing spectrogram: {} samples, window={}, hop={}, {} frames x {} bins",
            samples.len(),
            self.window_size,
            self.hop_size,
            n_frames,
            n_bins
        );

        let mut magnitudes = SpectralMatrix::zeros(n_bins, n_frames);
        let mut times = Vec::with_capacity(n_frames);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.window_size];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];
        let half_window = self.window_size as f32 / 2.0;

        for frame_idx in 0..n_frames {
            let start = frame_idx * self.hop_size;
            let frame = &samples[start..start + self.window_size];

            let mean = frame.iter().sum::<f32>() / self.window_size as f32;
            for ((slot, &x), &w) in buffer.iter_mut().zip(frame).zip(&self.window) {
                *slot = Complex::new((x - mean) * w, 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (bin, value) in buffer.iter().take(n_bins).enumerate() {
                magnitudes.set(bin, frame_idx, value.norm() * self.scale);
            }

            times.push((start as f32 + half_window) / self.sample_rate as f32);
        }

        Ok(Spectrogram {
            frequencies: self.frequencies.clone(),
            times,
            magnitudes,
        })
    }
}

/// Compute a magnitude spectrogram in one call
///
/// Convenience wrapper planning a fresh [`StftEngine`]. Prefer reusing an
/// engine when analysing many blocks at the same sample rate.
pub fn compute_spectrogram(
    samples: &[f32],
    sample_rate: u32,
    window_size: usize,
    overlap: usize,
) -> Result<Spectrogram, AnalysisError> {
    StftEngine::new(sample_rate, window_size, overlap)?.compute(samples)
}

/// One-sided bin centre frequencies: `k * sample_rate / window_size`
pub fn frequency_axis(sample_rate: u32, window_size: usize) -> Vec<f32> {
    let resolution = sample_rate as f32 / window_size as f32;
    (0..=window_size / 2)
        .map(|k| k as f32 * resolution)
        .collect()
}

/// Periodic Tukey (tapered cosine) window
///
/// Built as the symmetric window of length `size + 1` with the last sample
/// dropped. `alpha` is the tapered fraction: 0 gives a rectangular window,
/// 1 a Hann window.
pub fn tukey_window(size: usize, alpha: f64) -> Vec<f32> {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha == 0.0 {
        return vec![1.0; size];
    }

    // Symmetric length is size + 1, so its span is size
    let span = size as f64;
    let width = (alpha * span / 2.0).floor() as usize;
    let flat_end = size - width;

    (0..size)
        .map(|n| {
            let x = 2.0 * n as f64 / (alpha * span);
            let w = if n <= width {
                0.5 * (1.0 + (PI * (x - 1.0)).cos())
            } else if n < flat_end {
                1.0
            } else {
                0.5 * (1.0 + (PI * (x - 2.0 / alpha + 1.0)).cos())
            };
            w as f32
        })
        .collect()
}
