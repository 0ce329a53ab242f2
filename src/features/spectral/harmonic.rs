//! Harmonic content extraction
//!
//! Emphasizes fundamentals by requiring each candidate bin's harmonic series
//! to be present at the expected decayed level.
//!
//! # Algorithm
//!
//! For every bin `f` in `[fmin, fmax]` and every harmonic `n` in
//! `1..harmonic_count` with `n * f` below the top of the frequency axis:
//!
//! ```text
//! weighted[n] = |X(closest_bin(n * f))| * decay_ratio^(n - 1)
//! out(f)      = min_n weighted[n]
//! ```
//!
//! Taking the minimum means a spurious "harmonic" anywhere in the series pulls
//! the bin down, while a fully populated series survives. Bins outside
//! `[fmin, fmax]` are left at zero.

use super::{closest_bin, validate_axis, SpectralMatrix};
use crate::config::{AnalysisConfig, MAX_HARMONIC_COUNT};
use crate::error::AnalysisError;

/// Geometric harmonic weights `[1, r, r^2, ..., r^(H-1)]`
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicDecayModel {
    weights: Vec<f32>,
}

impl HarmonicDecayModel {
    /// Build the model for `harmonic_count` terms with ratio `decay_ratio`
    pub fn new(harmonic_count: usize, decay_ratio: f32) -> Result<Self, AnalysisError> {
        if !(2..=MAX_HARMONIC_COUNT).contains(&harmonic_count) {
            return Err(AnalysisError::InvalidInput(format!(
                "Harmonic count must be in 2..={}, got {}",
                MAX_HARMONIC_COUNT, harmonic_count
            )));
        }
        if !(decay_ratio > 0.0 && decay_ratio <= 1.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Decay ratio must be in (0, 1], got {}",
                decay_ratio
            )));
        }

        let mut weights = Vec::with_capacity(harmonic_count);
        let mut w = 1.0f32;
        for _ in 0..harmonic_count {
            weights.push(w);
            w *= decay_ratio;
        }

        Ok(Self { weights })
    }

    /// All weights, fundamental first
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Number of terms `H`
    pub fn harmonic_count(&self) -> usize {
        self.weights.len()
    }

    /// Weight applied to harmonic `n` (1 = the fundamental itself)
    pub fn weight(&self, n: usize) -> f32 {
        self.weights[n - 1]
    }
}

/// Precomputed harmonic suppressor for one frequency axis
///
/// Harmonic bin lookups are resolved at construction so [`apply`] is a
/// straight min-reduction over rows.
///
/// [`apply`]: HarmonicSuppressor::apply
#[derive(Debug, Clone)]
pub struct HarmonicSuppressor {
    n_bins: usize,
    model: HarmonicDecayModel,
    /// Per bin: `(harmonic bin, weight)` taps; empty for bins that stay zero
    taps: Vec<Vec<(usize, f32)>>,
}

impl HarmonicSuppressor {
    /// Resolve harmonic taps for `frequencies`
    pub fn new(
        frequencies: &[f32],
        fmin: f32,
        fmax: f32,
        model: HarmonicDecayModel,
    ) -> Result<Self, AnalysisError> {
        validate_axis(frequencies)?;

        if fmin >= fmax {
            return Err(AnalysisError::InvalidInput(format!(
                "fmin ({}) must be below fmax ({})",
                fmin, fmax
            )));
        }

        let f_limit = frequencies[frequencies.len() - 1];
        let mut taps = vec![Vec::new(); frequencies.len()];
        let mut candidates = 0usize;

        for (bin, &f) in frequencies.iter().enumerate() {
            if f < fmin {
                continue;
            }
            if f > fmax {
                break;
            }
            candidates += 1;

            for n in 1..model.harmonic_count() {
                let target = n as f32 * f;
                if target < f_limit {
                    taps[bin].push((closest_bin(frequencies, target), model.weight(n)));
                }
            }
        }

        log::debug!(
            "Harmonic suppressor: {} candidate bins in [{:.1}, {:.1}] Hz, {} harmonics",
            candidates,
            fmin,
            fmax,
            model.harmonic_count() - 1
        );

        Ok(Self {
            n_bins: frequencies.len(),
            model,
            taps,
        })
    }

    /// Build from the harmonic section of an [`AnalysisConfig`]
    pub fn from_config(frequencies: &[f32], config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let model = HarmonicDecayModel::new(config.harmonic_count, config.decay_ratio)?;
        Self::new(frequencies, config.fmin, config.fmax, model)
    }

    /// The decay model in use
    pub fn model(&self) -> &HarmonicDecayModel {
        &self.model
    }

    /// Suppress non-fundamental energy, returning a matrix of the same shape
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the matrix row count does not
    /// match the frequency axis this suppressor was built for.
    pub fn apply(&self, magnitudes: &SpectralMatrix) -> Result<SpectralMatrix, AnalysisError> {
        if magnitudes.rows() != self.n_bins {
            return Err(AnalysisError::InvalidInput(format!(
                "Spectrogram has {} bins, suppressor expects {}",
                magnitudes.rows(),
                self.n_bins
            )));
        }

        let mut filtered = SpectralMatrix::zeros(magnitudes.rows(), magnitudes.cols());

        for (bin, taps) in self.taps.iter().enumerate() {
            let Some((&(first_bin, first_weight), rest)) = taps.split_first() else {
                continue;
            };

            let out = filtered.row_mut(bin);
            for (o, &m) in out.iter_mut().zip(magnitudes.row(first_bin)) {
                *o = m * first_weight;
            }
            for &(harmonic_bin, weight) in rest {
                for (o, &m) in out.iter_mut().zip(magnitudes.row(harmonic_bin)) {
                    *o = o.min(m * weight);
                }
            }
        }

        Ok(filtered)
    }
}

/// One-shot harmonic suppression using the config's harmonic parameters
pub fn suppress_harmonics(
    magnitudes: &SpectralMatrix,
    frequencies: &[f32],
    config: &AnalysisConfig,
) -> Result<SpectralMatrix, AnalysisError> {
    HarmonicSuppressor::from_config(frequencies, config)?.apply(magnitudes)
}
