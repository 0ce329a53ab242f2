//! Spectral analysis modules
//!
//! Time-frequency front end of the chord pipeline:
//! - Short-time Fourier magnitude spectrogram
//! - Harmonic content extraction (harmonic suppression)

pub mod harmonic;
pub mod stft;

pub use harmonic::{suppress_harmonics, HarmonicDecayModel, HarmonicSuppressor};
pub use stft::{compute_spectrogram, Spectrogram, StftEngine};

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Dense row-major matrix of non-negative magnitudes
///
/// Rows are frequency bins (or pitch classes, or chord templates), columns are
/// time frames. Every pipeline stage returns a freshly allocated matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixParts")]
pub struct SpectralMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

/// Serialized fields of [`SpectralMatrix`], checked before use
#[derive(Deserialize)]
struct MatrixParts {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl TryFrom<MatrixParts> for SpectralMatrix {
    type Error = AnalysisError;

    fn try_from(parts: MatrixParts) -> Result<Self, Self::Error> {
        if parts.rows.checked_mul(parts.cols) != Some(parts.data.len()) {
            return Err(AnalysisError::InvalidInput(format!(
                "Matrix {}x{} cannot hold {} values",
                parts.rows,
                parts.cols,
                parts.data.len()
            )));
        }
        Ok(Self {
            rows: parts.rows,
            cols: parts.cols,
            data: parts.data,
        })
    }
}

impl SpectralMatrix {
    /// Create a matrix filled with zeros
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build a matrix from equally sized rows
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, AnalysisError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);

        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(AnalysisError::InvalidInput(format!(
                    "Row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            data.extend(row);
        }

        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (time frames)
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Value at `(row, col)`
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        self.data[row * self.cols + col]
    }

    /// Overwrite the value at `(row, col)`
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        self.data[row * self.cols + col] = value;
    }

    /// One row as a slice
    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// One row as a mutable slice
    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Copy one column out
    pub fn column(&self, col: usize) -> Vec<f32> {
        (0..self.rows).map(|r| self.get(r, col)).collect()
    }

    /// Row-major backing storage
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Index of the axis value closest to `target`
///
/// `axis` must be ascending and non-empty. Ties resolve to the lower index.
pub fn closest_bin(axis: &[f32], target: f32) -> usize {
    debug_assert!(!axis.is_empty());
    let upper = axis.partition_point(|&f| f < target);
    if upper == 0 {
        return 0;
    }
    if upper >= axis.len() {
        return axis.len() - 1;
    }
    let lower = upper - 1;
    if target - axis[lower] <= axis[upper] - target {
        lower
    } else {
        upper
    }
}

/// Reject frequency axes that are empty or not ascending
pub(crate) fn validate_axis(frequencies: &[f32]) -> Result<(), AnalysisError> {
    if frequencies.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Frequency axis is empty".to_string(),
        ));
    }
    if frequencies
        .windows(2)
        .any(|w| w[0].partial_cmp(&w[1]) != Some(std::cmp::Ordering::Less))
    {
        return Err(AnalysisError::InvalidInput(
            "Frequency axis must be strictly ascending".to_string(),
        ));
    }
    Ok(())
}
