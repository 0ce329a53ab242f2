//! Error types for the chord recognition engine

use thiserror::Error;

/// Errors that can occur during chord analysis
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Invalid input samples or malformed configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A pitch class or frequency band ended up with no contributing bins
    #[error("Degenerate computation: {0}")]
    ComputationDegenerate(String),

    /// Audio decoding error
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Audio capture device error
    #[error("Device error: {0}")]
    DeviceError(String),
}
