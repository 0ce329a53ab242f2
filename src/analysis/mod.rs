//! Analysis and result aggregation modules
//!
//! Runs the chord pipeline and packages its output:
//! - Pipeline wiring (spectrogram → harmonics → chroma → chords)
//! - Result types and chord segments
//! - Metadata
//! - Text reports

pub mod metadata;
pub mod pipeline;
pub mod report;
pub mod result;
